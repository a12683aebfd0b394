//! Opening paths in external applications.

use std::path::Path;

/// Open a path with the system default application.
pub fn open_path(path: &Path) -> Result<(), String> {
    open::that_detached(path).map_err(|e| format!("Failed to open {}: {e}", path.display()))
}

/// Show a path in the platform file manager.
///
/// Fire-and-forget: failures are logged and otherwise ignored.
pub fn reveal_path(path: &Path) {
    #[cfg(target_os = "macos")]
    {
        let path = path.to_path_buf();
        std::thread::spawn(move || {
            if let Err(err) = std::process::Command::new("open")
                .arg("-R")
                .arg(&path)
                .status()
            {
                tracing::debug!(path = %path.display(), error = %err, "reveal failed");
            }
        });
    }

    #[cfg(not(target_os = "macos"))]
    {
        let target = reveal_target(path);
        if let Err(err) = open::that_detached(target) {
            tracing::debug!(path = %target.display(), error = %err, "reveal failed");
        }
    }
}

/// Directory to open when the file manager cannot select a single item.
#[cfg_attr(target_os = "macos", allow(dead_code))]
fn reveal_target(path: &Path) -> &Path {
    if path.is_dir() {
        path
    } else {
        path.parent().unwrap_or(path)
    }
}
