//! External helpers: subtree size probes and last-access lookup.
//!
//! Every helper call runs under its own timeout. A helper that overruns is
//! killed and reported as [`ProbeError::TimedOut`]; callers degrade to an
//! unknown size or a filesystem timestamp.

use std::io::Read;
use std::path::Path;
use std::process::{Command, Stdio};
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant, SystemTime};

use chrono::{DateTime, Utc};
use jwalk::{Parallelism, WalkDir};
use tracing::warn;

use burrow_core::ProbeError;

const POLL_INTERVAL: Duration = Duration::from_millis(20);

/// Computes the full size of a subtree in one call.
pub trait SizeProbe: Send + Sync {
    /// Total bytes under `path`, or an error if the probe failed or overran.
    fn probe(&self, path: &Path, timeout: Duration) -> Result<u64, ProbeError>;
}

/// Probe backed by `du -sk`.
#[derive(Debug, Default, Clone, Copy)]
pub struct DuProbe;

impl SizeProbe for DuProbe {
    fn probe(&self, path: &Path, timeout: Duration) -> Result<u64, ProbeError> {
        let mut cmd = Command::new("du");
        cmd.arg("-sk").arg(path);
        // du exits non-zero when some nested entry is unreadable but still
        // prints a total for the rest.
        let output = run_helper("du", cmd, path, timeout)?;
        parse_du_output(&output).ok_or_else(|| ProbeError::Failed {
            helper: "du",
            path: path.to_path_buf(),
            message: format!("unexpected output: {}", output.trim()),
        })
    }
}

/// `du -sk` prints "<kilobytes>\t<path>".
fn parse_du_output(output: &str) -> Option<u64> {
    let kb: u64 = output.split_whitespace().next()?.parse().ok()?;
    Some(kb.saturating_mul(1024))
}

/// In-process probe summing logical file sizes with a serial walk.
#[derive(Debug, Default, Clone, Copy)]
pub struct WalkProbe;

impl SizeProbe for WalkProbe {
    fn probe(&self, path: &Path, timeout: Duration) -> Result<u64, ProbeError> {
        let deadline = Instant::now() + timeout;
        let walker = WalkDir::new(path)
            .parallelism(Parallelism::Serial)
            .skip_hidden(false)
            .follow_links(false);

        let mut total = 0u64;
        for entry in walker.into_iter().flatten() {
            if Instant::now() > deadline {
                return Err(ProbeError::TimedOut {
                    helper: "walk",
                    path: path.to_path_buf(),
                    timeout,
                });
            }
            if entry.file_type().is_dir() {
                continue;
            }
            if let Ok(metadata) = entry.metadata() {
                total += metadata.len();
            }
        }
        Ok(total)
    }
}

/// The probe used when none is injected.
pub fn default_probe() -> Arc<dyn SizeProbe> {
    if cfg!(unix) {
        Arc::new(DuProbe)
    } else {
        Arc::new(WalkProbe)
    }
}

/// Run a helper process, killing it if it does not exit within `timeout`.
///
/// Returns its standard output. The exit status is not checked.
fn run_helper(
    helper: &'static str,
    mut cmd: Command,
    path: &Path,
    timeout: Duration,
) -> Result<String, ProbeError> {
    let mut child = cmd
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::null())
        .spawn()
        .map_err(|source| ProbeError::Spawn { helper, source })?;

    let deadline = Instant::now() + timeout;
    loop {
        match child.try_wait() {
            Ok(Some(_status)) => break,
            Ok(None) if Instant::now() >= deadline => {
                let _ = child.kill();
                let _ = child.wait();
                warn!(helper, path = %path.display(), ?timeout, "helper timed out");
                return Err(ProbeError::TimedOut {
                    helper,
                    path: path.to_path_buf(),
                    timeout,
                });
            }
            Ok(None) => thread::sleep(POLL_INTERVAL),
            Err(err) => {
                return Err(ProbeError::Failed {
                    helper,
                    path: path.to_path_buf(),
                    message: err.to_string(),
                });
            }
        }
    }

    let mut output = String::new();
    if let Some(mut stdout) = child.stdout.take() {
        stdout
            .read_to_string(&mut output)
            .map_err(|err| ProbeError::Failed {
                helper,
                path: path.to_path_buf(),
                message: err.to_string(),
            })?;
    }
    Ok(output)
}

/// Parse an `mdls -raw` date such as `2024-01-15 10:30:00 +0000`.
///
/// Returns `None` for `(null)` and anything else unparseable.
pub fn parse_mdls_date(raw: &str) -> Option<SystemTime> {
    let raw = raw.trim();
    if raw.is_empty() || raw == "(null)" {
        return None;
    }
    DateTime::parse_from_str(raw, "%Y-%m-%d %H:%M:%S %z")
        .ok()
        .map(|dt| SystemTime::from(dt.with_timezone(&Utc)))
}

#[cfg(target_os = "macos")]
fn last_used_from_spotlight(path: &Path, timeout: Duration) -> Option<SystemTime> {
    let mut cmd = Command::new("mdls");
    cmd.args(["-raw", "-name", "kMDItemLastUsedDate"]).arg(path);
    match run_helper("mdls", cmd, path, timeout) {
        Ok(output) => parse_mdls_date(&output),
        Err(err) => {
            tracing::debug!(error = %err, "mdls lookup failed");
            None
        }
    }
}

#[cfg(not(target_os = "macos"))]
fn last_used_from_spotlight(_path: &Path, _timeout: Duration) -> Option<SystemTime> {
    None
}

/// Last time `path` was used.
///
/// Asks the metadata index on macOS, then falls back to the filesystem
/// access time and finally the modification time.
pub fn last_access(path: &Path, timeout: Duration) -> Option<SystemTime> {
    if let Some(time) = last_used_from_spotlight(path, timeout) {
        return Some(time);
    }
    let metadata = std::fs::symlink_metadata(path).ok()?;
    metadata.accessed().or_else(|_| metadata.modified()).ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_parse_du_output() {
        assert_eq!(parse_du_output("12\t/tmp/x\n"), Some(12 * 1024));
        assert_eq!(parse_du_output("du: cannot read"), None);
        assert_eq!(parse_du_output(""), None);
    }

    #[test]
    fn test_parse_mdls_date() {
        let time = parse_mdls_date("2024-01-15 10:30:00 +0000\n").unwrap();
        let secs = time
            .duration_since(SystemTime::UNIX_EPOCH)
            .unwrap()
            .as_secs();
        assert_eq!(secs, 1_705_314_600);
        assert!(parse_mdls_date("(null)").is_none());
        assert!(parse_mdls_date("yesterday").is_none());
    }

    #[test]
    fn test_walk_probe_sums_files() {
        let temp = TempDir::new().unwrap();
        fs::create_dir_all(temp.path().join("a/b")).unwrap();
        fs::write(temp.path().join("a/one.bin"), vec![0u8; 300]).unwrap();
        fs::write(temp.path().join("a/b/two.bin"), vec![0u8; 200]).unwrap();

        let size = WalkProbe
            .probe(temp.path(), Duration::from_secs(10))
            .unwrap();
        assert_eq!(size, 500);
    }

    #[cfg(unix)]
    #[test]
    fn test_du_probe_reports_nonzero() {
        let temp = TempDir::new().unwrap();
        fs::write(temp.path().join("blob"), vec![1u8; 64 * 1024]).unwrap();

        let size = DuProbe.probe(temp.path(), Duration::from_secs(10)).unwrap();
        assert!(size > 0);
    }

    #[test]
    fn test_last_access_falls_back_to_filesystem() {
        let temp = TempDir::new().unwrap();
        let file = temp.path().join("f");
        fs::write(&file, b"x").unwrap();
        assert!(last_access(&file, Duration::from_secs(2)).is_some());
        assert!(last_access(&temp.path().join("missing"), Duration::from_secs(2)).is_none());
    }
}
