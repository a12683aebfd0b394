//! Per-path safety checks and the removal primitive.

use std::fs;
use std::io;
use std::path::{Component, Path};

use burrow_core::{DeleteError, PathSets};

/// How a path is removed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DeleteMode {
    /// Remove from disk.
    #[default]
    Permanent,
    /// Move to the platform trash.
    Trash,
}

/// Check that `path` may be deleted right now.
///
/// The path must still exist, lie strictly inside `root`, and not be
/// protected.
pub fn validate_target(path: &Path, root: &Path, sets: &PathSets) -> Result<(), DeleteError> {
    if path == root {
        return Err(DeleteError::IsRoot {
            path: path.to_path_buf(),
        });
    }
    let escapes = path
        .components()
        .any(|c| matches!(c, Component::ParentDir | Component::CurDir));
    if escapes || !path.starts_with(root) {
        return Err(DeleteError::OutsideRoot {
            path: path.to_path_buf(),
            root: root.to_path_buf(),
        });
    }
    if sets.is_protected(path) {
        return Err(DeleteError::Protected {
            path: path.to_path_buf(),
        });
    }
    match fs::symlink_metadata(path) {
        Ok(_) => Ok(()),
        Err(err) if err.kind() == io::ErrorKind::NotFound => Err(DeleteError::Missing {
            path: path.to_path_buf(),
        }),
        Err(source) => Err(DeleteError::Io {
            path: path.to_path_buf(),
            source,
        }),
    }
}

/// Remove one path. Symlinks are removed, never their targets.
pub fn delete_path(path: &Path, mode: DeleteMode) -> Result<(), DeleteError> {
    match mode {
        DeleteMode::Trash => trash::delete(path).map_err(|e| DeleteError::Trash {
            path: path.to_path_buf(),
            message: e.to_string(),
        }),
        DeleteMode::Permanent => {
            let metadata = fs::symlink_metadata(path).map_err(|source| io_error(path, source))?;
            let result = if metadata.is_dir() {
                fs::remove_dir_all(path)
            } else {
                fs::remove_file(path)
            };
            result.map_err(|source| io_error(path, source))
        }
    }
}

fn io_error(path: &Path, source: io::Error) -> DeleteError {
    if source.kind() == io::ErrorKind::NotFound {
        DeleteError::Missing {
            path: path.to_path_buf(),
        }
    } else {
        DeleteError::Io {
            path: path.to_path_buf(),
            source,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_rejects_root_and_outside() {
        let temp = TempDir::new().unwrap();
        let sets = PathSets::empty();

        let err = validate_target(temp.path(), temp.path(), &sets).unwrap_err();
        assert!(matches!(err, DeleteError::IsRoot { .. }));

        let err = validate_target(Path::new("/elsewhere"), temp.path(), &sets).unwrap_err();
        assert!(matches!(err, DeleteError::OutsideRoot { .. }));

        let sneaky = temp.path().join("a/../../etc");
        let err = validate_target(&sneaky, temp.path(), &sets).unwrap_err();
        assert!(matches!(err, DeleteError::OutsideRoot { .. }));
    }

    #[test]
    fn test_rejects_protected_and_missing() {
        let temp = TempDir::new().unwrap();
        let keep = temp.path().join("keep");
        fs::create_dir(&keep).unwrap();
        let sets = PathSets::empty().with_protected([keep.clone()]);

        let err = validate_target(&keep, temp.path(), &sets).unwrap_err();
        assert!(matches!(err, DeleteError::Protected { .. }));

        let err = validate_target(&temp.path().join("gone"), temp.path(), &sets).unwrap_err();
        assert!(matches!(err, DeleteError::Missing { .. }));
    }

    #[test]
    fn test_delete_file_and_dir() {
        let temp = TempDir::new().unwrap();
        let file = temp.path().join("f.bin");
        let dir = temp.path().join("d");
        fs::write(&file, b"data").unwrap();
        fs::create_dir_all(dir.join("nested")).unwrap();
        fs::write(dir.join("nested/x"), b"x").unwrap();

        delete_path(&file, DeleteMode::Permanent).unwrap();
        delete_path(&dir, DeleteMode::Permanent).unwrap();
        assert!(!file.exists());
        assert!(!dir.exists());

        let err = delete_path(&file, DeleteMode::Permanent).unwrap_err();
        assert!(matches!(err, DeleteError::Missing { .. }));
    }

    #[cfg(unix)]
    #[test]
    fn test_symlink_removed_not_target() {
        let temp = TempDir::new().unwrap();
        let target = temp.path().join("target");
        fs::create_dir(&target).unwrap();
        fs::write(target.join("keep"), b"k").unwrap();
        let link = temp.path().join("link");
        std::os::unix::fs::symlink(&target, &link).unwrap();

        delete_path(&link, DeleteMode::Permanent).unwrap();
        assert!(target.join("keep").exists());
        assert!(fs::symlink_metadata(&link).is_err());
    }
}
