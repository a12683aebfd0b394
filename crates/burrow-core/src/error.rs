//! Error types for scanning, probing and deletion.

use std::path::PathBuf;
use std::time::Duration;

use thiserror::Error;

/// Errors that can occur during scanning.
///
/// Only errors on the scan root are returned to callers; errors on
/// individual children are counted and charged as zero bytes.
#[derive(Debug, Error)]
pub enum ScanError {
    /// Permission denied for a path.
    #[error("Permission denied: {path}")]
    PermissionDenied { path: PathBuf },

    /// Path not found.
    #[error("Path not found: {path}")]
    NotFound { path: PathBuf },

    /// Generic I/O error.
    #[error("I/O error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The scan was cancelled before it finished.
    #[error("Scan cancelled")]
    Cancelled,

    /// Invalid configuration.
    #[error("Invalid configuration: {message}")]
    InvalidConfig { message: String },

    /// Root path is not a directory.
    #[error("Root path is not a directory: {path}")]
    NotADirectory { path: PathBuf },

    /// Other error.
    #[error("{message}")]
    Other { message: String },
}

impl ScanError {
    /// Create an I/O error with path context.
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        let path = path.into();
        match source.kind() {
            std::io::ErrorKind::PermissionDenied => Self::PermissionDenied { path },
            std::io::ErrorKind::NotFound => Self::NotFound { path },
            _ => Self::Io { path, source },
        }
    }

    /// Whether this error only affects a single item and should be skipped.
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            Self::PermissionDenied { .. } | Self::NotFound { .. } | Self::Io { .. }
        )
    }
}

/// Errors from external helper calls (size probe, metadata lookup).
#[derive(Debug, Error)]
pub enum ProbeError {
    /// The helper did not finish within its timeout.
    #[error("{helper} timed out after {timeout:?} on {path}")]
    TimedOut {
        helper: &'static str,
        path: PathBuf,
        timeout: Duration,
    },

    /// The helper process could not be started.
    #[error("failed to start {helper}: {source}")]
    Spawn {
        helper: &'static str,
        #[source]
        source: std::io::Error,
    },

    /// The helper exited unsuccessfully or printed something unparseable.
    #[error("{helper} failed on {path}: {message}")]
    Failed {
        helper: &'static str,
        path: PathBuf,
        message: String,
    },

    /// The helper is not available on this platform.
    #[error("{helper} is not supported on this platform")]
    Unsupported { helper: &'static str },
}

/// Reasons a single deletion target was not removed.
#[derive(Debug, Error)]
pub enum DeleteError {
    /// The path no longer exists.
    #[error("{path} no longer exists")]
    Missing { path: PathBuf },

    /// The path is not inside the root the selection was made under.
    #[error("{path} is outside {root}")]
    OutsideRoot { path: PathBuf, root: PathBuf },

    /// The path is the root itself.
    #[error("refusing to delete the scan root {path}")]
    IsRoot { path: PathBuf },

    /// The path is a protected system or home location.
    #[error("{path} is protected")]
    Protected { path: PathBuf },

    /// The filesystem refused the removal.
    #[error("failed to remove {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Moving to the trash failed.
    #[error("failed to move {path} to trash: {message}")]
    Trash { path: PathBuf, message: String },
}

impl DeleteError {
    /// The path this error refers to.
    pub fn path(&self) -> &std::path::Path {
        match self {
            Self::Missing { path }
            | Self::OutsideRoot { path, .. }
            | Self::IsRoot { path }
            | Self::Protected { path }
            | Self::Io { path, .. }
            | Self::Trash { path, .. } => path,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scan_error_io() {
        let err = ScanError::io(
            "/test/path",
            std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied"),
        );
        assert!(matches!(err, ScanError::PermissionDenied { .. }));
        assert!(err.is_transient());
    }

    #[test]
    fn test_scan_error_not_found() {
        let err = ScanError::io(
            "/gone",
            std::io::Error::new(std::io::ErrorKind::NotFound, "gone"),
        );
        assert!(matches!(err, ScanError::NotFound { .. }));
        assert!(!ScanError::Cancelled.is_transient());
    }

    #[test]
    fn test_delete_error_path() {
        let err = DeleteError::Missing {
            path: PathBuf::from("/tmp/a"),
        };
        assert_eq!(err.path(), std::path::Path::new("/tmp/a"));
        assert!(err.to_string().contains("no longer exists"));
    }
}
