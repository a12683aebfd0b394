//! Progress and outcome types for deletion batches.

use std::path::PathBuf;

/// Progress of a running deletion batch.
#[derive(Debug, Clone, Default)]
pub struct DeletionProgress {
    /// Total number of items in the batch.
    pub total: usize,
    /// Number of items removed so far.
    pub removed: usize,
    /// Number of items that failed so far.
    pub failed: usize,
    /// Bytes freed so far.
    pub bytes_freed: u64,
    /// Item that finished most recently.
    pub current: Option<PathBuf>,
}

impl DeletionProgress {
    pub fn new(total: usize) -> Self {
        Self {
            total,
            ..Self::default()
        }
    }

    /// Items finished, removed or failed.
    pub fn processed(&self) -> usize {
        self.removed + self.failed
    }

    /// Get the progress as a percentage (0 to 100).
    pub fn percentage(&self) -> u16 {
        if self.total == 0 {
            return 100;
        }
        ((self.processed() * 100) / self.total).min(100) as u16
    }
}

/// Final result of a deletion batch.
#[derive(Debug, Clone, Default)]
pub struct DeletionOutcome {
    /// Paths that were removed.
    pub removed: Vec<PathBuf>,
    /// Paths that were not removed, with the reason.
    pub failed: Vec<(PathBuf, String)>,
    /// Paths never attempted because the batch was interrupted.
    pub skipped: Vec<PathBuf>,
    /// Sum of listed sizes of removed paths.
    pub bytes_freed: u64,
}

impl DeletionOutcome {
    /// Check if every item was removed.
    pub fn is_success(&self) -> bool {
        self.failed.is_empty() && self.skipped.is_empty()
    }

    /// Whether the batch was interrupted before finishing.
    pub fn was_interrupted(&self) -> bool {
        !self.skipped.is_empty()
    }

    /// Get a human-readable summary using `format_size` for byte counts.
    pub fn summary(&self, format_size: impl Fn(u64) -> String) -> String {
        let mut msg = format!(
            "Deleted {} items, freed {}",
            self.removed.len(),
            format_size(self.bytes_freed)
        );
        if !self.failed.is_empty() {
            msg.push_str(&format!(", {} failed", self.failed.len()));
        }
        if !self.skipped.is_empty() {
            msg.push_str(&format!(", {} skipped (interrupted)", self.skipped.len()));
        }
        msg
    }
}

/// Message sent through the deletion channel.
#[derive(Debug, Clone)]
pub enum DeletionEvent {
    /// One more item finished.
    Progress(DeletionProgress),
    /// The batch finished. Always the last message.
    Complete(DeletionOutcome),
}
