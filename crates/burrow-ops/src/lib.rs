//! Deletion engine for burrow.
//!
//! Selected paths are re-validated right before removal, removed with a
//! small bounded concurrency, and reported through a channel of progress
//! updates ending in a single [`DeletionOutcome`]. A failure on one path
//! never stops the rest of the batch, and nothing is rolled back.

mod engine;
mod progress;
mod validate;

pub use engine::{DeletionHandle, DeletionItem, DeletionRequest, start_deletion};
pub use progress::{DeletionEvent, DeletionOutcome, DeletionProgress};
pub use validate::{DeleteMode, delete_path, validate_target};

/// Default channel buffer size for deletion progress updates.
pub const DELETION_CHANNEL_SIZE: usize = 100;

/// Default number of deletions running at once.
pub const DEFAULT_CONCURRENCY: usize = 4;
