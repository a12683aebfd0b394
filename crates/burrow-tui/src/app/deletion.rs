//! Deletion batches and their effect on displayed sizes.

use std::path::Path;
use std::sync::Arc;
use std::sync::atomic::AtomicUsize;

use tokio::sync::mpsc::UnboundedSender;
use tokio_util::sync::CancellationToken;

use burrow_core::{Entry, EntrySize};
use burrow_ops::{DeletionEvent, DeletionHandle, DeletionOutcome, DeletionRequest, start_deletion};

use super::state::AppEvent;

/// Start a batch and forward its events to the app channel.
///
/// Returns the live removal counter and the interrupt token.
pub fn spawn_deletion(
    request: DeletionRequest,
    generation: u64,
    tx: UnboundedSender<AppEvent>,
) -> (Arc<AtomicUsize>, CancellationToken) {
    let DeletionHandle {
        mut rx,
        removed,
        cancel,
    } = start_deletion(request);

    tokio::spawn(async move {
        while let Some(event) = rx.recv().await {
            let message = match event {
                DeletionEvent::Progress(progress) => AppEvent::DeletionProgress {
                    generation,
                    progress,
                },
                DeletionEvent::Complete(outcome) => AppEvent::DeletionFinished {
                    generation,
                    outcome,
                },
            };
            if tx.send(message).is_err() {
                break;
            }
        }
    });

    (removed, cancel)
}

/// Format a deletion outcome as a status message.
pub fn deletion_message(outcome: &DeletionOutcome) -> (bool, String) {
    let mut msg = outcome.summary(crate::ui::format_size);
    if let Some((path, reason)) = outcome.failed.first() {
        msg.push_str(&format!(" (first failure: {}: {reason})", path.display()));
    }
    (outcome.is_success(), msg)
}

/// Subtract a removed path's size from every entry that contained it.
///
/// Returns true when any entry changed.
pub fn shrink_containing(entries: &mut [Entry], removed: &Path, size: u64) -> bool {
    let mut changed = false;
    for entry in entries.iter_mut() {
        if entry.path != removed && removed.starts_with(&entry.path) {
            entry.size = match entry.size {
                EntrySize::Known(bytes) => EntrySize::Known(bytes.saturating_sub(size)),
                EntrySize::Pending(bytes) => EntrySize::Pending(bytes.saturating_sub(size)),
                EntrySize::Unknown => EntrySize::Unknown,
            };
            changed = true;
        }
    }
    changed
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[test]
    fn test_shrink_containing() {
        let mut entries = vec![
            Entry::sized("/r/a", true, false, EntrySize::Known(1_000)),
            Entry::sized("/r/ab", true, false, EntrySize::Known(500)),
            Entry::sized("/r/b", false, false, EntrySize::Known(10)),
        ];
        assert!(shrink_containing(&mut entries, Path::new("/r/a/x/big.iso"), 800));
        assert_eq!(entries[0].size, EntrySize::Known(200));
        // Path prefixes are compared by component.
        assert_eq!(entries[1].size, EntrySize::Known(500));
        assert!(!shrink_containing(&mut entries, Path::new("/r/b"), 10));
        assert_eq!(entries[2].size, EntrySize::Known(10));
    }

    #[test]
    fn test_deletion_message() {
        let outcome = DeletionOutcome {
            removed: vec![PathBuf::from("/r/a")],
            failed: vec![(PathBuf::from("/r/b"), "Path not found".into())],
            skipped: vec![],
            bytes_freed: 2_000_000,
        };
        let (ok, msg) = deletion_message(&outcome);
        assert!(!ok);
        assert!(msg.starts_with("Deleted 1 items, freed 2 MB, 1 failed"));
        assert!(msg.contains("/r/b"));
    }
}
