//! Bounded concurrent deletion.

use std::path::PathBuf;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use tokio::sync::{Semaphore, mpsc};
use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use burrow_core::{DeleteError, PathSets};

use crate::progress::{DeletionEvent, DeletionOutcome, DeletionProgress};
use crate::validate::{DeleteMode, delete_path, validate_target};
use crate::{DEFAULT_CONCURRENCY, DELETION_CHANNEL_SIZE};

/// One path to delete, with the size shown for it in the listing.
#[derive(Debug, Clone)]
pub struct DeletionItem {
    pub path: PathBuf,
    pub size: u64,
}

impl DeletionItem {
    pub fn new(path: impl Into<PathBuf>, size: u64) -> Self {
        Self {
            path: path.into(),
            size,
        }
    }
}

/// A confirmed deletion batch.
#[derive(Debug, Clone)]
pub struct DeletionRequest {
    pub items: Vec<DeletionItem>,
    /// Every item must lie strictly inside this directory.
    pub root: PathBuf,
    pub mode: DeleteMode,
    /// Maximum deletions in flight.
    pub concurrency: usize,
    pub sets: Arc<PathSets>,
}

impl DeletionRequest {
    pub fn new(items: Vec<DeletionItem>, root: impl Into<PathBuf>, sets: Arc<PathSets>) -> Self {
        Self {
            items,
            root: root.into(),
            mode: DeleteMode::default(),
            concurrency: DEFAULT_CONCURRENCY,
            sets,
        }
    }

    pub fn with_mode(mut self, mode: DeleteMode) -> Self {
        self.mode = mode;
        self
    }

    pub fn with_concurrency(mut self, concurrency: usize) -> Self {
        self.concurrency = concurrency;
        self
    }
}

/// Handle to a running deletion batch.
#[derive(Debug)]
pub struct DeletionHandle {
    /// Progress updates, then exactly one `Complete`.
    pub rx: mpsc::Receiver<DeletionEvent>,
    /// Live count of successful removals.
    pub removed: Arc<AtomicUsize>,
    /// Stops issuing further deletions when cancelled.
    pub cancel: CancellationToken,
}

impl DeletionHandle {
    pub fn removed_count(&self) -> usize {
        self.removed.load(Ordering::Relaxed)
    }

    /// Interrupt the batch. Deletions already running still finish.
    pub fn cancel(&self) {
        self.cancel.cancel();
    }
}

/// Start a deletion batch in the background.
///
/// Must be called from within a tokio runtime.
pub fn start_deletion(request: DeletionRequest) -> DeletionHandle {
    let (tx, rx) = mpsc::channel(DELETION_CHANNEL_SIZE);
    let removed = Arc::new(AtomicUsize::new(0));
    let cancel = CancellationToken::new();

    tokio::spawn(run_deletion(
        request,
        tx,
        Arc::clone(&removed),
        cancel.clone(),
    ));

    DeletionHandle {
        rx,
        removed,
        cancel,
    }
}

/// Accumulates results as tasks finish.
struct Tally {
    progress: DeletionProgress,
    outcome: DeletionOutcome,
    removed: Arc<AtomicUsize>,
}

impl Tally {
    fn record(&mut self, item: DeletionItem, result: Result<(), DeleteError>) {
        match result {
            Ok(()) => {
                self.removed.fetch_add(1, Ordering::Relaxed);
                self.progress.removed += 1;
                self.progress.bytes_freed += item.size;
                self.outcome.bytes_freed += item.size;
                self.outcome.removed.push(item.path.clone());
            }
            Err(err) => {
                warn!(path = %item.path.display(), error = %err, "deletion failed");
                self.progress.failed += 1;
                self.outcome.failed.push((item.path.clone(), err.to_string()));
            }
        }
        self.progress.current = Some(item.path);
    }
}

async fn run_deletion(
    request: DeletionRequest,
    tx: mpsc::Sender<DeletionEvent>,
    removed: Arc<AtomicUsize>,
    cancel: CancellationToken,
) {
    let DeletionRequest {
        items,
        root,
        mode,
        concurrency,
        sets,
    } = request;
    debug!(items = items.len(), root = %root.display(), ?mode, "deletion started");

    let mut tally = Tally {
        progress: DeletionProgress::new(items.len()),
        outcome: DeletionOutcome::default(),
        removed,
    };
    let root = Arc::new(root);
    let semaphore = Arc::new(Semaphore::new(concurrency.max(1)));
    let mut tasks = JoinSet::new();
    let mut queue = items.into_iter();

    while let Some(item) = queue.next() {
        let permit = tokio::select! {
            biased;
            _ = cancel.cancelled() => None,
            permit = Arc::clone(&semaphore).acquire_owned() => permit.ok(),
        };
        let Some(permit) = permit else {
            tally.outcome.skipped.push(item.path);
            tally.outcome.skipped.extend(queue.by_ref().map(|i| i.path));
            break;
        };

        let root = Arc::clone(&root);
        let sets = Arc::clone(&sets);
        tasks.spawn(async move {
            let _permit = permit;
            let path = item.path.clone();
            let result = tokio::task::spawn_blocking(move || {
                validate_target(&path, &root, &sets)?;
                delete_path(&path, mode)
            })
            .await
            .unwrap_or_else(|join_err| {
                Err(DeleteError::Io {
                    path: item.path.clone(),
                    source: std::io::Error::other(join_err.to_string()),
                })
            });
            (item, result)
        });

        while let Some(joined) = tasks.try_join_next() {
            if let Ok((item, result)) = joined {
                tally.record(item, result);
                let _ = tx
                    .send(DeletionEvent::Progress(tally.progress.clone()))
                    .await;
            }
        }
    }

    while let Some(joined) = tasks.join_next().await {
        if let Ok((item, result)) = joined {
            tally.record(item, result);
            let _ = tx
                .send(DeletionEvent::Progress(tally.progress.clone()))
                .await;
        }
    }

    let outcome = tally.outcome;
    info!(
        removed = outcome.removed.len(),
        failed = outcome.failed.len(),
        skipped = outcome.skipped.len(),
        bytes_freed = outcome.bytes_freed,
        "deletion finished"
    );
    let _ = tx.send(DeletionEvent::Complete(outcome)).await;
}
