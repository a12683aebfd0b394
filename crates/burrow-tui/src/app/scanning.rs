//! Background scanning jobs.
//!
//! Every job runs its blocking work on tokio's blocking pool and reports
//! back through the app event channel, tagged with its generation.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::mpsc::UnboundedSender;
use tokio::task::JoinError;
use tokio_util::sync::CancellationToken;

use burrow_core::ScanError;
use burrow_scan::{DirScanner, LargeFileScanner, ProgressCounters, ScanEvent, last_access};

use super::state::AppEvent;

/// Handles the event loop keeps for a running job.
#[derive(Debug, Clone)]
pub struct ScanJob {
    pub cancel: CancellationToken,
    pub counters: Arc<ProgressCounters>,
}

impl ScanJob {
    fn new() -> Self {
        Self {
            cancel: CancellationToken::new(),
            counters: Arc::new(ProgressCounters::new()),
        }
    }
}

fn join_error(err: JoinError) -> ScanError {
    ScanError::Other {
        message: err.to_string(),
    }
}

fn forward(tx: &UnboundedSender<AppEvent>, generation: u64, event: ScanEvent) {
    let message = match event {
        ScanEvent::Listed { entries, cells } => AppEvent::Listed {
            generation,
            entries,
            cells,
        },
        ScanEvent::Sized { path, size } => AppEvent::Sized {
            generation,
            path,
            size,
        },
    };
    let _ = tx.send(message);
}

/// Size the direct children of `root`.
pub fn start_listing_scan(
    scanner: Arc<DirScanner>,
    root: PathBuf,
    generation: u64,
    tx: UnboundedSender<AppEvent>,
) -> ScanJob {
    let job = ScanJob::new();
    let cancel = job.cancel.clone();
    let counters = Arc::clone(&job.counters);

    tokio::spawn(async move {
        let events = tx.clone();
        let result = tokio::task::spawn_blocking(move || {
            scanner.scan(&root, &counters, &cancel, &|event| {
                forward(&events, generation, event)
            })
        })
        .await
        .unwrap_or_else(|e| Err(join_error(e)));

        let _ = tx.send(AppEvent::ScanFinished { generation, result });
    });

    job
}

/// Size the overview roots that had no fresh cache record.
pub fn start_overview_scan(
    scanner: Arc<DirScanner>,
    roots: Vec<PathBuf>,
    generation: u64,
    tx: UnboundedSender<AppEvent>,
) -> ScanJob {
    let job = ScanJob::new();
    let cancel = job.cancel.clone();
    let counters = Arc::clone(&job.counters);

    tokio::spawn(async move {
        let events = tx.clone();
        let result = tokio::task::spawn_blocking(move || {
            scanner.size_paths(&roots, &counters, &cancel, &|event| {
                forward(&events, generation, event)
            })
        })
        .await
        .unwrap_or_else(|e| Err(join_error(e)));

        let _ = tx.send(AppEvent::OverviewFinished { generation, result });
    });

    job
}

/// Find the largest files under `root`.
pub fn start_spotlight(
    scanner: Arc<LargeFileScanner>,
    root: PathBuf,
    generation: u64,
    tx: UnboundedSender<AppEvent>,
) -> ScanJob {
    let job = ScanJob::new();
    let cancel = job.cancel.clone();
    let counters = Arc::clone(&job.counters);

    tokio::spawn(async move {
        let result = tokio::task::spawn_blocking(move || scanner.scan(&root, &counters, &cancel))
            .await
            .unwrap_or_else(|e| Err(join_error(e)));

        let _ = tx.send(AppEvent::SpotlightFinished { generation, result });
    });

    job
}

/// Resolve the last access time of one path.
pub fn start_file_info(path: PathBuf, timeout: Duration, tx: UnboundedSender<AppEvent>) {
    tokio::spawn(async move {
        let lookup = path.clone();
        let last_access = tokio::task::spawn_blocking(move || last_access(&lookup, timeout))
            .await
            .ok()
            .flatten();
        let _ = tx.send(AppEvent::FileInfo { path, last_access });
    });
}
