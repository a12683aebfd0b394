//! Scan progress reporting.

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, Instant};

/// Shared counters updated by every scan worker.
///
/// A fresh set is created for each scan; values only grow while it runs.
#[derive(Debug)]
pub struct ProgressCounters {
    files: AtomicU64,
    dirs: AtomicU64,
    bytes: AtomicU64,
    errors: AtomicU64,
    started: Instant,
}

impl ProgressCounters {
    /// Create zeroed counters, starting the clock now.
    pub fn new() -> Self {
        Self {
            files: AtomicU64::new(0),
            dirs: AtomicU64::new(0),
            bytes: AtomicU64::new(0),
            errors: AtomicU64::new(0),
            started: Instant::now(),
        }
    }

    pub fn record_file(&self, size: u64) {
        self.files.fetch_add(1, Ordering::Relaxed);
        self.bytes.fetch_add(size, Ordering::Relaxed);
    }

    pub fn record_dir(&self) {
        self.dirs.fetch_add(1, Ordering::Relaxed);
    }

    pub fn add_bytes(&self, size: u64) {
        self.bytes.fetch_add(size, Ordering::Relaxed);
    }

    pub fn record_error(&self) {
        self.errors.fetch_add(1, Ordering::Relaxed);
    }

    /// Read all counters into a snapshot.
    pub fn snapshot(&self) -> ScanProgress {
        ScanProgress {
            files_scanned: self.files.load(Ordering::Relaxed),
            dirs_scanned: self.dirs.load(Ordering::Relaxed),
            bytes_scanned: self.bytes.load(Ordering::Relaxed),
            errors_count: self.errors.load(Ordering::Relaxed),
            elapsed: self.started.elapsed(),
        }
    }
}

impl Default for ProgressCounters {
    fn default() -> Self {
        Self::new()
    }
}

/// Progress information sampled from [`ProgressCounters`].
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ScanProgress {
    /// Number of files scanned so far.
    pub files_scanned: u64,
    /// Number of directories scanned so far.
    pub dirs_scanned: u64,
    /// Total bytes scanned so far.
    pub bytes_scanned: u64,
    /// Number of unreadable or vanished items.
    pub errors_count: u64,
    /// Time elapsed since scan started.
    pub elapsed: Duration,
}

impl ScanProgress {
    /// Calculate scan rate in files per second.
    pub fn files_per_second(&self) -> f64 {
        if self.elapsed.as_secs_f64() > 0.0 {
            self.files_scanned as f64 / self.elapsed.as_secs_f64()
        } else {
            0.0
        }
    }

    /// Get total items scanned (files + dirs).
    pub fn total_items(&self) -> u64 {
        self.files_scanned + self.dirs_scanned
    }
}

/// Percentage of direct children finalized.
///
/// Stays at 99 or below while any child is pending, so 100 only shows once
/// the listing is complete.
pub fn completion_percent(finalized: usize, total: usize) -> u8 {
    if total == 0 || finalized >= total {
        return 100;
    }
    let pct = (finalized as u128 * 100 / total as u128) as u8;
    pct.min(99)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_counters_accumulate() {
        let counters = ProgressCounters::new();
        counters.record_file(100);
        counters.record_file(50);
        counters.record_dir();
        counters.record_error();

        let snap = counters.snapshot();
        assert_eq!(snap.files_scanned, 2);
        assert_eq!(snap.bytes_scanned, 150);
        assert_eq!(snap.dirs_scanned, 1);
        assert_eq!(snap.errors_count, 1);
        assert_eq!(snap.total_items(), 3);
    }

    #[test]
    fn test_completion_capped_while_pending() {
        assert_eq!(completion_percent(0, 4), 0);
        assert_eq!(completion_percent(2, 4), 50);
        assert_eq!(completion_percent(199, 200), 99);
        assert_eq!(completion_percent(999, 1000), 99);
        assert_eq!(completion_percent(4, 4), 100);
        assert_eq!(completion_percent(0, 0), 100);
    }
}
