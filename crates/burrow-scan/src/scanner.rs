//! Two-pool directory scanner.
//!
//! The scanner lists the direct children of a root, then sizes each child's
//! subtree. A few entry threads bound how many children are in flight; each
//! child's subtree is walked on the larger traversal rayon pool with a
//! recursive `rayon::scope`. Partial sums are published through one atomic
//! cell per child so a UI can show sizes growing while the walk runs.

use std::fs::{self, ReadDir};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::thread;
use std::time::{Duration, Instant};

use rayon::{Scope, ThreadPool, ThreadPoolBuilder};
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use burrow_core::{Entry, EntrySize, PathSets, ScanConfig, ScanError, sort_entries, total_size};

use crate::probe::{SizeProbe, default_probe};
use crate::progress::ProgressCounters;

/// Events emitted while a scan runs.
#[derive(Debug, Clone)]
pub enum ScanEvent {
    /// Direct children discovered, all pending. `cells[i]` holds the live
    /// partial size of `entries[i]`.
    Listed {
        entries: Vec<Entry>,
        cells: Vec<Arc<AtomicU64>>,
    },
    /// One child finished sizing.
    Sized { path: PathBuf, size: EntrySize },
}

/// Result of a completed scan.
#[derive(Debug, Clone)]
pub struct ScanSummary {
    /// The scanned directory.
    pub root: PathBuf,
    /// Direct children with final sizes, largest first.
    pub entries: Vec<Entry>,
    /// Sum of all child sizes.
    pub total: u64,
    /// Items that could not be read.
    pub errors: u64,
    /// Wall time of the scan.
    pub elapsed: Duration,
}

/// A direct child found while listing the root.
struct Child {
    path: PathBuf,
    is_dir: bool,
    folded: bool,
}

/// Bounded concurrent directory scanner.
pub struct DirScanner {
    config: ScanConfig,
    sets: Arc<PathSets>,
    probe: Arc<dyn SizeProbe>,
}

impl DirScanner {
    /// Create a scanner using the platform's default size probe.
    pub fn new(config: ScanConfig, sets: Arc<PathSets>) -> Self {
        Self {
            config,
            sets,
            probe: default_probe(),
        }
    }

    /// Replace the probe used for fold directories.
    pub fn with_probe(mut self, probe: Arc<dyn SizeProbe>) -> Self {
        self.probe = probe;
        self
    }

    pub fn config(&self) -> &ScanConfig {
        &self.config
    }

    /// Size every direct child of `root`.
    ///
    /// Emits [`ScanEvent::Listed`] once, then [`ScanEvent::Sized`] per child
    /// as each finishes. Errors below the root are counted and charged as
    /// zero bytes; only failures on the root itself are returned.
    pub fn scan(
        &self,
        root: &Path,
        counters: &ProgressCounters,
        cancel: &CancellationToken,
        emit: &(dyn Fn(ScanEvent) + Sync),
    ) -> Result<ScanSummary, ScanError> {
        let start = Instant::now();
        let metadata = fs::metadata(root).map_err(|e| ScanError::io(root, e))?;
        if !metadata.is_dir() {
            return Err(ScanError::NotADirectory {
                path: root.to_path_buf(),
            });
        }
        let read = fs::read_dir(root).map_err(|e| ScanError::io(root, e))?;
        counters.record_dir();

        let children = self.list_children(read, counters);
        debug!(root = %root.display(), children = children.len(), "listing complete");

        let entries = self.size_children(children, counters, cancel, emit)?;
        let total = total_size(&entries);
        let errors = counters.snapshot().errors_count;
        debug!(root = %root.display(), total, errors, "scan complete");

        Ok(ScanSummary {
            root: root.to_path_buf(),
            entries,
            total,
            errors,
            elapsed: start.elapsed(),
        })
    }

    /// Size an explicit list of roots with the same machinery.
    ///
    /// Used by the overview pass. Roots that cannot be read come back as
    /// [`EntrySize::Unknown`].
    pub fn size_paths(
        &self,
        paths: &[PathBuf],
        counters: &ProgressCounters,
        cancel: &CancellationToken,
        emit: &(dyn Fn(ScanEvent) + Sync),
    ) -> Result<Vec<Entry>, ScanError> {
        let children = paths
            .iter()
            .map(|path| {
                let is_dir = fs::symlink_metadata(path)
                    .map(|m| m.is_dir())
                    .unwrap_or(false);
                Child {
                    path: path.clone(),
                    is_dir,
                    folded: is_dir && path.file_name().is_some_and(|n| self.sets.is_fold(n)),
                }
            })
            .collect();
        self.size_children(children, counters, cancel, emit)
    }

    fn list_children(&self, read: ReadDir, counters: &ProgressCounters) -> Vec<Child> {
        let mut children = Vec::new();
        for item in read {
            let entry = match item {
                Ok(entry) => entry,
                Err(_) => {
                    counters.record_error();
                    continue;
                }
            };
            let file_type = match entry.file_type() {
                Ok(ft) => ft,
                Err(_) => {
                    counters.record_error();
                    continue;
                }
            };
            let path = entry.path();
            if self.sets.is_skipped(&path) {
                continue;
            }
            let is_dir = file_type.is_dir();
            children.push(Child {
                folded: is_dir && self.sets.is_fold(&entry.file_name()),
                path,
                is_dir,
            });
        }
        children
    }

    fn size_children(
        &self,
        children: Vec<Child>,
        counters: &ProgressCounters,
        cancel: &CancellationToken,
        emit: &(dyn Fn(ScanEvent) + Sync),
    ) -> Result<Vec<Entry>, ScanError> {
        let cells: Vec<Arc<AtomicU64>> = children
            .iter()
            .map(|_| Arc::new(AtomicU64::new(0)))
            .collect();
        let pending: Vec<Entry> = children
            .iter()
            .map(|c| Entry::pending(&c.path, c.is_dir, c.folded))
            .collect();
        emit(ScanEvent::Listed {
            entries: pending,
            cells: cells.clone(),
        });

        let walk_pool = build_pool("burrow-walk", self.config.worker_count())?;
        let workers = self.config.entry_worker_count().min(children.len());
        let next = AtomicUsize::new(0);

        // Entry workers must be plain threads. Each one blocks in
        // `walk_pool.install` and takes no other child until it returns.
        let sized = thread::scope(|s| -> Result<Vec<(usize, EntrySize)>, ScanError> {
            let mut handles = Vec::with_capacity(workers);
            for i in 0..workers {
                let worker = || {
                    let mut done = Vec::new();
                    loop {
                        let index = next.fetch_add(1, Ordering::Relaxed);
                        let (Some(child), Some(cell)) = (children.get(index), cells.get(index))
                        else {
                            break;
                        };
                        let size = self.size_child(child, cell, &walk_pool, counters, cancel);
                        if !cancel.is_cancelled() {
                            emit(ScanEvent::Sized {
                                path: child.path.clone(),
                                size,
                            });
                        }
                        done.push((index, size));
                    }
                    done
                };
                let handle = thread::Builder::new()
                    .name(format!("burrow-entry-{i}"))
                    .spawn_scoped(s, worker)
                    .map_err(|e| ScanError::Other {
                        message: format!("failed to start entry worker: {e}"),
                    })?;
                handles.push(handle);
            }

            let mut sized = Vec::with_capacity(children.len());
            for handle in handles {
                let done = handle.join().map_err(|_| ScanError::Other {
                    message: "entry worker panicked".to_string(),
                })?;
                sized.extend(done);
            }
            Ok(sized)
        })?;

        let mut sizes = vec![EntrySize::Unknown; children.len()];
        for (index, size) in sized {
            sizes[index] = size;
        }
        let mut entries: Vec<Entry> = children
            .iter()
            .zip(sizes)
            .map(|(child, size)| Entry::sized(&child.path, child.is_dir, child.folded, size))
            .collect();

        if cancel.is_cancelled() {
            return Err(ScanError::Cancelled);
        }
        sort_entries(&mut entries);
        Ok(entries)
    }

    fn size_child(
        &self,
        child: &Child,
        cell: &AtomicU64,
        walk_pool: &ThreadPool,
        counters: &ProgressCounters,
        cancel: &CancellationToken,
    ) -> EntrySize {
        if cancel.is_cancelled() {
            return EntrySize::Unknown;
        }

        if !child.is_dir {
            return match self.file_size(&child.path) {
                Some(len) => {
                    counters.record_file(len);
                    cell.store(len, Ordering::Relaxed);
                    EntrySize::Known(len)
                }
                None => {
                    counters.record_error();
                    EntrySize::Unknown
                }
            };
        }

        if child.folded {
            return match self.probe_fold(&child.path, cell, counters) {
                Some(size) => EntrySize::Known(size),
                None => EntrySize::Unknown,
            };
        }

        match fs::read_dir(&child.path) {
            Ok(read) => {
                counters.record_dir();
                walk_pool.install(|| {
                    rayon::scope(|s| self.walk_entries(s, read, cell, counters, cancel));
                });
                EntrySize::Known(cell.load(Ordering::Relaxed))
            }
            Err(err) => {
                debug!(path = %child.path.display(), error = %err, "unreadable child");
                counters.record_error();
                EntrySize::Unknown
            }
        }
    }

    /// Walk one directory's entries, spawning a task per subdirectory.
    fn walk_entries<'s>(
        &'s self,
        scope: &Scope<'s>,
        read: ReadDir,
        cell: &'s AtomicU64,
        counters: &'s ProgressCounters,
        cancel: &'s CancellationToken,
    ) {
        for item in read {
            if cancel.is_cancelled() {
                return;
            }
            let Ok(entry) = item else {
                counters.record_error();
                continue;
            };
            let Ok(file_type) = entry.file_type() else {
                counters.record_error();
                continue;
            };
            let path = entry.path();

            if !file_type.is_dir() {
                match self.file_size(&path) {
                    Some(len) => {
                        counters.record_file(len);
                        cell.fetch_add(len, Ordering::Relaxed);
                    }
                    None => counters.record_error(),
                }
                continue;
            }

            if self.sets.is_skipped(&path) {
                continue;
            }
            if self.sets.is_fold(&entry.file_name()) {
                self.probe_fold(&path, cell, counters);
                continue;
            }

            scope.spawn(move |s| {
                if cancel.is_cancelled() {
                    return;
                }
                match fs::read_dir(&path) {
                    Ok(read) => {
                        counters.record_dir();
                        self.walk_entries(s, read, cell, counters, cancel);
                    }
                    Err(_) => counters.record_error(),
                }
            });
        }
    }

    /// Charge a fold directory with one probe call. Its contents are never
    /// enumerated.
    fn probe_fold(
        &self,
        path: &Path,
        cell: &AtomicU64,
        counters: &ProgressCounters,
    ) -> Option<u64> {
        counters.record_dir();
        match self.probe.probe(path, self.config.probe_timeout()) {
            Ok(size) => {
                counters.add_bytes(size);
                cell.fetch_add(size, Ordering::Relaxed);
                Some(size)
            }
            Err(err) => {
                warn!(path = %path.display(), error = %err, "size probe failed");
                counters.record_error();
                None
            }
        }
    }

    /// Logical size of a non-directory. Symlinks are charged their own size
    /// unless following is enabled.
    fn file_size(&self, path: &Path) -> Option<u64> {
        let metadata = if self.config.follow_symlinks {
            fs::metadata(path).or_else(|_| fs::symlink_metadata(path))
        } else {
            fs::symlink_metadata(path)
        };
        metadata.ok().map(|m| if m.is_dir() { 0 } else { m.len() })
    }
}

fn build_pool(prefix: &'static str, threads: usize) -> Result<ThreadPool, ScanError> {
    ThreadPoolBuilder::new()
        .num_threads(threads)
        .thread_name(move |i| format!("{prefix}-{i}"))
        .build()
        .map_err(|e| ScanError::Other {
            message: format!("failed to start {prefix} pool: {e}"),
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;
    use tempfile::TempDir;

    fn scanner() -> DirScanner {
        let config = ScanConfig::builder()
            .min_workers(2usize)
            .max_workers(4usize)
            .build()
            .unwrap();
        DirScanner::new(config, Arc::new(PathSets::empty()))
    }

    #[test]
    fn test_scan_sizes_children() {
        let temp = TempDir::new().unwrap();
        fs::create_dir_all(temp.path().join("dir/sub")).unwrap();
        fs::write(temp.path().join("dir/a.bin"), vec![0u8; 100]).unwrap();
        fs::write(temp.path().join("dir/sub/b.bin"), vec![0u8; 200]).unwrap();
        fs::write(temp.path().join("top.bin"), vec![0u8; 50]).unwrap();

        let counters = ProgressCounters::new();
        let cancel = CancellationToken::new();
        let summary = scanner()
            .scan(temp.path(), &counters, &cancel, &|_| {})
            .unwrap();

        assert_eq!(summary.entries.len(), 2);
        assert_eq!(summary.entries[0].name.as_str(), "dir");
        assert_eq!(summary.entries[0].size, EntrySize::Known(300));
        assert_eq!(summary.entries[1].size, EntrySize::Known(50));
        assert_eq!(summary.total, 350);

        let snap = counters.snapshot();
        assert_eq!(snap.files_scanned, 3);
        assert_eq!(snap.bytes_scanned, 350);
    }

    #[test]
    fn test_events_listed_then_sized() {
        let temp = TempDir::new().unwrap();
        fs::write(temp.path().join("a"), b"aaaa").unwrap();
        fs::write(temp.path().join("b"), b"bb").unwrap();

        let events = Mutex::new(Vec::new());
        let counters = ProgressCounters::new();
        let cancel = CancellationToken::new();
        scanner()
            .scan(temp.path(), &counters, &cancel, &|event| {
                events.lock().unwrap().push(event);
            })
            .unwrap();

        let events = events.into_inner().unwrap();
        assert_eq!(events.len(), 3);
        match &events[0] {
            ScanEvent::Listed { entries, cells } => {
                assert_eq!(entries.len(), 2);
                assert_eq!(cells.len(), 2);
                assert!(entries.iter().all(|e| e.size.is_pending()));
            }
            other => panic!("expected Listed, got {other:?}"),
        }
        assert!(
            events[1..]
                .iter()
                .all(|e| matches!(e, ScanEvent::Sized { .. }))
        );
    }

    #[test]
    fn test_scan_file_root_rejected() {
        let temp = TempDir::new().unwrap();
        let file = temp.path().join("f");
        fs::write(&file, b"x").unwrap();

        let result = scanner().scan(
            &file,
            &ProgressCounters::new(),
            &CancellationToken::new(),
            &|_| {},
        );
        assert!(matches!(result, Err(ScanError::NotADirectory { .. })));
    }

    #[test]
    fn test_cancelled_scan() {
        let temp = TempDir::new().unwrap();
        fs::create_dir(temp.path().join("d")).unwrap();

        let cancel = CancellationToken::new();
        cancel.cancel();
        let result = scanner().scan(temp.path(), &ProgressCounters::new(), &cancel, &|_| {});
        assert!(matches!(result, Err(ScanError::Cancelled)));
    }

    #[cfg(unix)]
    #[test]
    fn test_symlink_not_followed() {
        let temp = TempDir::new().unwrap();
        let target = temp.path().join("real");
        fs::create_dir(&target).unwrap();
        fs::write(target.join("big"), vec![0u8; 4096]).unwrap();
        std::os::unix::fs::symlink(&target, temp.path().join("link")).unwrap();

        let summary = scanner()
            .scan(
                temp.path(),
                &ProgressCounters::new(),
                &CancellationToken::new(),
                &|_| {},
            )
            .unwrap();

        let link = summary
            .entries
            .iter()
            .find(|e| e.name.as_str() == "link")
            .unwrap();
        assert!(!link.is_dir);
        assert!(link.bytes() < 4096);
    }
}
