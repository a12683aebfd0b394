//! Large-file spotlight scan.

use std::collections::BinaryHeap;
use std::path::Path;
use std::sync::Arc;

use jwalk::{Parallelism, WalkDir};
use tokio_util::sync::CancellationToken;
use tracing::debug;

use burrow_core::{LargeFileEntry, PathSets, ScanError, SpotlightConfig};

use crate::progress::ProgressCounters;

/// Finds the largest files under a root on its own jwalk pool.
pub struct LargeFileScanner {
    config: SpotlightConfig,
    sets: Arc<PathSets>,
}

impl LargeFileScanner {
    pub fn new(config: SpotlightConfig, sets: Arc<PathSets>) -> Self {
        Self { config, sets }
    }

    pub fn config(&self) -> &SpotlightConfig {
        &self.config
    }

    /// Up to `max_count` files of at least `threshold` bytes, largest first.
    ///
    /// Fold and skipped directories are not descended. Files with an
    /// excluded extension never qualify.
    pub fn scan(
        &self,
        root: &Path,
        counters: &ProgressCounters,
        cancel: &CancellationToken,
    ) -> Result<Vec<LargeFileEntry>, ScanError> {
        let metadata = std::fs::metadata(root).map_err(|e| ScanError::io(root, e))?;
        if !metadata.is_dir() {
            return Err(ScanError::NotADirectory {
                path: root.to_path_buf(),
            });
        }

        let threshold = self.config.threshold;
        let max_count = self.config.max_count;
        let prefilter = self.config.effective_prefilter();
        let sets = Arc::clone(&self.sets);
        let cancel_walk = cancel.clone();

        let walker = WalkDir::new(root)
            .parallelism(Parallelism::RayonNewPool(self.config.worker_count()))
            .skip_hidden(false)
            .follow_links(false)
            .process_read_dir(move |_depth, _path, _read_dir_state, children| {
                if cancel_walk.is_cancelled() {
                    children.clear();
                    return;
                }
                children.retain(|entry| {
                    let Ok(e) = entry else {
                        return true;
                    };
                    let file_type = e.file_type();
                    if file_type.is_symlink() {
                        return false;
                    }
                    if file_type.is_dir() {
                        return !sets.is_fold(e.file_name()) && !sets.is_skipped(&e.path());
                    }
                    // Cheap size cut before the full check.
                    e.metadata().is_ok_and(|m| m.len() >= prefilter)
                });
            });

        let mut heap: BinaryHeap<LargeFileEntry> = BinaryHeap::with_capacity(max_count + 1);
        for item in walker {
            if cancel.is_cancelled() {
                return Err(ScanError::Cancelled);
            }
            let entry = match item {
                Ok(entry) => entry,
                Err(_) => {
                    counters.record_error();
                    continue;
                }
            };
            if entry.file_type().is_dir() {
                counters.record_dir();
                continue;
            }
            let Ok(metadata) = entry.metadata() else {
                counters.record_error();
                continue;
            };
            let size = metadata.len();
            counters.record_file(size);

            let path = entry.path();
            if size < threshold || self.sets.is_excluded_extension(&path) {
                continue;
            }
            // The heap's top is the weakest candidate.
            heap.push(LargeFileEntry::new(path, size));
            if heap.len() > max_count {
                heap.pop();
            }
        }

        let files = heap.into_sorted_vec();
        debug!(root = %root.display(), found = files.len(), "spotlight complete");
        Ok(files)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_threshold_and_order() {
        let temp = TempDir::new().unwrap();
        fs::create_dir(temp.path().join("nested")).unwrap();
        fs::write(temp.path().join("small.bin"), vec![0u8; 10]).unwrap();
        fs::write(temp.path().join("mid.bin"), vec![0u8; 2000]).unwrap();
        fs::write(temp.path().join("nested/big.bin"), vec![0u8; 5000]).unwrap();

        let scanner = LargeFileScanner::new(
            SpotlightConfig::with_threshold(1000),
            Arc::new(PathSets::empty()),
        );
        let files = scanner
            .scan(
                temp.path(),
                &ProgressCounters::new(),
                &CancellationToken::new(),
            )
            .unwrap();

        assert_eq!(files.len(), 2);
        assert_eq!(files[0].size, 5000);
        assert_eq!(files[1].size, 2000);
    }
}
