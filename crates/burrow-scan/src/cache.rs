//! Persistent cache of overview root sizes.
//!
//! One JSON document maps root paths to `{ size_bytes, computed_at_epoch }`.
//! It is read once at startup and rewritten whole, through a temp file and a
//! rename, by its single owner.

use std::collections::BTreeMap;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use burrow_core::CacheConfig;

const CACHE_FILE: &str = "overview_sizes.json";

/// One cached root size.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CacheRecord {
    pub size_bytes: u64,
    pub computed_at_epoch: u64,
}

/// Root size cache with TTL and modification-time staleness.
#[derive(Debug)]
pub struct SizeCache {
    path: PathBuf,
    config: CacheConfig,
    records: BTreeMap<String, CacheRecord>,
}

impl SizeCache {
    /// Default location: `<cache dir>/burrow/overview_sizes.json`.
    pub fn default_path() -> Option<PathBuf> {
        dirs::cache_dir().map(|dir| dir.join("burrow").join(CACHE_FILE))
    }

    /// Load the cache file. A missing or malformed file yields an empty cache.
    pub fn load(path: impl Into<PathBuf>, config: CacheConfig) -> Self {
        let path = path.into();
        let records = match fs::read_to_string(&path) {
            Ok(content) => match serde_json::from_str(&content) {
                Ok(records) => records,
                Err(err) => {
                    warn!(path = %path.display(), error = %err, "ignoring corrupt size cache");
                    BTreeMap::new()
                }
            },
            Err(err) if err.kind() == io::ErrorKind::NotFound => BTreeMap::new(),
            Err(err) => {
                warn!(path = %path.display(), error = %err, "cannot read size cache");
                BTreeMap::new()
            }
        };
        debug!(path = %path.display(), records = records.len(), "size cache loaded");
        Self {
            path,
            config,
            records,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Cached size for `root` and whether it is still fresh.
    pub fn get(&self, root: &Path) -> Option<(u64, bool)> {
        self.get_at(root, SystemTime::now())
    }

    /// Like [`get`](Self::get), evaluated at `now`.
    ///
    /// Fresh means younger than the TTL, and the root was not modified more
    /// than the grace window after the size was computed.
    pub fn get_at(&self, root: &Path, now: SystemTime) -> Option<(u64, bool)> {
        let record = self.records.get(&key(root))?;
        let now_secs = epoch_secs(now);
        let within_ttl = now_secs.saturating_sub(record.computed_at_epoch) < self.config.ttl_secs;

        let unchanged = fs::metadata(root)
            .and_then(|m| m.modified())
            .map(|mtime| {
                epoch_secs(mtime) <= record.computed_at_epoch.saturating_add(self.config.grace_secs)
            })
            .unwrap_or(false);

        Some((record.size_bytes, within_ttl && unchanged))
    }

    /// Record a size computed now.
    pub fn put(&mut self, root: &Path, size: u64) {
        self.put_at(root, size, SystemTime::now());
    }

    /// Record a size computed at `computed_at`.
    pub fn put_at(&mut self, root: &Path, size: u64, computed_at: SystemTime) {
        self.records.insert(
            key(root),
            CacheRecord {
                size_bytes: size,
                computed_at_epoch: epoch_secs(computed_at),
            },
        );
    }

    /// Drop the record for `root`.
    pub fn invalidate(&mut self, root: &Path) -> bool {
        self.records.remove(&key(root)).is_some()
    }

    /// Drop every record whose root contains `path` (including `path` itself).
    pub fn invalidate_ancestors(&mut self, path: &Path) -> usize {
        let before = self.records.len();
        self.records
            .retain(|root, _| !path.starts_with(Path::new(root)));
        before - self.records.len()
    }

    /// Write the whole cache atomically.
    pub fn save(&self) -> io::Result<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }
        let content = serde_json::to_string_pretty(&self.records)?;
        let tmp = self.path.with_extension("json.tmp");
        fs::write(&tmp, content)?;
        fs::rename(&tmp, &self.path)?;
        debug!(path = %self.path.display(), records = self.records.len(), "size cache saved");
        Ok(())
    }
}

fn key(root: &Path) -> String {
    root.to_string_lossy().into_owned()
}

fn epoch_secs(time: SystemTime) -> u64 {
    time.duration_since(UNIX_EPOCH)
        .unwrap_or(Duration::ZERO)
        .as_secs()
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_missing_file_is_empty() {
        let temp = TempDir::new().unwrap();
        let cache = SizeCache::load(temp.path().join("none.json"), CacheConfig::default());
        assert!(cache.is_empty());
    }

    #[test]
    fn test_corrupt_file_is_empty() {
        let temp = TempDir::new().unwrap();
        let file = temp.path().join("cache.json");
        fs::write(&file, "{ not json").unwrap();

        let cache = SizeCache::load(&file, CacheConfig::default());
        assert!(cache.is_empty());
    }

    #[test]
    fn test_invalidate_ancestors() {
        let temp = TempDir::new().unwrap();
        let mut cache = SizeCache::load(temp.path().join("c.json"), CacheConfig::default());
        cache.put(Path::new("/home/u"), 10);
        cache.put(Path::new("/home/u/Downloads"), 5);
        cache.put(Path::new("/home/user2"), 7);

        let removed = cache.invalidate_ancestors(Path::new("/home/u/Downloads/x.iso"));
        assert_eq!(removed, 2);
        assert_eq!(cache.len(), 1);
        assert!(cache.get(Path::new("/home/user2")).is_some());
    }

    #[test]
    fn test_schema_on_disk() {
        let temp = TempDir::new().unwrap();
        let file = temp.path().join("c.json");
        let mut cache = SizeCache::load(&file, CacheConfig::default());
        cache.put_at(Path::new("/r"), 500, UNIX_EPOCH + Duration::from_secs(1_000));
        cache.save().unwrap();

        let value: serde_json::Value =
            serde_json::from_str(&fs::read_to_string(&file).unwrap()).unwrap();
        assert_eq!(value["/r"]["size_bytes"], 500);
        assert_eq!(value["/r"]["computed_at_epoch"], 1_000);
        assert!(!file.with_extension("json.tmp").exists());
    }
}
