//! State types for the application.

use std::collections::{HashMap, HashSet, VecDeque};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::time::SystemTime;

use serde::{Deserialize, Serialize};
use strum::Display;
use tokio_util::sync::CancellationToken;

use burrow_core::{
    CacheConfig, Entry, EntrySize, LargeFileEntry, PathSets, ScanError, SpotlightConfig,
    sort_entries,
};
use burrow_ops::{DeletionOutcome, DeletionProgress};
use burrow_scan::{ScanSummary, completion_percent};

use crate::theme::ThemeVariant;

use super::constants::RETAINED_LISTINGS;

/// Whether a screen is still waiting on background work.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Scanning,
    Ready,
}

/// Application mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    Overview(Phase),
    Listing(Phase),
    LargeFiles(Phase),
    /// Waiting for the user to confirm a deletion.
    ConfirmDelete,
    /// A deletion batch is running.
    Deleting,
    Quit,
}

impl Mode {
    pub fn is_scanning(&self) -> bool {
        matches!(
            self,
            Mode::Overview(Phase::Scanning)
                | Mode::Listing(Phase::Scanning)
                | Mode::LargeFiles(Phase::Scanning)
        )
    }
}

/// The three list screens.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display)]
pub enum Screen {
    Overview,
    Listing,
    #[strum(to_string = "Large files")]
    LargeFiles,
}

impl Screen {
    pub fn mode(self, phase: Phase) -> Mode {
        match self {
            Screen::Overview => Mode::Overview(phase),
            Screen::Listing => Mode::Listing(phase),
            Screen::LargeFiles => Mode::LargeFiles(phase),
        }
    }
}

/// Direct children of one directory, as currently known.
#[derive(Debug, Clone)]
pub struct Listing {
    pub root: PathBuf,
    pub entries: Vec<Entry>,
    /// Live partial sizes for entries still being walked.
    pub cells: HashMap<PathBuf, Arc<AtomicU64>>,
    /// The scan has reported the children, pending or not.
    pub listed: bool,
    /// Every entry has a final size.
    pub complete: bool,
    /// Sizes no longer reflect the disk, e.g. after deleting files below.
    pub stale: bool,
    pub errors: u64,
}

impl Listing {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            entries: Vec::new(),
            cells: HashMap::new(),
            listed: false,
            complete: false,
            stale: false,
            errors: 0,
        }
    }

    /// Replace the entries with a freshly listed, all-pending set.
    pub fn set_listed(&mut self, entries: Vec<Entry>, cells: Vec<Arc<AtomicU64>>) {
        self.cells = entries
            .iter()
            .zip(cells)
            .map(|(entry, cell)| (entry.path.clone(), cell))
            .collect();
        self.entries = entries;
        self.listed = true;
        sort_entries(&mut self.entries);
    }

    /// Record one child's final size. Returns false when the path is unknown.
    pub fn set_final(&mut self, path: &Path, size: EntrySize) -> bool {
        self.cells.remove(path);
        match self.entries.iter_mut().find(|e| e.path == path) {
            Some(entry) => {
                entry.size.finalize(size);
                true
            }
            None => false,
        }
    }

    /// Pull partial sizes from the live cells. Returns true if anything grew.
    pub fn sample_cells(&mut self) -> bool {
        let mut changed = false;
        for entry in &mut self.entries {
            if let Some(cell) = self.cells.get(&entry.path) {
                let before = entry.size;
                entry.size.advance(cell.load(Ordering::Relaxed));
                changed |= entry.size != before;
            }
        }
        changed
    }

    /// Adopt the final result of a completed scan.
    pub fn complete_with(&mut self, summary: ScanSummary) {
        self.entries = summary.entries;
        self.errors = summary.errors;
        self.cells.clear();
        self.listed = true;
        self.complete = true;
        self.stale = false;
    }

    pub fn finalized_count(&self) -> usize {
        self.entries.iter().filter(|e| e.size.is_final()).count()
    }

    /// Share of children sized, unknown until the children are listed.
    pub fn completion(&self) -> Option<u8> {
        self.listed
            .then(|| completion_percent(self.finalized_count(), self.entries.len()))
    }

    /// Drop entries that were deleted.
    pub fn remove_paths(&mut self, removed: &HashSet<PathBuf>) {
        self.entries.retain(|e| !removed.contains(&e.path));
    }
}

/// Bounded store of completed listings, keyed by directory.
///
/// Oldest insertions are evicted first.
#[derive(Debug, Default)]
pub struct RetainedListings {
    listings: HashMap<PathBuf, Listing>,
    order: VecDeque<PathBuf>,
}

impl RetainedListings {
    /// Keep a completed listing. Incomplete listings are ignored.
    pub fn insert(&mut self, listing: Listing) {
        if !listing.complete || listing.stale {
            return;
        }
        let root = listing.root.clone();
        if self.listings.insert(root.clone(), listing).is_none() {
            self.order.push_back(root);
        }
        while self.order.len() > RETAINED_LISTINGS {
            if let Some(oldest) = self.order.pop_front() {
                self.listings.remove(&oldest);
            }
        }
    }

    pub fn get(&self, root: &Path) -> Option<&Listing> {
        self.listings.get(root)
    }

    pub fn len(&self) -> usize {
        self.listings.len()
    }

    /// Discard every listing whose directory contains `path`.
    pub fn discard_ancestors(&mut self, path: &Path) {
        self.listings.retain(|root, _| !path.starts_with(root));
        self.order.retain(|root| !path.starts_with(root));
    }
}

/// Saved position of a listing level, restored on back navigation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NavFrame {
    pub path: PathBuf,
    pub top: usize,
    pub cursor: usize,
}

/// Details shown by the file-info popup.
#[derive(Debug, Clone)]
pub struct FileInfo {
    pub path: PathBuf,
    pub size: EntrySize,
    pub is_dir: bool,
    pub folded: bool,
    /// `None` while the lookup runs.
    pub last_access: Option<Option<SystemTime>>,
}

/// A deletion awaiting confirmation.
#[derive(Debug, Clone)]
pub struct PendingDelete {
    pub items: Vec<(PathBuf, u64)>,
    pub root: PathBuf,
    pub origin: Screen,
}

impl PendingDelete {
    pub fn total_size(&self) -> u64 {
        self.items.iter().map(|(_, size)| size).sum()
    }
}

/// A deletion batch in flight.
#[derive(Debug)]
pub struct ActiveDeletion {
    pub origin: Screen,
    /// Listed size of each item in the batch.
    pub sizes: HashMap<PathBuf, u64>,
    pub progress: DeletionProgress,
    pub removed: Arc<AtomicUsize>,
    pub cancel: CancellationToken,
    pub interrupted: bool,
}

impl ActiveDeletion {
    pub fn removed_count(&self) -> usize {
        self.removed.load(Ordering::Relaxed)
    }
}

/// Messages from background tasks to the event loop.
///
/// Each carries the generation of the job that produced it; the loop drops
/// messages from superseded jobs.
#[derive(Debug)]
pub enum AppEvent {
    Listed {
        generation: u64,
        entries: Vec<Entry>,
        cells: Vec<Arc<AtomicU64>>,
    },
    Sized {
        generation: u64,
        path: PathBuf,
        size: EntrySize,
    },
    ScanFinished {
        generation: u64,
        result: Result<ScanSummary, ScanError>,
    },
    OverviewFinished {
        generation: u64,
        result: Result<Vec<Entry>, ScanError>,
    },
    SpotlightFinished {
        generation: u64,
        result: Result<Vec<LargeFileEntry>, ScanError>,
    },
    DeletionProgress {
        generation: u64,
        progress: DeletionProgress,
    },
    DeletionFinished {
        generation: u64,
        outcome: DeletionOutcome,
    },
    FileInfo {
        path: PathBuf,
        last_access: Option<SystemTime>,
    },
}

/// Per-kind job generations.
#[derive(Debug, Default, Clone, Copy)]
pub struct Generations {
    pub scan: u64,
    pub spotlight: u64,
    pub deletion: u64,
}

/// User settings persisted to the config file.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct UserSettings {
    pub theme: ThemeVariant,
    /// Move deleted items to the trash instead of removing them.
    pub use_trash: bool,
    /// Replaces the built-in overview roots when non-empty.
    pub overview_roots: Vec<PathBuf>,
    pub spotlight_threshold: Option<u64>,
    pub spotlight_max_count: Option<usize>,
    pub cache_ttl_secs: Option<u64>,
    pub cache_grace_secs: Option<u64>,
    /// Added to the built-in fold directory names.
    pub extra_fold_names: Vec<String>,
    pub deletion_concurrency: Option<usize>,
}

impl UserSettings {
    /// Get the config file path.
    pub fn config_path() -> Option<PathBuf> {
        dirs::config_dir().map(|d| d.join("burrow").join("settings.toml"))
    }

    /// Load settings from disk, or return defaults.
    pub fn load() -> Self {
        Self::config_path()
            .and_then(|path| std::fs::read_to_string(&path).ok())
            .and_then(|content| Self::parse(&content))
            .unwrap_or_default()
    }

    fn parse(content: &str) -> Option<Self> {
        match toml::from_str(content) {
            Ok(settings) => Some(settings),
            Err(err) => {
                tracing::warn!(error = %err, "ignoring invalid settings file");
                None
            }
        }
    }

    /// Save settings to disk.
    pub fn save(&self) -> std::io::Result<()> {
        let path = Self::config_path().ok_or_else(|| {
            std::io::Error::new(std::io::ErrorKind::NotFound, "No config directory")
        })?;

        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let content = toml::to_string_pretty(self)
            .map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidData, e))?;

        std::fs::write(&path, content)
    }

    pub fn path_sets(&self) -> PathSets {
        PathSets::curated().with_fold_names(self.extra_fold_names.iter().map(String::as_str))
    }

    pub fn spotlight_config(&self) -> SpotlightConfig {
        let mut config = SpotlightConfig::default();
        if let Some(threshold) = self.spotlight_threshold {
            config.threshold = threshold;
        }
        if let Some(count) = self.spotlight_max_count {
            config.max_count = count.max(1);
        }
        config
    }

    pub fn cache_config(&self) -> CacheConfig {
        let mut config = CacheConfig::default();
        if let Some(ttl) = self.cache_ttl_secs {
            config.ttl_secs = ttl;
        }
        if let Some(grace) = self.cache_grace_secs {
            config.grace_secs = grace;
        }
        config
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::Path;

    fn listing_with(root: &str, names: &[(&str, u64)]) -> Listing {
        let mut listing = Listing::new(root);
        listing.entries = names
            .iter()
            .map(|(name, size)| {
                Entry::sized(
                    Path::new(root).join(name),
                    false,
                    false,
                    EntrySize::Known(*size),
                )
            })
            .collect();
        listing.listed = true;
        listing.complete = true;
        listing
    }

    #[test]
    fn test_completion_unknown_until_listed() {
        let mut listing = Listing::new("/r");
        assert_eq!(listing.completion(), None);

        listing.set_listed(
            vec![
                Entry::pending("/r/a", true, false),
                Entry::pending("/r/b", true, false),
            ],
            vec![Arc::new(AtomicU64::new(0)), Arc::new(AtomicU64::new(0))],
        );
        assert_eq!(listing.completion(), Some(0));
        listing.set_final(Path::new("/r/a"), EntrySize::Known(1));
        assert_eq!(listing.completion(), Some(50));
        listing.set_final(Path::new("/r/b"), EntrySize::Known(1));
        assert_eq!(listing.completion(), Some(100));

        // An empty directory is complete once listed.
        let mut empty = Listing::new("/e");
        empty.set_listed(Vec::new(), Vec::new());
        assert_eq!(empty.completion(), Some(100));
    }

    #[test]
    fn test_listed_then_sized() {
        let mut listing = Listing::new("/r");
        let entries = vec![
            Entry::pending("/r/a", true, false),
            Entry::pending("/r/b", true, false),
        ];
        let cells = vec![Arc::new(AtomicU64::new(0)), Arc::new(AtomicU64::new(0))];
        listing.set_listed(entries, cells.clone());

        cells[1].store(700, Ordering::Relaxed);
        assert!(listing.sample_cells());
        assert!(!listing.sample_cells());

        assert!(listing.set_final(Path::new("/r/a"), EntrySize::Known(50)));
        assert!(!listing.set_final(Path::new("/r/zzz"), EntrySize::Known(1)));
        assert_eq!(listing.finalized_count(), 1);
        assert!(!listing.cells.contains_key(Path::new("/r/a")));
    }

    #[test]
    fn test_retained_evicts_oldest_and_skips_incomplete() {
        let mut retained = RetainedListings::default();
        let mut incomplete = listing_with("/x", &[]);
        incomplete.complete = false;
        retained.insert(incomplete);
        assert_eq!(retained.len(), 0);

        for i in 0..RETAINED_LISTINGS + 3 {
            retained.insert(listing_with(&format!("/d{i}"), &[("f", 1)]));
        }
        assert_eq!(retained.len(), RETAINED_LISTINGS);
        assert!(retained.get(Path::new("/d0")).is_none());
        assert!(retained.get(Path::new("/d3")).is_some());
    }

    #[test]
    fn test_discard_ancestors() {
        let mut retained = RetainedListings::default();
        retained.insert(listing_with("/home", &[("u", 1)]));
        retained.insert(listing_with("/home/u", &[("cache", 1)]));
        retained.insert(listing_with("/var", &[("log", 1)]));

        retained.discard_ancestors(Path::new("/home/u/cache"));
        assert!(retained.get(Path::new("/home")).is_none());
        assert!(retained.get(Path::new("/home/u")).is_none());
        assert!(retained.get(Path::new("/var")).is_some());
    }

    #[test]
    fn test_settings_parse_and_overrides() {
        let settings = UserSettings::parse(
            r#"
            theme = "light"
            use_trash = true
            spotlight_threshold = 5000
            extra_fold_names = ["bazel-out"]
            "#,
        )
        .unwrap();
        assert_eq!(settings.theme, ThemeVariant::Light);
        assert!(settings.use_trash);
        assert_eq!(settings.spotlight_config().threshold, 5000);
        assert_eq!(settings.cache_config().ttl_secs, CacheConfig::default().ttl_secs);
        assert!(settings.path_sets().is_fold("bazel-out".as_ref()));
        assert!(settings.path_sets().is_fold("node_modules".as_ref()));

        assert!(UserSettings::parse("theme = 3").is_none());
    }
}
