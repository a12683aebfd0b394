//! Listing entries and their size states.

use std::cmp::Ordering;
use std::path::{Path, PathBuf};
use std::time::SystemTime;

use compact_str::CompactString;
use serde::{Deserialize, Serialize};

/// Size of an entry as seen by the listing.
///
/// `Pending` carries the live partial sum of a subtree that is still being
/// walked. Once the walk finishes the size becomes `Known`, or `Unknown` when
/// the size could not be determined (probe timeout, unreadable root).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum EntrySize {
    /// Still being computed; the value is the bytes seen so far.
    Pending(u64),
    /// Final size in bytes.
    Known(u64),
    /// Could not be determined. Counts as zero.
    Unknown,
}

impl EntrySize {
    /// A pending size with nothing counted yet.
    pub const fn pending() -> Self {
        Self::Pending(0)
    }

    /// Bytes to use for totals, bars and sorting.
    pub fn bytes(&self) -> u64 {
        match self {
            Self::Pending(b) | Self::Known(b) => *b,
            Self::Unknown => 0,
        }
    }

    /// Whether the size is still being computed.
    pub fn is_pending(&self) -> bool {
        matches!(self, Self::Pending(_))
    }

    /// Whether the size has been finalized (known or unknown).
    pub fn is_final(&self) -> bool {
        !self.is_pending()
    }

    /// Raise a pending partial sum. Never lowers it, never touches a final size.
    pub fn advance(&mut self, bytes: u64) {
        if let Self::Pending(current) = self {
            if bytes > *current {
                *current = bytes;
            }
        }
    }

    /// Finalize a pending size. A size that is already final stays frozen.
    pub fn finalize(&mut self, size: EntrySize) {
        if self.is_pending() && size.is_final() {
            *self = size;
        }
    }
}

impl Default for EntrySize {
    fn default() -> Self {
        Self::pending()
    }
}

/// One child of the directory currently displayed.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Entry {
    /// File or directory name (not the full path).
    pub name: CompactString,
    /// Absolute path.
    pub path: PathBuf,
    /// Current size state.
    pub size: EntrySize,
    /// Whether this is a directory.
    pub is_dir: bool,
    /// Fold directory: sized but never enumerated or explored.
    pub folded: bool,
    /// Last access time, resolved lazily on request.
    #[serde(skip)]
    pub last_access: Option<SystemTime>,
}

impl Entry {
    /// Create an entry whose size is still pending.
    pub fn pending(path: impl Into<PathBuf>, is_dir: bool, folded: bool) -> Self {
        let path = path.into();
        Self {
            name: display_name(&path),
            path,
            size: EntrySize::pending(),
            is_dir,
            folded,
            last_access: None,
        }
    }

    /// Create an entry with a final size.
    pub fn sized(path: impl Into<PathBuf>, is_dir: bool, folded: bool, size: EntrySize) -> Self {
        let mut entry = Self::pending(path, is_dir, folded);
        entry.size.finalize(size);
        entry
    }

    /// Whether the user can drill into this entry.
    pub fn is_explorable(&self) -> bool {
        self.is_dir && !self.folded
    }

    /// Bytes to use for totals.
    pub fn bytes(&self) -> u64 {
        self.size.bytes()
    }
}

fn display_name(path: &Path) -> CompactString {
    path.file_name()
        .map(|n| CompactString::new(n.to_string_lossy()))
        .unwrap_or_else(|| CompactString::new(path.to_string_lossy()))
}

/// A top-level root shown in the overview.
#[derive(Debug, Clone)]
pub struct OverviewEntry {
    /// Human label ("Home", "Applications", ...).
    pub label: CompactString,
    /// The root itself.
    pub entry: Entry,
    /// Whether the size came from the size cache.
    pub cached: bool,
}

impl OverviewEntry {
    /// Create a pending overview entry for a root.
    pub fn new(label: impl Into<CompactString>, path: impl Into<PathBuf>) -> Self {
        Self {
            label: label.into(),
            entry: Entry::pending(path, true, false),
            cached: false,
        }
    }
}

/// A file found by the large-file spotlight scan.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LargeFileEntry {
    /// Absolute path.
    pub path: PathBuf,
    /// Size in bytes.
    pub size: u64,
}

impl LargeFileEntry {
    /// Create a new large-file entry.
    pub fn new(path: impl Into<PathBuf>, size: u64) -> Self {
        Self {
            path: path.into(),
            size,
        }
    }
}

impl Ord for LargeFileEntry {
    /// Ranking order: larger first, ties by ascending path.
    fn cmp(&self, other: &Self) -> Ordering {
        other
            .size
            .cmp(&self.size)
            .then_with(|| self.path.cmp(&other.path))
    }
}

impl PartialOrd for LargeFileEntry {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

/// Sort entries by size descending, ties by name.
pub fn sort_entries(entries: &mut [Entry]) {
    entries.sort_by(|a, b| b.bytes().cmp(&a.bytes()).then_with(|| a.name.cmp(&b.name)));
}

/// Sum of all entry sizes. Unknown sizes count as zero.
pub fn total_size(entries: &[Entry]) -> u64 {
    entries.iter().map(Entry::bytes).sum()
}

/// Size of the largest entry (0 for an empty listing).
pub fn largest_size(entries: &[Entry]) -> u64 {
    entries.iter().map(Entry::bytes).max().unwrap_or(0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pending_size_only_grows() {
        let mut size = EntrySize::pending();
        size.advance(100);
        size.advance(40);
        assert_eq!(size, EntrySize::Pending(100));
    }

    #[test]
    fn test_final_size_is_frozen() {
        let mut size = EntrySize::Pending(10);
        size.finalize(EntrySize::Known(50));
        size.advance(500);
        size.finalize(EntrySize::Known(1));
        assert_eq!(size, EntrySize::Known(50));
    }

    #[test]
    fn test_unknown_counts_as_zero() {
        let entries = vec![
            Entry::sized("/r/a", true, false, EntrySize::Known(7)),
            Entry::sized("/r/b", true, false, EntrySize::Unknown),
        ];
        assert_eq!(total_size(&entries), 7);
    }

    #[test]
    fn test_large_file_ordering() {
        let mut files = vec![
            LargeFileEntry::new("/b", 10),
            LargeFileEntry::new("/a", 10),
            LargeFileEntry::new("/c", 30),
        ];
        files.sort();
        let paths: Vec<_> = files.iter().map(|f| f.path.to_str().unwrap()).collect();
        assert_eq!(paths, vec!["/c", "/a", "/b"]);
    }

    #[test]
    fn test_entry_name_from_path() {
        let entry = Entry::pending("/home/user/Downloads", true, false);
        assert_eq!(entry.name.as_str(), "Downloads");
        assert!(entry.is_explorable());

        let folded = Entry::pending("/src/node_modules", true, true);
        assert!(!folded.is_explorable());
    }
}
