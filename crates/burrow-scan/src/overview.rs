//! Overview pass: the fixed set of top-level roots and cache planning.

use std::path::{Path, PathBuf};
use std::time::SystemTime;

use compact_str::CompactString;

use burrow_core::PathSets;

use crate::cache::SizeCache;

/// A top-level root shown on the overview screen.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OverviewRoot {
    pub label: CompactString,
    pub path: PathBuf,
}

impl OverviewRoot {
    pub fn new(label: impl Into<CompactString>, path: impl Into<PathBuf>) -> Self {
        Self {
            label: label.into(),
            path: path.into(),
        }
    }
}

/// Which roots can be served from the cache and which must be sized.
#[derive(Debug, Clone, Default)]
pub struct OverviewPlan {
    /// Roots with a fresh cached size.
    pub cached: Vec<(OverviewRoot, u64)>,
    /// Roots to size live.
    pub to_scan: Vec<OverviewRoot>,
}

/// Default overview roots for this platform.
///
/// Only existing directories are returned, without duplicates, and never a
/// skipped location.
pub fn default_roots(sets: &PathSets) -> Vec<OverviewRoot> {
    let mut candidates = Vec::new();
    if let Some(home) = dirs::home_dir() {
        candidates.push(OverviewRoot::new("Home", home));
    }
    if let Some(dir) = dirs::download_dir() {
        candidates.push(OverviewRoot::new("Downloads", dir));
    }
    if let Some(dir) = dirs::cache_dir() {
        candidates.push(OverviewRoot::new("Caches", dir));
    }
    if cfg!(target_os = "macos") {
        candidates.push(OverviewRoot::new("Applications", "/Applications"));
        candidates.push(OverviewRoot::new("Library", "/Library"));
    } else {
        candidates.push(OverviewRoot::new("Optional software", "/opt"));
        candidates.push(OverviewRoot::new("System programs", "/usr"));
        candidates.push(OverviewRoot::new("Variable data", "/var"));
    }
    retain_valid(candidates, sets)
}

/// Overview roots from explicit paths, labelled by their file name.
pub fn roots_from_paths(paths: &[PathBuf], sets: &PathSets) -> Vec<OverviewRoot> {
    let candidates = paths
        .iter()
        .map(|path| {
            let label = path
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_else(|| path.display().to_string());
            OverviewRoot::new(label, path.clone())
        })
        .collect();
    retain_valid(candidates, sets)
}

fn retain_valid(candidates: Vec<OverviewRoot>, sets: &PathSets) -> Vec<OverviewRoot> {
    let mut roots: Vec<OverviewRoot> = Vec::with_capacity(candidates.len());
    for root in candidates {
        if sets.is_skipped(&root.path) || !root.path.is_dir() {
            continue;
        }
        if roots.iter().any(|r| same_path(&r.path, &root.path)) {
            continue;
        }
        roots.push(root);
    }
    roots
}

fn same_path(a: &Path, b: &Path) -> bool {
    a == b
        || matches!(
            (a.canonicalize(), b.canonicalize()),
            (Ok(ca), Ok(cb)) if ca == cb
        )
}

/// Split roots into cache hits and roots that need a live size.
///
/// `bypass` forces every root to be sized again.
pub fn plan_overview(
    roots: &[OverviewRoot],
    cache: &SizeCache,
    now: SystemTime,
    bypass: bool,
) -> OverviewPlan {
    let mut plan = OverviewPlan::default();
    for root in roots {
        match cache.get_at(&root.path, now) {
            Some((size, true)) if !bypass => plan.cached.push((root.clone(), size)),
            _ => plan.to_scan.push(root.clone()),
        }
    }
    plan
}

#[cfg(test)]
mod tests {
    use super::*;
    use burrow_core::CacheConfig;
    use tempfile::TempDir;

    #[test]
    fn test_roots_from_paths_filters() {
        let temp = TempDir::new().unwrap();
        let a = temp.path().join("alpha");
        std::fs::create_dir(&a).unwrap();
        let skipped = temp.path().join("skipme");
        std::fs::create_dir(&skipped).unwrap();

        let sets = PathSets::empty().with_skip_paths([skipped.clone()]);
        let roots = roots_from_paths(
            &[a.clone(), a.clone(), skipped, temp.path().join("missing")],
            &sets,
        );

        assert_eq!(roots.len(), 1);
        assert_eq!(roots[0].label.as_str(), "alpha");
        assert_eq!(roots[0].path, a);
    }

    #[test]
    fn test_plan_bypass() {
        let temp = TempDir::new().unwrap();
        let root = OverviewRoot::new("t", temp.path());
        let mut cache = SizeCache::load(temp.path().join("c.json"), CacheConfig::default());
        cache.put(temp.path(), 42);

        let plan = plan_overview(std::slice::from_ref(&root), &cache, SystemTime::now(), false);
        assert_eq!(plan.cached, vec![(root.clone(), 42)]);
        assert!(plan.to_scan.is_empty());

        let plan = plan_overview(&[root], &cache, SystemTime::now(), true);
        assert!(plan.cached.is_empty());
        assert_eq!(plan.to_scan.len(), 1);
    }
}
