//! Immutable lookup sets for fold, skip, exclusion and protection decisions.

use std::collections::HashSet;
use std::ffi::OsStr;
use std::path::{Path, PathBuf};

/// Directory names that are sized but never enumerated.
const FOLD_NAMES: &[&str] = &[
    ".git",
    ".hg",
    ".svn",
    "node_modules",
    "bower_components",
    ".pnpm-store",
    "__pycache__",
    ".pytest_cache",
    ".mypy_cache",
    ".tox",
    ".venv",
    "venv",
    ".gradle",
    ".m2",
    ".cargo",
    "target",
    "DerivedData",
    "Pods",
    ".next",
    ".nuxt",
    ".turbo",
    ".terraform",
];

/// Virtual or system locations never descended into.
const SKIP_PATHS: &[&str] = &[
    "/proc",
    "/sys",
    "/dev",
    "/run",
    "/snap",
    "/lost+found",
    "/System",
    "/Volumes",
    "/private/var/vm",
    "/private/var/db",
    "/cores",
    "/.Spotlight-V100",
    "/.fseventsd",
];

/// File extensions never reported by the spotlight scan.
const EXCLUDED_EXTENSIONS: &[&str] = &[
    "txt", "log", "md", "rst", "rs", "go", "py", "rb", "js", "jsx", "ts", "tsx", "c", "h", "cc",
    "cpp", "hpp", "java", "kt", "swift", "m", "cs", "php", "sh", "json", "yaml", "yml", "toml",
    "xml", "html", "css", "scss", "csv", "tsv", "sql", "ini", "cfg", "conf",
];

/// Paths that may never be deleted themselves.
const PROTECTED_EXACT: &[&str] = &[
    "/",
    "/Applications",
    "/Library",
    "/Users",
    "/home",
    "/opt",
    "/var",
    "/tmp",
    "/private",
    "/private/var",
    "/usr",
    "/usr/local",
];

/// Paths whose entire subtree is off limits.
const PROTECTED_TREES: &[&str] = &[
    "/System",
    "/bin",
    "/sbin",
    "/usr/bin",
    "/usr/sbin",
    "/usr/lib",
    "/usr/libexec",
    "/usr/share",
    "/etc",
    "/private/etc",
    "/boot",
    "/dev",
    "/proc",
    "/sys",
];

/// Lookup sets built once at startup and shared with every component.
#[derive(Debug, Clone)]
pub struct PathSets {
    fold_names: HashSet<String>,
    skip_paths: Vec<PathBuf>,
    excluded_extensions: HashSet<String>,
    protected_exact: HashSet<PathBuf>,
    protected_trees: Vec<PathBuf>,
}

impl PathSets {
    /// Empty sets: nothing folded, skipped, excluded or protected.
    pub fn empty() -> Self {
        Self {
            fold_names: HashSet::new(),
            skip_paths: Vec::new(),
            excluded_extensions: HashSet::new(),
            protected_exact: HashSet::new(),
            protected_trees: Vec::new(),
        }
    }

    /// The curated sets, with the current home directory protected.
    pub fn curated() -> Self {
        let mut sets = Self {
            fold_names: FOLD_NAMES.iter().map(|s| s.to_string()).collect(),
            skip_paths: SKIP_PATHS.iter().map(PathBuf::from).collect(),
            excluded_extensions: EXCLUDED_EXTENSIONS.iter().map(|s| s.to_string()).collect(),
            protected_exact: PROTECTED_EXACT.iter().map(PathBuf::from).collect(),
            protected_trees: PROTECTED_TREES.iter().map(PathBuf::from).collect(),
        };
        if let Some(home) = dirs::home_dir() {
            sets.protected_exact.insert(home);
        }
        sets
    }

    /// Add fold directory names.
    pub fn with_fold_names<I, S>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.fold_names.extend(names.into_iter().map(Into::into));
        self
    }

    /// Add skipped locations.
    pub fn with_skip_paths<I, P>(mut self, paths: I) -> Self
    where
        I: IntoIterator<Item = P>,
        P: Into<PathBuf>,
    {
        self.skip_paths.extend(paths.into_iter().map(Into::into));
        self
    }

    /// Add excluded extensions (without the leading dot, any case).
    pub fn with_excluded_extensions<I, S>(mut self, exts: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.excluded_extensions
            .extend(exts.into_iter().map(|e| e.into().to_ascii_lowercase()));
        self
    }

    /// Add paths that may never be deleted themselves.
    pub fn with_protected<I, P>(mut self, paths: I) -> Self
    where
        I: IntoIterator<Item = P>,
        P: Into<PathBuf>,
    {
        self.protected_exact
            .extend(paths.into_iter().map(Into::into));
        self
    }

    /// Whether a directory name is in the fold set.
    pub fn is_fold(&self, name: &OsStr) -> bool {
        name.to_str().is_some_and(|n| self.fold_names.contains(n))
    }

    /// Whether a path is, or lies under, a skipped location.
    pub fn is_skipped(&self, path: &Path) -> bool {
        self.skip_paths.iter().any(|skip| path.starts_with(skip))
    }

    /// Whether a file's extension excludes it from the spotlight.
    pub fn is_excluded_extension(&self, path: &Path) -> bool {
        path.extension()
            .and_then(OsStr::to_str)
            .is_some_and(|ext| {
                self.excluded_extensions
                    .contains(&ext.to_ascii_lowercase())
            })
    }

    /// Whether a path must never be deleted.
    ///
    /// This is the only predicate shared with external cleanup tooling.
    pub fn is_protected(&self, path: &Path) -> bool {
        self.protected_exact.contains(path)
            || self.protected_trees.iter().any(|tree| path.starts_with(tree))
    }
}

impl Default for PathSets {
    fn default() -> Self {
        Self::curated()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_curated_fold_names() {
        let sets = PathSets::curated();
        assert!(sets.is_fold(OsStr::new("node_modules")));
        assert!(sets.is_fold(OsStr::new(".git")));
        assert!(!sets.is_fold(OsStr::new("src")));
    }

    #[test]
    fn test_skip_matches_subtree() {
        let sets = PathSets::curated();
        assert!(sets.is_skipped(Path::new("/proc")));
        assert!(sets.is_skipped(Path::new("/proc/1/fd")));
        // Component-wise, not string prefix
        assert!(!sets.is_skipped(Path::new("/process")));
    }

    #[test]
    fn test_extension_case_insensitive() {
        let sets = PathSets::curated();
        assert!(sets.is_excluded_extension(Path::new("/a/server.LOG")));
        assert!(!sets.is_excluded_extension(Path::new("/a/movie.mkv")));
        assert!(!sets.is_excluded_extension(Path::new("/a/Makefile")));
    }

    #[test]
    fn test_protected() {
        let sets = PathSets::curated();
        assert!(sets.is_protected(Path::new("/")));
        assert!(sets.is_protected(Path::new("/usr/bin/ls")));
        assert!(sets.is_protected(Path::new("/usr")));
        assert!(!sets.is_protected(Path::new("/usr/local/share/junk")));
        if let Some(home) = dirs::home_dir() {
            assert!(sets.is_protected(&home));
            assert!(!sets.is_protected(&home.join("Downloads/big.iso")));
        }
    }

    #[test]
    fn test_custom_sets() {
        let sets = PathSets::empty()
            .with_fold_names(["vendor"])
            .with_protected(["/data/keep"]);
        assert!(sets.is_fold(OsStr::new("vendor")));
        assert!(!sets.is_fold(OsStr::new("node_modules")));
        assert!(sets.is_protected(Path::new("/data/keep")));
        assert!(!sets.is_protected(Path::new("/data/keep/file")));
    }
}
