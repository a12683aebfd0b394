//! Directory sizing engine for burrow.
//!
//! # Overview
//!
//! `burrow-scan` computes sizes for the direct children of one directory at
//! a time, and keeps everything else the explorer needs around that:
//!
//! - **Two-pool traversal** via rayon: a small pool bounds how many children
//!   are sized at once, a larger pool walks their subtrees
//! - **Live progress** through shared atomic counters and per-child partial
//!   size cells, sampled by the UI on its own schedule
//! - **Fold directories** charged with a single size probe, never enumerated
//! - **Large-file spotlight** on its own jwalk pool
//! - **Overview cache** of coarse root sizes with TTL and mtime staleness
//!
//! # Example
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use burrow_scan::{DirScanner, PathSets, ProgressCounters, ScanConfig, ScanEvent};
//! use tokio_util::sync::CancellationToken;
//!
//! let scanner = DirScanner::new(ScanConfig::default(), Arc::new(PathSets::default()));
//! let counters = ProgressCounters::new();
//! let cancel = CancellationToken::new();
//!
//! let summary = scanner
//!     .scan("/var/tmp".as_ref(), &counters, &cancel, &|event| {
//!         if let ScanEvent::Sized { path, size } = event {
//!             println!("{}: {} bytes", path.display(), size.bytes());
//!         }
//!     })
//!     .unwrap();
//!
//! println!("Total: {} bytes", summary.total);
//! ```

mod cache;
mod overview;
mod probe;
mod progress;
mod scanner;
mod spotlight;

pub use cache::{CacheRecord, SizeCache};
pub use overview::{OverviewPlan, OverviewRoot, default_roots, plan_overview, roots_from_paths};
pub use probe::{DuProbe, SizeProbe, WalkProbe, default_probe, last_access, parse_mdls_date};
pub use progress::{ProgressCounters, ScanProgress, completion_percent};
pub use scanner::{DirScanner, ScanEvent, ScanSummary};
pub use spotlight::LargeFileScanner;

// Re-export core types for convenience
pub use burrow_core::{
    CacheConfig, Entry, EntrySize, LargeFileEntry, PathSets, ProbeError, ScanConfig, ScanError,
    SpotlightConfig,
};
