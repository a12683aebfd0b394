//! Core types and configuration for burrow.
//!
//! This crate holds the data model shared by the scanner, the deletion
//! engine and the terminal UI: listing entries and their size states,
//! large-file results, the immutable lookup sets that drive fold/skip/protect
//! decisions, and the configuration structs for each component.

mod config;
mod entry;
mod error;
mod sets;

pub use config::{CacheConfig, ScanConfig, ScanConfigBuilder, SpotlightConfig};
pub use entry::{
    Entry, EntrySize, LargeFileEntry, OverviewEntry, largest_size, sort_entries, total_size,
};
pub use error::{DeleteError, ProbeError, ScanError};
pub use sets::PathSets;
