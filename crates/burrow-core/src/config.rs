//! Scanner, spotlight and cache configuration.

use std::time::Duration;

use derive_builder::Builder;
use serde::{Deserialize, Serialize};

/// Configuration for the directory scanner and its worker pools.
#[derive(Debug, Clone, Builder, Serialize, Deserialize)]
#[builder(setter(into), build_fn(validate = "Self::validate"))]
pub struct ScanConfig {
    /// Traversal threads per CPU.
    #[builder(default = "4")]
    #[serde(default = "default_worker_multiplier")]
    pub worker_multiplier: usize,

    /// Lower bound for the traversal pool.
    #[builder(default = "8")]
    #[serde(default = "default_min_workers")]
    pub min_workers: usize,

    /// Upper bound for the traversal pool.
    #[builder(default = "48")]
    #[serde(default = "default_max_workers")]
    pub max_workers: usize,

    /// Cap on how many direct children are sized at once.
    #[builder(default = "8")]
    #[serde(default = "default_max_entry_workers")]
    pub max_entry_workers: usize,

    /// Timeout for one subtree size probe, in seconds.
    #[builder(default = "30")]
    #[serde(default = "default_probe_timeout")]
    pub probe_timeout_secs: u64,

    /// Timeout for one metadata lookup, in seconds.
    #[builder(default = "2")]
    #[serde(default = "default_metadata_timeout")]
    pub metadata_timeout_secs: u64,

    /// Follow symbolic links. Symlinks are charged their own size otherwise.
    #[builder(default = "false")]
    #[serde(default)]
    pub follow_symlinks: bool,
}

fn default_worker_multiplier() -> usize {
    4
}

fn default_min_workers() -> usize {
    8
}

fn default_max_workers() -> usize {
    48
}

fn default_max_entry_workers() -> usize {
    8
}

fn default_probe_timeout() -> u64 {
    30
}

fn default_metadata_timeout() -> u64 {
    2
}

impl ScanConfigBuilder {
    fn validate(&self) -> Result<(), String> {
        let min = self.min_workers.unwrap_or(8);
        let max = self.max_workers.unwrap_or(48);
        if min == 0 {
            return Err("min_workers must be at least 1".to_string());
        }
        if min > max {
            return Err(format!("min_workers ({min}) exceeds max_workers ({max})"));
        }
        if self.worker_multiplier == Some(0) {
            return Err("worker_multiplier must be at least 1".to_string());
        }
        if self.max_entry_workers == Some(0) {
            return Err("max_entry_workers must be at least 1".to_string());
        }
        if self.probe_timeout_secs == Some(0) {
            return Err("probe_timeout_secs must be at least 1".to_string());
        }
        Ok(())
    }
}

impl ScanConfig {
    /// Create a new scan config builder.
    pub fn builder() -> ScanConfigBuilder {
        ScanConfigBuilder::default()
    }

    /// Traversal pool size for a machine with `cpus` CPUs.
    pub fn worker_count_for(&self, cpus: usize) -> usize {
        let max = self.max_workers.max(self.min_workers);
        cpus.saturating_mul(self.worker_multiplier)
            .clamp(self.min_workers, max)
    }

    /// Entry pool size for a machine with `cpus` CPUs.
    pub fn entry_worker_count_for(&self, cpus: usize) -> usize {
        self.worker_count_for(cpus).min(self.max_entry_workers).max(1)
    }

    /// Traversal pool size for this machine.
    pub fn worker_count(&self) -> usize {
        self.worker_count_for(num_cpus::get())
    }

    /// Entry pool size for this machine.
    pub fn entry_worker_count(&self) -> usize {
        self.entry_worker_count_for(num_cpus::get())
    }

    pub fn probe_timeout(&self) -> Duration {
        Duration::from_secs(self.probe_timeout_secs)
    }

    pub fn metadata_timeout(&self) -> Duration {
        Duration::from_secs(self.metadata_timeout_secs)
    }
}

impl Default for ScanConfig {
    fn default() -> Self {
        Self {
            worker_multiplier: default_worker_multiplier(),
            min_workers: default_min_workers(),
            max_workers: default_max_workers(),
            max_entry_workers: default_max_entry_workers(),
            probe_timeout_secs: default_probe_timeout(),
            metadata_timeout_secs: default_metadata_timeout(),
            follow_symlinks: false,
        }
    }
}

/// Configuration for the large-file spotlight scan.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SpotlightConfig {
    /// Minimum size for a file to be reported.
    #[serde(default = "default_threshold")]
    pub threshold: u64,

    /// Files below this size are dropped while reading directories.
    #[serde(default)]
    pub prefilter: Option<u64>,

    /// Maximum number of results kept.
    #[serde(default = "default_max_count")]
    pub max_count: usize,

    #[serde(default = "default_spotlight_min_workers")]
    pub min_workers: usize,

    #[serde(default = "default_spotlight_max_workers")]
    pub max_workers: usize,
}

fn default_threshold() -> u64 {
    100 * 1000 * 1000
}

fn default_max_count() -> usize {
    50
}

fn default_spotlight_min_workers() -> usize {
    2
}

fn default_spotlight_max_workers() -> usize {
    8
}

impl SpotlightConfig {
    /// Create a config with the given threshold and defaults otherwise.
    pub fn with_threshold(threshold: u64) -> Self {
        Self {
            threshold,
            ..Self::default()
        }
    }

    /// Smallest size a file must have to survive the directory-read callback.
    pub fn effective_prefilter(&self) -> u64 {
        self.prefilter.map_or(self.threshold, |p| p.min(self.threshold))
    }

    /// Walker thread count for a machine with `cpus` CPUs.
    pub fn worker_count_for(&self, cpus: usize) -> usize {
        let max = self.max_workers.max(self.min_workers).max(1);
        cpus.clamp(self.min_workers.max(1), max)
    }

    /// Walker thread count for this machine.
    pub fn worker_count(&self) -> usize {
        self.worker_count_for(num_cpus::get())
    }
}

impl Default for SpotlightConfig {
    fn default() -> Self {
        Self {
            threshold: default_threshold(),
            prefilter: None,
            max_count: default_max_count(),
            min_workers: default_spotlight_min_workers(),
            max_workers: default_spotlight_max_workers(),
        }
    }
}

/// Staleness policy for the overview size cache.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CacheConfig {
    /// Records older than this are stale.
    #[serde(default = "default_ttl_secs")]
    pub ttl_secs: u64,

    /// A root modified later than `computed_at + grace` is stale.
    #[serde(default = "default_grace_secs")]
    pub grace_secs: u64,
}

fn default_ttl_secs() -> u64 {
    7 * 24 * 60 * 60
}

fn default_grace_secs() -> u64 {
    5 * 60
}

impl CacheConfig {
    pub fn ttl(&self) -> Duration {
        Duration::from_secs(self.ttl_secs)
    }

    pub fn grace(&self) -> Duration {
        Duration::from_secs(self.grace_secs)
    }
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            ttl_secs: default_ttl_secs(),
            grace_secs: default_grace_secs(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_builder() {
        let config = ScanConfig::builder()
            .min_workers(2usize)
            .max_workers(4usize)
            .follow_symlinks(true)
            .build()
            .unwrap();

        assert_eq!(config.min_workers, 2);
        assert_eq!(config.max_workers, 4);
        assert_eq!(config.worker_multiplier, 4);
        assert!(config.follow_symlinks);
    }

    #[test]
    fn test_builder_rejects_inverted_bounds() {
        let result = ScanConfig::builder()
            .min_workers(16usize)
            .max_workers(4usize)
            .build();
        assert!(result.is_err());
    }

    #[test]
    fn test_worker_counts() {
        let config = ScanConfig::default();
        // 1 cpu * 4 = 4, raised to the minimum
        assert_eq!(config.worker_count_for(1), 8);
        assert_eq!(config.worker_count_for(4), 16);
        assert_eq!(config.worker_count_for(64), 48);

        assert_eq!(config.entry_worker_count_for(1), 8);
        assert_eq!(config.entry_worker_count_for(64), 8);
    }

    #[test]
    fn test_spotlight_workers() {
        let config = SpotlightConfig::default();
        assert_eq!(config.worker_count_for(1), 2);
        assert_eq!(config.worker_count_for(6), 6);
        assert_eq!(config.worker_count_for(32), 8);
    }

    #[test]
    fn test_prefilter_never_exceeds_threshold() {
        let mut config = SpotlightConfig::with_threshold(1000);
        assert_eq!(config.effective_prefilter(), 1000);
        config.prefilter = Some(5000);
        assert_eq!(config.effective_prefilter(), 1000);
        config.prefilter = Some(10);
        assert_eq!(config.effective_prefilter(), 10);
    }

    #[test]
    fn test_cache_defaults() {
        let config = CacheConfig::default();
        assert_eq!(config.ttl(), Duration::from_secs(604_800));
        assert_eq!(config.grace(), Duration::from_secs(300));
    }
}
