//! Configuration management for qfind.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Main configuration structure for qfind.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Paths to index (roots).
    pub index_roots: Vec<PathBuf>,

    /// Exclusion patterns applied by the walker (spec: out of scope for the
    /// engine itself, but the walker needs somewhere to read them from).
    pub exclusions: Vec<String>,

    /// Soft cap on memory usage in MB. Advisory only; the engine does not
    /// enforce it, it informs Bloom/posting-list sizing decisions made by
    /// callers that build a `Config`.
    pub max_memory_mb: usize,

    /// Engine tuning knobs (spec §4.2, §4.5, §4.6, §5 defaults).
    pub engine: EngineConfig,
}

/// Engine-level tuning knobs, all defaulting to the values spec.md mandates.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Bits in the primary Bloom filter (spec §4.2 default 2^25).
    pub bloom_primary_bits: usize,

    /// Bits in the secondary Bloom filter (spec §4.2 default 2^24).
    pub bloom_secondary_bits: usize,

    /// Number of seeded hash functions per filter (spec §4.2 default 8).
    pub bloom_k_hashes: u32,

    /// Number of pending mutations in either update batch that triggers an
    /// unconditional `commit` (spec §4.5, `LSM_BATCH_SIZE`, default 5000).
    pub lsm_batch_size: usize,

    /// Upper bound on resolver worker threads (spec §4.6, `WORKER_THREADS`,
    /// default 16; actual thread count is `min(hw_threads, worker_threads)`).
    pub worker_threads: usize,

    /// Per-worker result buffer cap (spec §4.6, `RESULTS_PER_THREAD`,
    /// default 512).
    pub results_per_thread: usize,

    /// Minimum score for a candidate to survive ranking (spec §4.6,
    /// `SCORE_THRESHOLD`, default 0.25).
    pub score_threshold: f32,

    /// Deadline between unconditional background commits (spec §5, default
    /// 30s).
    pub commit_interval_secs: u64,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            bloom_primary_bits: 1 << 25,
            bloom_secondary_bits: 1 << 24,
            bloom_k_hashes: 8,
            lsm_batch_size: 5000,
            worker_threads: num_cpus::get().min(16),
            results_per_thread: 512,
            score_threshold: 0.25,
            commit_interval_secs: 30,
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            index_roots: vec![PathBuf::from(
                std::env::var("HOME").unwrap_or_else(|_| "/".to_string()),
            )],
            exclusions: vec![
                "/System".to_string(),
                "/Library".to_string(),
                "/.git".to_string(),
                "/node_modules".to_string(),
                "/target".to_string(),
            ],
            max_memory_mb: 512,
            engine: EngineConfig::default(),
        }
    }
}

impl Config {
    /// Load configuration from a TOML file.
    pub fn load(path: &std::path::Path) -> crate::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let mut config: Self = toml::from_str(&content)
            .map_err(|e| crate::Error::InvalidArgument(format!("invalid config: {e}")))?;

        // Expand tilde (~) and environment variables in paths using shellexpand.
        config.expand_paths();

        Ok(config)
    }

    /// Expand tilde (~) and environment variables in all path fields.
    fn expand_paths(&mut self) {
        self.index_roots = self.index_roots.iter().map(Self::expand_path).collect();
    }

    /// Expand tilde and environment variables in a single path.
    fn expand_path(path: &PathBuf) -> PathBuf {
        let path_str = path.to_string_lossy();

        match shellexpand::full(&path_str) {
            Ok(expanded) => PathBuf::from(expanded.as_ref()),
            Err(_) => path.clone(),
        }
    }

    /// Save configuration to a TOML file.
    pub fn save(&self, path: &std::path::Path) -> crate::Result<()> {
        let content = toml::to_string_pretty(self)
            .map_err(|e| crate::Error::InvalidArgument(format!("invalid config: {e}")))?;
        std::fs::write(path, content)?;
        Ok(())
    }
}
