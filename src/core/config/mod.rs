use serde::{Deserialize, Serialize};

mod loader;
mod validation;

pub use loader::ConfigLoader;
pub use validation::{ConfigValidationError, ConfigValidator};

/// Main Laminate configuration loaded from laminate.toml
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct LaminateConfig {
    /// Pipeline execution configuration
    #[serde(default)]
    pub pipeline: PipelineSection,

    /// Cache configuration
    #[serde(default)]
    pub cache: CacheSection,

    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingSection,
}

/// Pipeline execution configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PipelineSection {
    /// Upper bound on worker chunks during parallel processing
    #[serde(default = "default_max_workers")]
    pub max_workers: usize,

    /// Minimum file count before parallel mode is considered
    #[serde(default = "default_parallel_threshold")]
    pub parallel_threshold: usize,

    /// File count per batch in memory-aware batch mode
    #[serde(default = "default_batch_size")]
    pub batch_size: usize,

    /// Fraction of host memory above which batches throttle (0.0..=1.0)
    #[serde(default = "default_memory_threshold")]
    pub memory_threshold: f64,

    /// Wall-clock budget per worker chunk, in seconds
    #[serde(default = "default_worker_timeout")]
    pub worker_timeout_seconds: u64,
}

/// Cache configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheSection {
    /// Maximum entry count before eviction triggers
    #[serde(default = "default_cache_capacity")]
    pub capacity: usize,

    /// Entry time-to-live in minutes
    #[serde(default = "default_cache_ttl_minutes")]
    pub ttl_minutes: i64,

    /// Eviction strategy: "staged", "size", or "predictive"
    #[serde(default = "default_eviction_strategy")]
    pub eviction_strategy: String,
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingSection {
    /// Default tracing level when RUST_LOG is unset
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Enable the non-blocking file sink
    #[serde(default)]
    pub enable_file: bool,

    /// Directory for log files when the file sink is enabled
    #[serde(skip_serializing_if = "Option::is_none")]
    pub log_dir: Option<std::path::PathBuf>,
}

impl Default for PipelineSection {
    fn default() -> Self {
        Self {
            max_workers: default_max_workers(),
            parallel_threshold: default_parallel_threshold(),
            batch_size: default_batch_size(),
            memory_threshold: default_memory_threshold(),
            worker_timeout_seconds: default_worker_timeout(),
        }
    }
}

impl Default for CacheSection {
    fn default() -> Self {
        Self {
            capacity: default_cache_capacity(),
            ttl_minutes: default_cache_ttl_minutes(),
            eviction_strategy: default_eviction_strategy(),
        }
    }
}

impl Default for LoggingSection {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            enable_file: false,
            log_dir: None,
        }
    }
}

// Default functions
fn default_max_workers() -> usize {
    4
}

fn default_parallel_threshold() -> usize {
    3
}

fn default_batch_size() -> usize {
    50
}

fn default_memory_threshold() -> f64 {
    0.8
}

fn default_worker_timeout() -> u64 {
    120
}

fn default_cache_capacity() -> usize {
    500
}

fn default_cache_ttl_minutes() -> i64 {
    30
}

fn default_eviction_strategy() -> String {
    "staged".to_string()
}

fn default_log_level() -> String {
    "info".to_string()
}
