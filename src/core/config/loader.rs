#![allow(clippy::result_large_err)]

use super::LaminateConfig;
use crate::core::error::AppError;
use crate::core::types::ErrorCategory;
use std::env;
use std::path::Path;

pub struct ConfigLoader;

impl ConfigLoader {
    /// Load config from workspace root (workspace/laminate.toml).
    /// Environment variables override config file values.
    /// Missing file falls back to defaults + env vars.
    pub fn load_from_workspace(workspace_path: &Path) -> Result<LaminateConfig, AppError> {
        let config_path = workspace_path.join("laminate.toml");
        let config_file = Self::load_from_file(&config_path)?;

        let mut config = config_file.unwrap_or_default();
        Self::apply_env_overrides(&mut config);

        Ok(config)
    }

    /// Load config from a specific file path.
    /// Returns Ok(None) if the file doesn't exist.
    pub fn load_from_file(path: &Path) -> Result<Option<LaminateConfig>, AppError> {
        if !path.exists() {
            return Ok(None);
        }

        let content = std::fs::read_to_string(path).map_err(|e| {
            AppError::new(
                ErrorCategory::IoError,
                format!("Failed to read config file {}: {}", path.display(), e),
            )
        })?;

        let config: LaminateConfig = toml::from_str(&content).map_err(|e| {
            AppError::new(
                ErrorCategory::ConfigError,
                format!("Failed to parse config file {}: {}", path.display(), e),
            )
        })?;

        Ok(Some(config))
    }

    /// Environment variables take precedence over config file values.
    fn apply_env_overrides(config: &mut LaminateConfig) {
        if let Ok(value) = env::var("LAMINATE_MAX_WORKERS") {
            if let Ok(parsed) = value.parse() {
                config.pipeline.max_workers = parsed;
            }
        }

        if let Ok(value) = env::var("LAMINATE_BATCH_SIZE") {
            if let Ok(parsed) = value.parse() {
                config.pipeline.batch_size = parsed;
            }
        }

        if let Ok(value) = env::var("LAMINATE_MEMORY_THRESHOLD") {
            if let Ok(parsed) = value.parse() {
                config.pipeline.memory_threshold = parsed;
            }
        }

        if let Ok(value) = env::var("LAMINATE_CACHE_CAPACITY") {
            if let Ok(parsed) = value.parse() {
                config.cache.capacity = parsed;
            }
        }

        if let Ok(value) = env::var("LAMINATE_CACHE_STRATEGY") {
            config.cache.eviction_strategy = value;
        }

        if let Ok(value) = env::var("LAMINATE_LOG_LEVEL") {
            config.logging.level = value;
        }
    }
}
