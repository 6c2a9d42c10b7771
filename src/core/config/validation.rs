#![allow(clippy::result_large_err)]

use super::LaminateConfig;
use crate::core::error::AppError;
use crate::core::types::ErrorCategory;

/// Reasons a configuration fails validation.
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum ConfigValidationError {
    #[error("pipeline.max_workers must be at least 1")]
    ZeroWorkers,

    #[error("pipeline.batch_size must be at least 1")]
    ZeroBatchSize,

    #[error("pipeline.memory_threshold must be within (0.0, 1.0], got {value}")]
    MemoryThresholdOutOfRange { value: String },

    #[error("cache.capacity must be at least 1")]
    ZeroCacheCapacity,

    #[error("cache.eviction_strategy must be one of staged, size, predictive (got '{value}')")]
    UnknownEvictionStrategy { value: String },
}

pub struct ConfigValidator;

impl ConfigValidator {
    /// Validate configuration rules. Violations surface as InputError since
    /// they reject the request before any stage runs.
    pub fn validate(config: &LaminateConfig) -> Result<(), AppError> {
        Self::check(config).map_err(|e| {
            AppError::new(ErrorCategory::InputError, e.to_string()).with_code("LAM-CFG-001")
        })
    }

    fn check(config: &LaminateConfig) -> Result<(), ConfigValidationError> {
        if config.pipeline.max_workers == 0 {
            return Err(ConfigValidationError::ZeroWorkers);
        }

        if config.pipeline.batch_size == 0 {
            return Err(ConfigValidationError::ZeroBatchSize);
        }

        let threshold = config.pipeline.memory_threshold;
        if !(threshold > 0.0 && threshold <= 1.0) {
            return Err(ConfigValidationError::MemoryThresholdOutOfRange {
                value: format!("{threshold}"),
            });
        }

        if config.cache.capacity == 0 {
            return Err(ConfigValidationError::ZeroCacheCapacity);
        }

        match config.cache.eviction_strategy.as_str() {
            "staged" | "size" | "predictive" => {}
            other => {
                return Err(ConfigValidationError::UnknownEvictionStrategy {
                    value: other.to_string(),
                })
            }
        }

        Ok(())
    }
}
