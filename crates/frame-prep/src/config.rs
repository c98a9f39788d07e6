//! Configuration types for the preparation pipeline.
//!
//! This module provides configuration options using the builder pattern
//! for flexible and ergonomic pipeline setup.

use serde::{Deserialize, Serialize};

/// Default multiplier applied to the interquartile range.
pub const DEFAULT_IQR_MULTIPLIER: f64 = 1.5;

/// Default absolute z-score above which a value is an outlier.
pub const DEFAULT_ZSCORE_THRESHOLD: f64 = 3.0;

/// Default number of history records kept by the pipeline state.
pub const DEFAULT_HISTORY_LIMIT: usize = 50;

/// Default duration after which an operation is logged as slow.
pub const DEFAULT_SLOW_OPERATION_MS: u64 = 500;

/// Configuration for the preparation pipeline.
///
/// Use [`PipelineConfig::builder()`] to create a new configuration
/// with fluent API.
///
/// # Example
///
/// ```rust,ignore
/// use frame_prep::config::PipelineConfig;
///
/// let config = PipelineConfig::builder()
///     .iqr_multiplier(3.0)
///     .zscore_threshold(2.5)
///     .build()?;
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    /// Multiplier `k` for the IQR fences `[Q1 - k*IQR, Q3 + k*IQR]`.
    /// Default: 1.5
    pub iqr_multiplier: f64,

    /// Absolute z-score above which a value is flagged.
    /// Default: 3.0
    pub zscore_threshold: f64,

    /// Target range used by min-max scaling when the operation does not
    /// specify one.
    /// Default: (0.0, 1.0)
    pub min_max_range: (f64, f64),

    /// Maximum number of operation records kept in the history.
    /// Default: 50
    pub history_limit: usize,

    /// Operations that take longer than this are logged at `warn` level.
    /// Default: 500
    pub slow_operation_ms: u64,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            iqr_multiplier: DEFAULT_IQR_MULTIPLIER,
            zscore_threshold: DEFAULT_ZSCORE_THRESHOLD,
            min_max_range: (0.0, 1.0),
            history_limit: DEFAULT_HISTORY_LIMIT,
            slow_operation_ms: DEFAULT_SLOW_OPERATION_MS,
        }
    }
}

impl PipelineConfig {
    /// Create a new configuration builder.
    pub fn builder() -> PipelineConfigBuilder {
        PipelineConfigBuilder::default()
    }

    /// Validate the configuration and return errors if invalid.
    pub fn validate(&self) -> Result<(), ConfigValidationError> {
        if !self.iqr_multiplier.is_finite() || self.iqr_multiplier <= 0.0 {
            return Err(ConfigValidationError::NonPositive {
                field: "iqr_multiplier".to_string(),
                value: self.iqr_multiplier,
            });
        }

        if !self.zscore_threshold.is_finite() || self.zscore_threshold <= 0.0 {
            return Err(ConfigValidationError::NonPositive {
                field: "zscore_threshold".to_string(),
                value: self.zscore_threshold,
            });
        }

        let (lo, hi) = self.min_max_range;
        if !lo.is_finite() || !hi.is_finite() || lo >= hi {
            return Err(ConfigValidationError::InvalidRange { lo, hi });
        }

        if self.history_limit == 0 {
            return Err(ConfigValidationError::InvalidHistoryLimit(
                self.history_limit,
            ));
        }

        Ok(())
    }
}

/// Errors that can occur during configuration validation.
#[derive(Debug, thiserror::Error)]
pub enum ConfigValidationError {
    #[error("Invalid value for '{field}': {value} (must be a finite number above 0)")]
    NonPositive { field: String, value: f64 },

    #[error("Invalid min-max range ({lo}, {hi}): lower bound must be below upper bound")]
    InvalidRange { lo: f64, hi: f64 },

    #[error("Invalid history limit: {0} (must be at least 1)")]
    InvalidHistoryLimit(usize),
}

/// Builder for [`PipelineConfig`] with fluent API.
#[derive(Debug, Default)]
pub struct PipelineConfigBuilder {
    iqr_multiplier: Option<f64>,
    zscore_threshold: Option<f64>,
    min_max_range: Option<(f64, f64)>,
    history_limit: Option<usize>,
    slow_operation_ms: Option<u64>,
}

impl PipelineConfigBuilder {
    /// Set the IQR fence multiplier.
    pub fn iqr_multiplier(mut self, multiplier: f64) -> Self {
        self.iqr_multiplier = Some(multiplier);
        self
    }

    /// Set the z-score threshold.
    pub fn zscore_threshold(mut self, threshold: f64) -> Self {
        self.zscore_threshold = Some(threshold);
        self
    }

    /// Set the default min-max target range.
    ///
    /// # Arguments
    /// * `lo` - Lower bound of the target range
    /// * `hi` - Upper bound of the target range, strictly above `lo`
    pub fn min_max_range(mut self, lo: f64, hi: f64) -> Self {
        self.min_max_range = Some((lo, hi));
        self
    }

    /// Set how many operation records the history keeps.
    pub fn history_limit(mut self, limit: usize) -> Self {
        self.history_limit = Some(limit);
        self
    }

    /// Set the slow-operation warning threshold in milliseconds.
    pub fn slow_operation_ms(mut self, millis: u64) -> Self {
        self.slow_operation_ms = Some(millis);
        self
    }

    /// Build the configuration.
    ///
    /// Returns a validated `PipelineConfig` or an error if validation fails.
    pub fn build(self) -> Result<PipelineConfig, ConfigValidationError> {
        let defaults = PipelineConfig::default();
        let config = PipelineConfig {
            iqr_multiplier: self.iqr_multiplier.unwrap_or(defaults.iqr_multiplier),
            zscore_threshold: self.zscore_threshold.unwrap_or(defaults.zscore_threshold),
            min_max_range: self.min_max_range.unwrap_or(defaults.min_max_range),
            history_limit: self.history_limit.unwrap_or(defaults.history_limit),
            slow_operation_ms: self.slow_operation_ms.unwrap_or(defaults.slow_operation_ms),
        };

        config.validate()?;
        Ok(config)
    }
}
