//! Configuration for the table profiler.
//!
//! All knobs have defaults matching the behavior the chat backend relies on;
//! use [`ProfilerConfig::builder()`] to override individual values.

use serde::{Deserialize, Serialize};

/// Configuration for [`TableProfiler`](crate::profiler::TableProfiler).
///
/// # Example
///
/// ```rust,ignore
/// use insight_profiler::ProfilerConfig;
///
/// let config = ProfilerConfig::builder()
///     .sample_seed(7)
///     .histogram_bins(20)
///     .build()?;
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProfilerConfig {
    /// Seed for the representative row sample.
    /// Default: 42
    pub sample_seed: u64,

    /// Fraction of rows drawn into the representative sample.
    /// Default: 0.05
    pub sample_fraction: f64,

    /// Upper bound on representative sample rows.
    /// Default: 50
    pub max_sample_rows: usize,

    /// Tables with at most this many rows are sampled in full.
    /// Default: 10
    pub full_sample_max_rows: usize,

    /// Upper bound on head sample rows.
    /// Default: 5
    pub head_sample_max_rows: usize,

    /// Number of non-null values kept in `sample_values`.
    /// Default: 5
    pub sample_values_limit: usize,

    /// Maximum distinct values for a column to count as categorical.
    /// Default: 20
    pub categorical_threshold: usize,

    /// Maximum number of category entries reported.
    /// Default: 20
    pub category_limit: usize,

    /// Number of equal-width histogram bins.
    /// Default: 10
    pub histogram_bins: usize,

    /// Share of non-null cells that must parse as dates, exclusive.
    /// Default: 0.5
    pub datetime_threshold: f64,

    /// Whether to compute the numeric correlation matrix.
    /// Default: true
    pub compute_correlations: bool,
}

impl Default for ProfilerConfig {
    fn default() -> Self {
        Self {
            sample_seed: 42,
            sample_fraction: 0.05,
            max_sample_rows: 50,
            full_sample_max_rows: 10,
            head_sample_max_rows: 5,
            sample_values_limit: 5,
            categorical_threshold: 20,
            category_limit: 20,
            histogram_bins: 10,
            datetime_threshold: 0.5,
            compute_correlations: true,
        }
    }
}

impl ProfilerConfig {
    /// Create a new configuration builder.
    pub fn builder() -> ProfilerConfigBuilder {
        ProfilerConfigBuilder::default()
    }

    /// Validate the configuration and return errors if invalid.
    pub fn validate(&self) -> Result<(), ConfigValidationError> {
        if !(0.0..=1.0).contains(&self.sample_fraction) {
            return Err(ConfigValidationError::InvalidFraction {
                field: "sample_fraction".to_string(),
                value: self.sample_fraction,
            });
        }

        if !(0.0..1.0).contains(&self.datetime_threshold) {
            return Err(ConfigValidationError::InvalidFraction {
                field: "datetime_threshold".to_string(),
                value: self.datetime_threshold,
            });
        }

        if self.histogram_bins == 0 {
            return Err(ConfigValidationError::ZeroValue("histogram_bins"));
        }

        if self.category_limit == 0 {
            return Err(ConfigValidationError::ZeroValue("category_limit"));
        }

        Ok(())
    }
}

/// Errors that can occur during configuration validation.
#[derive(Debug, thiserror::Error)]
pub enum ConfigValidationError {
    #[error("Invalid fraction for '{field}': {value} (must be between 0.0 and 1.0)")]
    InvalidFraction { field: String, value: f64 },

    #[error("'{0}' must be at least 1")]
    ZeroValue(&'static str),
}

/// Builder for [`ProfilerConfig`] with fluent API.
#[derive(Debug, Default)]
pub struct ProfilerConfigBuilder {
    sample_seed: Option<u64>,
    sample_fraction: Option<f64>,
    max_sample_rows: Option<usize>,
    full_sample_max_rows: Option<usize>,
    head_sample_max_rows: Option<usize>,
    sample_values_limit: Option<usize>,
    categorical_threshold: Option<usize>,
    category_limit: Option<usize>,
    histogram_bins: Option<usize>,
    datetime_threshold: Option<f64>,
    compute_correlations: Option<bool>,
}

impl ProfilerConfigBuilder {
    /// Set the seed used for the representative sample.
    pub fn sample_seed(mut self, seed: u64) -> Self {
        self.sample_seed = Some(seed);
        self
    }

    /// Set the fraction of rows in the representative sample.
    ///
    /// # Arguments
    /// * `fraction` - Value between 0.0 and 1.0 (e.g., 0.05 = 5%)
    pub fn sample_fraction(mut self, fraction: f64) -> Self {
        self.sample_fraction = Some(fraction);
        self
    }

    /// Cap the representative sample size.
    pub fn max_sample_rows(mut self, rows: usize) -> Self {
        self.max_sample_rows = Some(rows);
        self
    }

    /// Tables with at most `rows` rows are returned whole as the sample.
    pub fn full_sample_max_rows(mut self, rows: usize) -> Self {
        self.full_sample_max_rows = Some(rows);
        self
    }

    /// Cap the head sample size.
    pub fn head_sample_max_rows(mut self, rows: usize) -> Self {
        self.head_sample_max_rows = Some(rows);
        self
    }

    /// Number of non-null values kept per column in `sample_values`.
    pub fn sample_values_limit(mut self, limit: usize) -> Self {
        self.sample_values_limit = Some(limit);
        self
    }

    /// Distinct-value ceiling for categorical columns.
    pub fn categorical_threshold(mut self, threshold: usize) -> Self {
        self.categorical_threshold = Some(threshold);
        self
    }

    /// Maximum number of reported categories.
    pub fn category_limit(mut self, limit: usize) -> Self {
        self.category_limit = Some(limit);
        self
    }

    /// Number of histogram bins.
    pub fn histogram_bins(mut self, bins: usize) -> Self {
        self.histogram_bins = Some(bins);
        self
    }

    /// Share of parseable dates a column must exceed to count as datetime.
    pub fn datetime_threshold(mut self, threshold: f64) -> Self {
        self.datetime_threshold = Some(threshold);
        self
    }

    /// Enable or disable the correlation matrix.
    pub fn compute_correlations(mut self, enable: bool) -> Self {
        self.compute_correlations = Some(enable);
        self
    }

    /// Build the configuration.
    ///
    /// Returns a validated `ProfilerConfig` or an error if validation fails.
    pub fn build(self) -> Result<ProfilerConfig, ConfigValidationError> {
        let defaults = ProfilerConfig::default();
        let config = ProfilerConfig {
            sample_seed: self.sample_seed.unwrap_or(defaults.sample_seed),
            sample_fraction: self.sample_fraction.unwrap_or(defaults.sample_fraction),
            max_sample_rows: self.max_sample_rows.unwrap_or(defaults.max_sample_rows),
            full_sample_max_rows: self
                .full_sample_max_rows
                .unwrap_or(defaults.full_sample_max_rows),
            head_sample_max_rows: self
                .head_sample_max_rows
                .unwrap_or(defaults.head_sample_max_rows),
            sample_values_limit: self
                .sample_values_limit
                .unwrap_or(defaults.sample_values_limit),
            categorical_threshold: self
                .categorical_threshold
                .unwrap_or(defaults.categorical_threshold),
            category_limit: self.category_limit.unwrap_or(defaults.category_limit),
            histogram_bins: self.histogram_bins.unwrap_or(defaults.histogram_bins),
            datetime_threshold: self
                .datetime_threshold
                .unwrap_or(defaults.datetime_threshold),
            compute_correlations: self
                .compute_correlations
                .unwrap_or(defaults.compute_correlations),
        };

        config.validate()?;
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = ProfilerConfig::default();
        assert_eq!(config.sample_seed, 42);
        assert_eq!(config.max_sample_rows, 50);
        assert_eq!(config.category_limit, 20);
        assert_eq!(config.histogram_bins, 10);
        assert!(config.compute_correlations);
    }

    #[test]
    fn test_builder_defaults() {
        let config = ProfilerConfig::builder().build().unwrap();
        assert_eq!(config, ProfilerConfig::default());
    }

    #[test]
    fn test_builder_custom_values() {
        let config = ProfilerConfig::builder()
            .sample_seed(7)
            .histogram_bins(4)
            .category_limit(5)
            .compute_correlations(false)
            .build()
            .unwrap();

        assert_eq!(config.sample_seed, 7);
        assert_eq!(config.histogram_bins, 4);
        assert_eq!(config.category_limit, 5);
        assert!(!config.compute_correlations);
    }

    #[test]
    fn test_validation_invalid_fraction() {
        let result = ProfilerConfig::builder().sample_fraction(1.5).build();
        assert!(matches!(
            result.unwrap_err(),
            ConfigValidationError::InvalidFraction { .. }
        ));
    }

    #[test]
    fn test_validation_zero_bins() {
        let result = ProfilerConfig::builder().histogram_bins(0).build();
        assert!(matches!(
            result.unwrap_err(),
            ConfigValidationError::ZeroValue("histogram_bins")
        ));
    }

    #[test]
    fn test_config_from_partial_json() {
        let json = r#"{ "sample_seed": 1234, "category_limit": 5 }"#;
        let config: ProfilerConfig = serde_json::from_str(json).unwrap();

        assert_eq!(config.sample_seed, 1234);
        assert_eq!(config.category_limit, 5);
        assert_eq!(config.histogram_bins, 10);
    }
}
