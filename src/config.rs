//! Configuration for paired bootstrap runs.
//!
//! Handles YAML configuration loading with validation of the resampling
//! parameters. Command-line flags override values loaded from a file.

use crate::metrics::{MetricError, MetricKind};
use serde::{Deserialize, Serialize};
use std::path::Path;
use thiserror::Error;

/// Errors that can occur during configuration loading or validation
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read configuration file: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Failed to parse YAML configuration: {0}")]
    YamlError(#[from] serde_yaml::Error),

    #[error("Number of bootstrap samples must be at least 1, got {0}")]
    InvalidNumSamples(usize),

    #[error("Sample ratio must be in (0, 1], got {0}")]
    InvalidSampleRatio(f64),

    #[error("Sample ratio {sample_ratio} of {n} examples selects no examples")]
    EmptySample { n: usize, sample_ratio: f64 },

    #[error(transparent)]
    UnsupportedMetric(#[from] MetricError),
}

/// Paired bootstrap configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct BootstrapConfig {
    /// Number of resampling rounds
    #[serde(default = "default_num_samples")]
    pub num_samples: usize,
    /// Fraction of examples drawn into each round
    #[serde(default = "default_sample_ratio")]
    pub sample_ratio: f64,
    /// Metric used to score both systems
    #[serde(default)]
    pub metric: MetricKind,
    /// Random seed for reproducibility
    #[serde(default = "default_seed")]
    pub seed: u64,
}

/// On-disk form of [`BootstrapConfig`], with the metric left as a raw
/// selector so an unknown name reports as `UnsupportedMetric`
#[derive(Debug, Deserialize)]
struct BootstrapConfigFile {
    #[serde(default = "default_num_samples")]
    num_samples: usize,
    #[serde(default = "default_sample_ratio")]
    sample_ratio: f64,
    #[serde(default)]
    metric: Option<String>,
    #[serde(default = "default_seed")]
    seed: u64,
}

const fn default_num_samples() -> usize {
    1000
}
const fn default_sample_ratio() -> f64 {
    0.5
}
const fn default_seed() -> u64 {
    42
}

impl Default for BootstrapConfig {
    fn default() -> Self {
        Self {
            num_samples: default_num_samples(),
            sample_ratio: default_sample_ratio(),
            metric: MetricKind::default(),
            seed: default_seed(),
        }
    }
}

impl BootstrapConfig {
    /// Load and validate configuration from a YAML file
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read, parsed or validated.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        Self::from_yaml(&content)
    }

    /// Load and validate configuration from a YAML string
    ///
    /// # Errors
    ///
    /// Returns an error if the YAML cannot be parsed or fails validation.
    pub fn from_yaml(yaml: &str) -> Result<Self, ConfigError> {
        let file: BootstrapConfigFile = serde_yaml::from_str(yaml)?;
        let metric = match file.metric {
            Some(name) => name.parse::<MetricKind>()?,
            None => MetricKind::default(),
        };
        let config = Self {
            num_samples: file.num_samples,
            sample_ratio: file.sample_ratio,
            metric,
            seed: file.seed,
        };
        config.validate()?;
        Ok(config)
    }

    /// Set the number of resampling rounds
    #[must_use]
    pub const fn with_num_samples(mut self, num_samples: usize) -> Self {
        self.num_samples = num_samples;
        self
    }

    /// Set the per-round sample ratio
    #[must_use]
    pub const fn with_sample_ratio(mut self, sample_ratio: f64) -> Self {
        self.sample_ratio = sample_ratio;
        self
    }

    /// Set the metric
    #[must_use]
    pub const fn with_metric(mut self, metric: MetricKind) -> Self {
        self.metric = metric;
        self
    }

    /// Set the random seed
    #[must_use]
    pub const fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    /// Check the round count and sample ratio
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::InvalidNumSamples` for zero rounds and
    /// `ConfigError::InvalidSampleRatio` for a ratio outside `(0, 1]`.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.num_samples == 0 {
            return Err(ConfigError::InvalidNumSamples(self.num_samples));
        }
        // Written this way round so NaN is rejected too
        if !(self.sample_ratio > 0.0 && self.sample_ratio <= 1.0) {
            return Err(ConfigError::InvalidSampleRatio(self.sample_ratio));
        }
        Ok(())
    }

    /// Number of examples drawn per round out of `n`
    #[must_use]
    #[allow(
        clippy::cast_possible_truncation,
        clippy::cast_sign_loss,
        clippy::cast_precision_loss
    )]
    pub fn sample_size(&self, n: usize) -> usize {
        ((n as f64 * self.sample_ratio).floor() as usize).min(n)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_bootstrap_config_default_values() {
        let config = BootstrapConfig::default();
        assert_eq!(config.num_samples, 1000);
        assert!((config.sample_ratio - 0.5).abs() < f64::EPSILON);
        assert_eq!(config.metric, MetricKind::Bleu);
        assert_eq!(config.seed, 42);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_bootstrap_config_from_yaml() {
        let yaml = r"
num_samples: 200
sample_ratio: 0.8
metric: acc
seed: 7
";
        let config = BootstrapConfig::from_yaml(yaml).expect("parse yaml");
        assert_eq!(config.num_samples, 200);
        assert!((config.sample_ratio - 0.8).abs() < f64::EPSILON);
        assert_eq!(config.metric, MetricKind::Accuracy);
        assert_eq!(config.seed, 7);
    }

    #[test]
    fn test_bootstrap_config_minimal_yaml_uses_defaults() {
        let config = BootstrapConfig::from_yaml("metric: bleu").expect("parse yaml");
        assert_eq!(config, BootstrapConfig::default());
    }

    #[test]
    fn test_bootstrap_config_unknown_metric() {
        let result = BootstrapConfig::from_yaml("metric: meteor");
        assert!(matches!(
            result,
            Err(ConfigError::UnsupportedMetric(MetricError::Unsupported(ref name))) if name == "meteor"
        ));
    }

    #[test]
    fn test_bootstrap_config_metric_is_case_insensitive() {
        let config = BootstrapConfig::from_yaml("metric: ACC").expect("parse yaml");
        assert_eq!(config.metric, MetricKind::Accuracy);
        let config = BootstrapConfig::from_yaml("metric: Bleu").expect("parse yaml");
        assert_eq!(config.metric, MetricKind::Bleu);
    }

    #[test]
    fn test_bootstrap_config_empty_yaml_uses_defaults() {
        let config = BootstrapConfig::from_yaml("{}").expect("parse yaml");
        assert_eq!(config, BootstrapConfig::default());
    }

    #[test]
    fn test_bootstrap_config_yaml_rejects_bad_ratio() {
        let result = BootstrapConfig::from_yaml("sample_ratio: 1.5");
        assert!(matches!(result, Err(ConfigError::InvalidSampleRatio(_))));
    }

    #[test]
    fn test_validate_zero_rounds() {
        let config = BootstrapConfig::default().with_num_samples(0);
        assert!(matches!(
            config.validate(),
            Err(ConfigError::InvalidNumSamples(0))
        ));
    }

    #[test]
    fn test_validate_sample_ratio_bounds() {
        for ratio in [0.0, -0.1, 1.000_001, f64::NAN, f64::INFINITY] {
            let config = BootstrapConfig::default().with_sample_ratio(ratio);
            assert!(
                matches!(config.validate(), Err(ConfigError::InvalidSampleRatio(_))),
                "ratio {ratio} should be rejected"
            );
        }
        assert!(BootstrapConfig::default()
            .with_sample_ratio(1.0)
            .validate()
            .is_ok());
    }

    #[test]
    fn test_sample_size_floors() {
        let config = BootstrapConfig::default().with_sample_ratio(0.5);
        assert_eq!(config.sample_size(5), 2);
        assert_eq!(config.sample_size(1), 0);
        let config = config.with_sample_ratio(1.0);
        assert_eq!(config.sample_size(4), 4);
    }

    #[test]
    fn test_load_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("bootstrap.yaml");
        std::fs::write(&path, "num_samples: 10\nmetric: accuracy\n").unwrap();

        let config = BootstrapConfig::load(&path).unwrap();
        assert_eq!(config.num_samples, 10);
        assert_eq!(config.metric, MetricKind::Accuracy);
    }

    #[test]
    fn test_load_missing_file() {
        let result = BootstrapConfig::load("/nonexistent/bootstrap.yaml");
        assert!(matches!(result, Err(ConfigError::IoError(_))));
    }

    #[test]
    fn test_config_error_display() {
        let err = ConfigError::EmptySample {
            n: 3,
            sample_ratio: 0.1,
        };
        let msg = err.to_string();
        assert!(msg.contains("0.1"));
        assert!(msg.contains('3'));
    }
}
