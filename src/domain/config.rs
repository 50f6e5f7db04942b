//! Scorer configuration: reference ranges, weights and threshold.
//!
//! A [`ScorerConfig`] can only be obtained through validation, so a scorer
//! holding one never has to check its configuration again.

use std::collections::BTreeMap;
use std::path::PathBuf;

use super::metric::{Metric, MetricRange, UnknownMetric};

/// Default anomaly threshold applied to the final score.
pub const DEFAULT_THRESHOLD: f64 = 2.5;

/// Clinically normal bands the weighted score is computed against.
pub const REFERENCE_RANGES: [(Metric, MetricRange); 6] = [
    (Metric::HeartRate, MetricRange::new(60.0, 100.0)),
    (Metric::Systolic, MetricRange::new(90.0, 140.0)),
    (Metric::Diastolic, MetricRange::new(60.0, 90.0)),
    (Metric::OxygenLevel, MetricRange::new(95.0, 100.0)),
    (Metric::Temperature, MetricRange::new(36.1, 37.2)),
    (Metric::StressLevel, MetricRange::new(1.0, 5.0)),
];

/// Per-metric weights. They need not sum to 1.
pub const REFERENCE_WEIGHTS: [(Metric, f64); 6] = [
    (Metric::HeartRate, 0.2),
    (Metric::Systolic, 0.15),
    (Metric::Diastolic, 0.15),
    (Metric::OxygenLevel, 0.2),
    (Metric::Temperature, 0.15),
    (Metric::StressLevel, 0.15),
];

/// Errors raised while building or loading a scorer configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Metric '{0}' has a weight but no reference range")]
    MissingRange(Metric),

    #[error(transparent)]
    UnknownMetric(#[from] UnknownMetric),

    #[error(
        "Weight for '{metric}' must be finite and non-negative; \
         this scorer does not accept negative weights (got {value})"
    )]
    InvalidWeight { metric: Metric, value: f64 },

    #[error("Range for '{metric}' must have finite bounds (got {min}..{max})")]
    InvalidRange { metric: Metric, min: f64, max: f64 },

    #[error("Anomaly threshold must be a finite number (got {0})")]
    InvalidThreshold(f64),

    #[error("Invalid value for {var}: '{value}'")]
    InvalidEnv { var: &'static str, value: String },

    #[error("Failed to read scorer config {path:?}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse scorer config: {0}")]
    Parse(#[from] serde_json::Error),
}

/// Validated, immutable scorer configuration.
#[derive(Debug, Clone, PartialEq)]
pub struct ScorerConfig {
    ranges: BTreeMap<Metric, MetricRange>,
    weights: BTreeMap<Metric, f64>,
    threshold: f64,
}

impl ScorerConfig {
    /// Build a configuration, failing fast on anything the scorer could not use.
    ///
    /// Ranges without a weight are allowed (they simply never contribute).
    /// Degenerate ranges (`max <= min`) are accepted and logged.
    ///
    /// # Errors
    /// - [`ConfigError::MissingRange`] if a weighted metric has no range
    /// - [`ConfigError::InvalidWeight`] for NaN, infinite or negative weights
    /// - [`ConfigError::InvalidRange`] for non-finite bounds
    /// - [`ConfigError::InvalidThreshold`] for a non-finite threshold
    pub fn new(
        ranges: BTreeMap<Metric, MetricRange>,
        weights: BTreeMap<Metric, f64>,
        threshold: f64,
    ) -> Result<Self, ConfigError> {
        if !threshold.is_finite() {
            return Err(ConfigError::InvalidThreshold(threshold));
        }

        for (&metric, range) in &ranges {
            if !range.min.is_finite() || !range.max.is_finite() {
                return Err(ConfigError::InvalidRange {
                    metric,
                    min: range.min,
                    max: range.max,
                });
            }
        }

        for (&metric, &weight) in &weights {
            if !weight.is_finite() || weight < 0.0 {
                return Err(ConfigError::InvalidWeight { metric, value: weight });
            }
            let range = ranges.get(&metric).ok_or(ConfigError::MissingRange(metric))?;
            if range.is_degenerate() {
                tracing::warn!(
                    metric = %metric,
                    min = range.min,
                    max = range.max,
                    "Degenerate range; metric will always score at its midpoint"
                );
            }
        }

        Ok(Self {
            ranges,
            weights,
            threshold,
        })
    }

    /// The reference ranges, weights and threshold.
    #[must_use]
    pub fn reference() -> Self {
        Self {
            ranges: REFERENCE_RANGES.into_iter().collect(),
            weights: REFERENCE_WEIGHTS.into_iter().collect(),
            threshold: DEFAULT_THRESHOLD,
        }
    }

    /// Same ranges and weights with a different threshold.
    ///
    /// # Errors
    /// Returns [`ConfigError::InvalidThreshold`] if `threshold` is not finite.
    pub fn with_threshold(self, threshold: f64) -> Result<Self, ConfigError> {
        if !threshold.is_finite() {
            return Err(ConfigError::InvalidThreshold(threshold));
        }
        Ok(Self { threshold, ..self })
    }

    #[must_use]
    pub fn range(&self, metric: Metric) -> Option<&MetricRange> {
        self.ranges.get(&metric)
    }

    #[must_use]
    pub fn weight(&self, metric: Metric) -> Option<f64> {
        self.weights.get(&metric).copied()
    }

    #[must_use]
    pub fn ranges(&self) -> &BTreeMap<Metric, MetricRange> {
        &self.ranges
    }

    #[must_use]
    pub fn weights(&self) -> &BTreeMap<Metric, f64> {
        &self.weights
    }

    #[must_use]
    pub fn threshold(&self) -> f64 {
        self.threshold
    }
}

impl Default for ScorerConfig {
    fn default() -> Self {
        Self::reference()
    }
}
