//! # Pulsewatch
//!
//! Anomaly scoring for patient vital-sign readings.
//!
//! This crate provides:
//! - A deterministic, weighted deviation-from-range scorer over heart rate,
//!   blood pressure, oxygen level, temperature and stress level
//! - An HTTP endpoint that validates submitted snapshots and scores them
//! - Log sanitization so user identifiers never reach log sinks in clear
//!
//! ## Architecture
//!
//! The crate follows Hexagonal Architecture:
//! - `domain`: Core types (Metric, Reading, scores, configuration)
//! - `ports`: Trait definitions at the application boundary
//! - `application`: The scoring engine and request handling use cases
//! - `adapters`: HTTP, configuration loading, log sanitization

pub mod adapters;
pub mod application;
pub mod domain;
pub mod ports;

pub use application::{AnomalyScorer, ScoreRequest, ScoringService};
pub use domain::{AnomalyScore, Metric, MetricRange, Reading, ScoreBatch, ScorerConfig};

/// Result type for Pulsewatch operations
pub type Result<T> = std::result::Result<T, PulsewatchError>;

/// Main error type for Pulsewatch: rejected scoring input.
///
/// Configuration problems have their own [`domain::ConfigError`] and are
/// reported at startup, never per request.
#[derive(Debug, thiserror::Error)]
pub enum PulsewatchError {
    #[error("Missing required parameters")]
    MissingParameters,

    #[error("Invalid request body: {0}")]
    InvalidBody(String),

    #[error("Invalid value for metric '{metric}': {value}")]
    InvalidMetricValue { metric: String, value: String },
}
