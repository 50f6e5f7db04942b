//! Domain layer: vital-sign metrics, readings, scores and configuration.
//!
//! Pure types with no I/O. Everything here is serializable and
//! validated on construction where validation is needed.

pub mod config;
mod metric;
mod reading;
mod score;

pub use config::{ConfigError, ScorerConfig, DEFAULT_THRESHOLD};
pub use metric::{Metric, MetricRange, UnknownMetric};
pub use reading::Reading;
pub use score::{AnomalyScore, MetricContribution, ScoreBatch, ScoreExplanation};
