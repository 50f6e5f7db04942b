//! Application layer: the scoring engine and the use cases around it.
//!
//! This module orchestrates domain logic with ports to implement
//! anomaly scoring for submitted readings.

mod request;
mod scorer;
mod service;

pub use request::{parse_readings, ScoreRequest};
pub use scorer::AnomalyScorer;
pub use service::ScoringService;
