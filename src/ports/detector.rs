//! Anomaly detector port.
//!
//! The application service and the HTTP adapter only depend on this trait,
//! not on the concrete scoring engine.

use crate::domain::{AnomalyScore, Reading, ScoreBatch, ScoreExplanation};

/// Something that turns vital-sign readings into anomaly scores.
///
/// Implementations must be deterministic and side-effect free: the same
/// reading always produces the same score, and scoring never fails.
pub trait AnomalyDetector: Send + Sync {
    /// Score a single reading.
    fn score_one(&self, reading: &Reading) -> AnomalyScore;

    /// Score a batch of readings. Output order matches input order.
    fn score_batch(&self, readings: &[Reading]) -> ScoreBatch {
        readings.iter().map(|r| self.score_one(r)).collect()
    }

    /// Score a reading and report how each metric contributed.
    fn explain(&self, reading: &Reading) -> ScoreExplanation;

    /// Score above which a reading is flagged.
    fn threshold(&self) -> f64;
}
