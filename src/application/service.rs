//! Scoring service: the use case behind the anomaly endpoint.
//!
//! Wraps a shared detector and records what was scored, without ever
//! logging reading values.

use std::sync::Arc;

use crate::application::ScoreRequest;
use crate::domain::{ScoreBatch, ScoreExplanation};
use crate::ports::AnomalyDetector;

/// Service for scoring submitted vital-sign readings.
pub struct ScoringService<D>
where
    D: AnomalyDetector,
{
    detector: Arc<D>,
}

impl<D> Clone for ScoringService<D>
where
    D: AnomalyDetector,
{
    fn clone(&self) -> Self {
        Self {
            detector: Arc::clone(&self.detector),
        }
    }
}

impl<D> ScoringService<D>
where
    D: AnomalyDetector,
{
    /// Create a new scoring service.
    pub fn new(detector: Arc<D>) -> Self {
        Self { detector }
    }

    #[must_use]
    pub fn detector(&self) -> &D {
        &self.detector
    }

    /// Score every reading in the request, in order.
    pub fn score(&self, request: &ScoreRequest) -> ScoreBatch {
        let batch = self.detector.score_batch(&request.readings);

        tracing::info!(
            user_id = %request.user_id,
            readings = batch.len(),
            anomalies = batch.anomaly_count(),
            "Scored vital-sign readings"
        );

        batch
    }

    /// Score every reading and return the per-metric breakdowns.
    pub fn explain(&self, request: &ScoreRequest) -> Vec<ScoreExplanation> {
        let explanations: Vec<ScoreExplanation> = request
            .readings
            .iter()
            .map(|r| self.detector.explain(r))
            .collect();

        tracing::debug!(
            user_id = %request.user_id,
            readings = explanations.len(),
            "Explained vital-sign readings"
        );

        explanations
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::AnomalyScorer;
    use crate::domain::Reading;

    fn create_test_service() -> ScoringService<AnomalyScorer> {
        ScoringService::new(Arc::new(AnomalyScorer::default()))
    }

    #[test]
    fn test_score_delegates_in_order() {
        let service = create_test_service();
        let request = ScoreRequest::new(
            "u1",
            vec![
                Reading::new().with("heart_rate", 60.0),
                Reading::new().with("heart_rate", 80.0),
            ],
        );

        let batch = service.score(&request);
        assert_eq!(batch.is_anomaly, vec![true, false]);
        assert!((batch.scores[0] - 20.0).abs() < 1e-9);
    }

    #[test]
    fn test_explain_one_per_reading() {
        let service = create_test_service();
        let request = ScoreRequest::new(
            "u1",
            vec![Reading::new().with("systolic", 115.0), Reading::new()],
        );

        let explanations = service.explain(&request);
        assert_eq!(explanations.len(), 2);
        assert_eq!(explanations[0].contributions.len(), 1);
        assert!(explanations[1].contributions.is_empty());
        assert_eq!(explanations[1].result.score, 0.0);
    }

    #[test]
    fn test_clone_shares_detector() {
        let service = create_test_service();
        let clone = service.clone();
        assert!(std::ptr::eq(service.detector(), clone.detector()));
    }
}
