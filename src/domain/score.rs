//! Scoring output types.
//!
//! These are stateless values: none of them refer back to the reading
//! they were computed from.

use serde::{Deserialize, Serialize};

use super::metric::Metric;

/// Anomaly score for a single reading.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AnomalyScore {
    /// Weighted, scaled deviation (0 when every metric sits at its midpoint)
    pub score: f64,

    /// `score` strictly exceeds the configured threshold
    pub is_anomaly: bool,
}

impl From<AnomalyScore> for (f64, bool) {
    fn from(s: AnomalyScore) -> Self {
        (s.score, s.is_anomaly)
    }
}

/// Scores for a batch of readings, in input order.
///
/// Serializes as `{"scores": [...], "is_anomaly": [...]}`. Both vectors
/// always have the same length.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ScoreBatch {
    pub scores: Vec<f64>,
    pub is_anomaly: Vec<bool>,
}

impl ScoreBatch {
    #[must_use]
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            scores: Vec::with_capacity(capacity),
            is_anomaly: Vec::with_capacity(capacity),
        }
    }

    pub fn push(&mut self, score: AnomalyScore) {
        self.scores.push(score.score);
        self.is_anomaly.push(score.is_anomaly);
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.scores.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.scores.is_empty()
    }

    /// Number of readings flagged as anomalous.
    #[must_use]
    pub fn anomaly_count(&self) -> usize {
        self.is_anomaly.iter().filter(|&&a| a).count()
    }

    pub fn iter(&self) -> impl Iterator<Item = AnomalyScore> + '_ {
        self.scores
            .iter()
            .zip(&self.is_anomaly)
            .map(|(&score, &is_anomaly)| AnomalyScore { score, is_anomaly })
    }
}

impl FromIterator<AnomalyScore> for ScoreBatch {
    fn from_iter<I: IntoIterator<Item = AnomalyScore>>(iter: I) -> Self {
        let iter = iter.into_iter();
        let mut batch = Self::with_capacity(iter.size_hint().0);
        batch.extend(iter);
        batch
    }
}

impl Extend<AnomalyScore> for ScoreBatch {
    fn extend<I: IntoIterator<Item = AnomalyScore>>(&mut self, iter: I) {
        for score in iter {
            self.push(score);
        }
    }
}

/// How one metric fed into a reading's score.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MetricContribution {
    pub metric: Metric,
    pub value: f64,
    /// Position inside the normal band, clamped to `[0, 1]`
    pub normalized: f64,
    /// Distance from the band midpoint, in `[0, 1]`
    pub deviation: f64,
    pub weight: f64,
}

/// Per-metric breakdown of a reading's score.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoreExplanation {
    #[serde(flatten)]
    pub result: AnomalyScore,

    /// Weighted metrics present in the reading, in canonical metric order
    pub contributions: Vec<MetricContribution>,

    /// Keys that did not contribute (unknown names or unweighted metrics)
    pub ignored: Vec<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_batch_keeps_order() {
        let batch: ScoreBatch = [
            AnomalyScore { score: 0.0, is_anomaly: false },
            AnomalyScore { score: 20.0, is_anomaly: true },
            AnomalyScore { score: 1.0, is_anomaly: false },
        ]
        .into_iter()
        .collect();

        assert_eq!(batch.scores, vec![0.0, 20.0, 1.0]);
        assert_eq!(batch.is_anomaly, vec![false, true, false]);
        assert_eq!(batch.anomaly_count(), 1);
        assert_eq!(batch.iter().nth(1).map(<(f64, bool)>::from), Some((20.0, true)));
    }

    #[test]
    fn test_batch_wire_shape() {
        let mut batch = ScoreBatch::default();
        batch.push(AnomalyScore { score: 5.0, is_anomaly: true });

        let json = serde_json::to_value(&batch).expect("Should serialize");
        assert_eq!(json, serde_json::json!({"scores": [5.0], "is_anomaly": [true]}));
    }

    #[test]
    fn test_explanation_flattens_result() {
        let explanation = ScoreExplanation {
            result: AnomalyScore { score: 0.0, is_anomaly: false },
            contributions: Vec::new(),
            ignored: vec!["steps".to_string()],
        };
        let json = serde_json::to_value(&explanation).expect("Should serialize");
        assert_eq!(json["score"], 0.0);
        assert_eq!(json["is_anomaly"], false);
        assert_eq!(json["ignored"][0], "steps");
    }
}
