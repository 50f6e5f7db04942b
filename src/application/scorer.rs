//! Anomaly scorer: weighted deviation-from-range over vital signs.
//!
//! For every weighted metric present in a reading the value is min-max
//! scaled into its normal band (clamped to `[0, 1]`) and turned into a
//! deviation from the band midpoint (`|n - 0.5| * 2`). Deviations are
//! averaged by weight, scaled by 10 and then by 2, and compared against
//! the configured threshold.

use std::collections::BTreeMap;

use crate::domain::{
    AnomalyScore, ConfigError, Metric, MetricContribution, MetricRange, Reading, ScoreBatch,
    ScoreExplanation, ScorerConfig,
};
use crate::ports::AnomalyDetector;

/// Scale applied to the weighted mean deviation.
const RAW_SCALE: f64 = 10.0;

/// Output scaling that makes scores comparable to the threshold.
const OUTPUT_SCALE: f64 = 2.0;

/// Deterministic, stateless anomaly scorer.
///
/// Holds only read-only configuration, so a single instance can be shared
/// across threads without locking.
#[derive(Debug, Clone, Default)]
pub struct AnomalyScorer {
    config: ScorerConfig,
}

impl AnomalyScorer {
    /// Create a scorer from a validated configuration.
    #[must_use]
    pub fn new(config: ScorerConfig) -> Self {
        Self { config }
    }

    /// Validate raw ranges, weights and threshold and build a scorer.
    ///
    /// # Errors
    /// Returns [`ConfigError`] if the configuration is unusable
    /// (see [`ScorerConfig::new`]).
    pub fn from_parts(
        ranges: BTreeMap<Metric, MetricRange>,
        weights: BTreeMap<Metric, f64>,
        threshold: f64,
    ) -> Result<Self, ConfigError> {
        ScorerConfig::new(ranges, weights, threshold).map(Self::new)
    }

    #[must_use]
    pub fn config(&self) -> &ScorerConfig {
        &self.config
    }

    #[must_use]
    pub fn threshold(&self) -> f64 {
        self.config.threshold()
    }

    /// Score one reading.
    ///
    /// Unknown keys are ignored. A reading with no weighted metric scores 0.
    #[must_use]
    pub fn score_one(&self, reading: &Reading) -> AnomalyScore {
        let mut total_score = 0.0;
        let mut total_weight = 0.0;

        for contribution in self.contributions(reading) {
            total_score += contribution.deviation * contribution.weight;
            total_weight += contribution.weight;
        }

        self.finish(total_score, total_weight)
    }

    /// Score readings in order.
    #[must_use]
    pub fn score_batch(&self, readings: &[Reading]) -> ScoreBatch {
        readings.iter().map(|r| self.score_one(r)).collect()
    }

    /// Score one reading and keep the per-metric breakdown.
    #[must_use]
    pub fn explain(&self, reading: &Reading) -> ScoreExplanation {
        let contributions: Vec<MetricContribution> = self.contributions(reading).collect();

        let (total_score, total_weight) = contributions
            .iter()
            .fold((0.0, 0.0), |(s, w), c| (s + c.deviation * c.weight, w + c.weight));

        let ignored = reading
            .iter()
            .map(|(key, _)| key)
            .filter(|key| {
                key.parse::<Metric>()
                    .map_or(true, |m| self.config.weight(m).is_none())
            })
            .map(str::to_string)
            .collect();

        ScoreExplanation {
            result: self.finish(total_score, total_weight),
            contributions,
            ignored,
        }
    }

    /// Weighted metrics present in `reading`, in canonical metric order.
    fn contributions<'a>(
        &'a self,
        reading: &'a Reading,
    ) -> impl Iterator<Item = MetricContribution> + 'a {
        self.config.weights().iter().filter_map(move |(&metric, &weight)| {
            let value = reading.metric(metric)?;
            let range = self.config.range(metric)?;
            Some(MetricContribution {
                metric,
                value,
                normalized: range.normalize(value),
                deviation: range.deviation(value),
                weight,
            })
        })
    }

    fn finish(&self, total_score: f64, total_weight: f64) -> AnomalyScore {
        let raw = if total_weight == 0.0 {
            0.0
        } else {
            (total_score / total_weight) * RAW_SCALE
        };
        let score = raw * OUTPUT_SCALE;

        AnomalyScore {
            score,
            is_anomaly: score > self.config.threshold(),
        }
    }
}

impl AnomalyDetector for AnomalyScorer {
    fn score_one(&self, reading: &Reading) -> AnomalyScore {
        AnomalyScorer::score_one(self, reading)
    }

    fn score_batch(&self, readings: &[Reading]) -> ScoreBatch {
        AnomalyScorer::score_batch(self, readings)
    }

    fn explain(&self, reading: &Reading) -> ScoreExplanation {
        AnomalyScorer::explain(self, reading)
    }

    fn threshold(&self) -> f64 {
        AnomalyScorer::threshold(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::DEFAULT_THRESHOLD;

    const EPS: f64 = 1e-9;

    fn scorer() -> AnomalyScorer {
        AnomalyScorer::default()
    }

    fn single(metric: Metric, value: f64) -> Reading {
        Reading::new().with(metric.as_str(), value)
    }

    #[test]
    fn test_midpoint_scores_zero_for_every_metric() {
        let scorer = scorer();
        for metric in Metric::ALL {
            let mid = scorer.config().range(metric).expect("Reference range").midpoint();
            let result = scorer.score_one(&single(metric, mid));
            assert!(result.score.abs() < EPS, "{metric} midpoint scored {}", result.score);
            assert!(!result.is_anomaly);
        }
    }

    #[test]
    fn test_heart_rate_examples() {
        let scorer = scorer();

        let mid = scorer.score_one(&single(Metric::HeartRate, 80.0));
        assert!(mid.score.abs() < EPS);
        assert!(!mid.is_anomaly);

        let low = scorer.score_one(&single(Metric::HeartRate, 60.0));
        assert!((low.score - 20.0).abs() < EPS);
        assert!(low.is_anomaly);
    }

    #[test]
    fn test_boundary_saturates() {
        let scorer = scorer();
        for metric in Metric::ALL {
            let range = *scorer.config().range(metric).expect("Reference range");
            let at_min = scorer.score_one(&single(metric, range.min)).score;
            let far_below = scorer.score_one(&single(metric, range.min - 1000.0)).score;
            let at_max = scorer.score_one(&single(metric, range.max)).score;
            let far_above = scorer.score_one(&single(metric, range.max + 1000.0)).score;

            assert!((at_min - 20.0).abs() < EPS, "{metric}");
            assert_eq!(at_min, far_below);
            assert!((at_max - 20.0).abs() < EPS, "{metric}");
            assert_eq!(at_max, far_above);
        }
    }

    #[test]
    fn test_two_metrics_at_midpoint() {
        let reading = Reading::new()
            .with("heart_rate", 80.0)
            .with("oxygen_level", 97.5);
        let result = scorer().score_one(&reading);
        assert!(result.score.abs() < EPS);
        assert!(!result.is_anomaly);
    }

    #[test]
    fn test_weighted_average_across_metrics() {
        // heart_rate at boundary (deviation 1, weight 0.2) and oxygen at
        // midpoint (deviation 0, weight 0.2): mean 0.5 -> raw 5 -> final 10.
        let reading = Reading::new()
            .with("heart_rate", 100.0)
            .with("oxygen_level", 97.5);
        let result = scorer().score_one(&reading);
        assert!((result.score - 10.0).abs() < EPS);
        assert!(result.is_anomaly);
    }

    #[test]
    fn test_threshold_is_strict() {
        // 85 bpm: normalized 0.625, deviation 0.25 -> final 5.0
        let above = scorer().score_one(&single(Metric::HeartRate, 85.0));
        assert!((above.score - 5.0).abs() < EPS);
        assert!(above.is_anomaly);

        // 82 bpm: deviation 0.1 -> final 2.0
        let below = scorer().score_one(&single(Metric::HeartRate, 82.0));
        assert!((below.score - 2.0).abs() < EPS);
        assert!(!below.is_anomaly);

        // Exactly at the threshold is not an anomaly.
        let config = ScorerConfig::reference().with_threshold(20.0).expect("Finite");
        let at = AnomalyScorer::new(config).score_one(&single(Metric::HeartRate, 60.0));
        assert!(!at.is_anomaly);
    }

    #[test]
    fn test_threshold_is_configurable() {
        let lenient = AnomalyScorer::new(
            ScorerConfig::reference().with_threshold(10.0).expect("Finite"),
        );
        let result = lenient.score_one(&single(Metric::HeartRate, 85.0));
        assert!((result.score - 5.0).abs() < EPS);
        assert!(!result.is_anomaly);
        assert_eq!(lenient.threshold(), 10.0);
    }

    #[test]
    fn test_no_recognized_metric_scores_zero() {
        let scorer = scorer();
        assert_eq!(scorer.score_one(&Reading::new()).score, 0.0);

        let unknown = Reading::new().with("steps", 12_000.0).with("Heart_Rate", 300.0);
        let result = scorer.score_one(&unknown);
        assert_eq!(result.score, 0.0);
        assert!(!result.is_anomaly);
    }

    #[test]
    fn test_unknown_keys_do_not_change_score() {
        let scorer = scorer();
        let plain = single(Metric::Systolic, 130.0);
        let noisy = plain.clone().with("device_battery", 3.0).with("pulse", 190.0);
        assert_eq!(scorer.score_one(&plain), scorer.score_one(&noisy));
    }

    #[test]
    fn test_insertion_order_does_not_matter() {
        let scorer = scorer();
        let forward = Reading::new()
            .with("heart_rate", 95.0)
            .with("systolic", 150.0)
            .with("temperature", 36.4);
        let backward = Reading::new()
            .with("temperature", 36.4)
            .with("systolic", 150.0)
            .with("heart_rate", 95.0);
        assert_eq!(scorer.score_one(&forward), scorer.score_one(&backward));
    }

    #[test]
    fn test_unweighted_metric_is_ignored() {
        let weights = BTreeMap::from([(Metric::HeartRate, 0.2)]);
        let scorer = AnomalyScorer::from_parts(
            crate::domain::config::REFERENCE_RANGES.into_iter().collect(),
            weights,
            DEFAULT_THRESHOLD,
        )
        .expect("Valid config");

        let reading = Reading::new().with("heart_rate", 80.0).with("systolic", 300.0);
        assert!(scorer.score_one(&reading).score.abs() < EPS);
    }

    #[test]
    fn test_degenerate_range_contributes_zero_deviation() {
        let ranges = BTreeMap::from([
            (Metric::HeartRate, MetricRange::new(60.0, 100.0)),
            (Metric::StressLevel, MetricRange::new(3.0, 3.0)),
        ]);
        let weights = BTreeMap::from([(Metric::HeartRate, 0.2), (Metric::StressLevel, 0.2)]);
        let scorer = AnomalyScorer::from_parts(ranges, weights, DEFAULT_THRESHOLD)
            .expect("Degenerate ranges are allowed");

        let stress_only = scorer.score_one(&single(Metric::StressLevel, 5.0));
        assert_eq!(stress_only.score, 0.0);

        // Degenerate metric still counts towards total weight.
        let both = Reading::new().with("heart_rate", 60.0).with("stress_level", 5.0);
        assert!((scorer.score_one(&both).score - 10.0).abs() < EPS);
    }

    #[test]
    fn test_zero_weights_score_zero() {
        let weights = BTreeMap::from([(Metric::HeartRate, 0.0)]);
        let scorer = AnomalyScorer::from_parts(
            crate::domain::config::REFERENCE_RANGES.into_iter().collect(),
            weights,
            DEFAULT_THRESHOLD,
        )
        .expect("Zero weight is valid");
        assert_eq!(scorer.score_one(&single(Metric::HeartRate, 10.0)).score, 0.0);
    }

    #[test]
    fn test_missing_range_fails_construction() {
        let ranges = BTreeMap::from([(Metric::Systolic, MetricRange::new(90.0, 140.0))]);
        let weights = BTreeMap::from([(Metric::HeartRate, 0.2)]);
        let err = AnomalyScorer::from_parts(ranges, weights, DEFAULT_THRESHOLD)
            .expect_err("Must fail fast");
        assert!(matches!(err, ConfigError::MissingRange(Metric::HeartRate)));
    }

    #[test]
    fn test_empty_batch() {
        let batch = scorer().score_batch(&[]);
        assert!(batch.scores.is_empty());
        assert!(batch.is_anomaly.is_empty());
    }

    #[test]
    fn test_batch_matches_single_calls() {
        let scorer = scorer();
        let readings = vec![
            single(Metric::HeartRate, 60.0),
            Reading::new().with("heart_rate", 80.0).with("oxygen_level", 97.5),
            Reading::new().with("systolic", 135.0).with("diastolic", 88.0),
            Reading::new(),
        ];

        let batch = scorer.score_batch(&readings);
        assert_eq!(batch.len(), readings.len());
        for (i, reading) in readings.iter().enumerate() {
            let one = scorer.score_one(reading);
            assert_eq!(batch.scores[i], one.score);
            assert_eq!(batch.is_anomaly[i], one.is_anomaly);
        }
        assert_eq!(batch.is_anomaly, vec![true, false, true, false]);
    }

    #[test]
    fn test_trait_and_inherent_agree() {
        let scorer = scorer();
        let detector: &dyn AnomalyDetector = &scorer;
        let reading = single(Metric::Temperature, 38.5);
        assert_eq!(detector.score_one(&reading), scorer.score_one(&reading));
        assert_eq!(detector.threshold(), DEFAULT_THRESHOLD);
    }

    #[test]
    fn test_explain_matches_score() {
        let scorer = scorer();
        let reading = Reading::new()
            .with("heart_rate", 100.0)
            .with("oxygen_level", 97.5)
            .with("steps", 10.0);

        let explanation = scorer.explain(&reading);
        assert_eq!(explanation.result, scorer.score_one(&reading));
        assert_eq!(explanation.contributions.len(), 2);
        assert_eq!(explanation.contributions[0].metric, Metric::HeartRate);
        assert!((explanation.contributions[0].deviation - 1.0).abs() < EPS);
        assert_eq!(explanation.contributions[1].metric, Metric::OxygenLevel);
        assert!(explanation.contributions[1].deviation.abs() < EPS);
        assert_eq!(explanation.ignored, vec!["steps".to_string()]);
    }
}
