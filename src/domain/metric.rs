//! Vital-sign metrics and their clinically normal bands.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// A named vital-sign measurement.
///
/// The wire name of each variant is its snake_case form (`heart_rate`,
/// `oxygen_level`, ...). Parsing is exact: `"Heart_Rate"` is not a metric.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Metric {
    /// Heart rate in beats per minute
    HeartRate,
    /// Systolic blood pressure in mmHg
    Systolic,
    /// Diastolic blood pressure in mmHg
    Diastolic,
    /// Blood oxygen saturation in percent
    OxygenLevel,
    /// Body temperature in degrees Celsius
    Temperature,
    /// Self-reported stress on a 1-5 scale
    StressLevel,
}

impl Metric {
    /// Every metric the scorer knows about, in canonical order.
    pub const ALL: [Metric; 6] = [
        Self::HeartRate,
        Self::Systolic,
        Self::Diastolic,
        Self::OxygenLevel,
        Self::Temperature,
        Self::StressLevel,
    ];

    /// Wire name used in readings and configuration files.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::HeartRate => "heart_rate",
            Self::Systolic => "systolic",
            Self::Diastolic => "diastolic",
            Self::OxygenLevel => "oxygen_level",
            Self::Temperature => "temperature",
            Self::StressLevel => "stress_level",
        }
    }
}

impl fmt::Display for Metric {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A metric name that does not match any [`Metric`].
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("Unknown metric '{0}'")]
pub struct UnknownMetric(pub String);

impl FromStr for Metric {
    type Err = UnknownMetric;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|m| m.as_str() == s)
            .ok_or_else(|| UnknownMetric(s.to_string()))
    }
}

/// Closed interval `[min, max]` describing the normal band of a metric.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MetricRange {
    pub min: f64,
    pub max: f64,
}

impl MetricRange {
    #[must_use]
    pub const fn new(min: f64, max: f64) -> Self {
        Self { min, max }
    }

    /// A range with `max <= min` cannot scale values and pins them to the midpoint.
    #[must_use]
    pub fn is_degenerate(&self) -> bool {
        self.max <= self.min
    }

    #[must_use]
    pub fn midpoint(&self) -> f64 {
        (self.min + self.max) / 2.0
    }

    /// Min-max scale `value` into `[0, 1]`.
    ///
    /// Values outside the band saturate at 0 or 1. Degenerate ranges
    /// always yield `0.5`.
    #[must_use]
    pub fn normalize(&self, value: f64) -> f64 {
        if self.is_degenerate() {
            return 0.5;
        }
        ((value - self.min) / (self.max - self.min)).clamp(0.0, 1.0)
    }

    /// Distance of `value` from the band's midpoint, in `[0, 1]`.
    ///
    /// 0 at the midpoint, 1 at or beyond either boundary.
    #[must_use]
    pub fn deviation(&self, value: f64) -> f64 {
        (self.normalize(value) - 0.5).abs() * 2.0
    }
}
