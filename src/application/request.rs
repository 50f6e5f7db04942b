//! Scoring request parsing and boundary validation.
//!
//! Request bodies come from untrusted callers. Everything that could make
//! a value unfit for scoring is rejected here, so the scorer itself never
//! sees malformed input.

use serde_json::{Map, Value};

use crate::domain::{Metric, Reading};
use crate::{PulsewatchError, Result};

/// A validated scoring request: who the readings belong to, and the readings.
#[derive(Debug, Clone, PartialEq)]
pub struct ScoreRequest {
    /// Caller-supplied user identifier (only used for logging)
    pub user_id: String,

    /// Snapshots to score, in submission order
    pub readings: Vec<Reading>,
}

impl ScoreRequest {
    #[must_use]
    pub fn new(user_id: impl Into<String>, readings: Vec<Reading>) -> Self {
        Self {
            user_id: user_id.into(),
            readings,
        }
    }

    /// Parse a raw JSON body.
    ///
    /// # Errors
    /// Returns [`PulsewatchError::InvalidBody`] if the body is not JSON,
    /// otherwise whatever [`ScoreRequest::from_value`] returns.
    pub fn from_slice(body: &[u8]) -> Result<Self> {
        let value: Value = serde_json::from_slice(body)
            .map_err(|e| PulsewatchError::InvalidBody(format!("Malformed JSON: {e}")))?;
        Self::from_value(&value)
    }

    /// Validate a decoded body of the form
    /// `{"user_id": ..., "metrics": [{"heart_rate": 72, ...}, ...]}`.
    ///
    /// # Errors
    /// - [`PulsewatchError::MissingParameters`] if `user_id` is absent or
    ///   blank, or `metrics` is absent or empty
    /// - [`PulsewatchError::InvalidBody`] for structurally wrong bodies
    /// - [`PulsewatchError::InvalidMetricValue`] if a known metric is not numeric
    pub fn from_value(value: &Value) -> Result<Self> {
        let body = value
            .as_object()
            .ok_or_else(|| PulsewatchError::InvalidBody("Expected a JSON object".to_string()))?;

        let user_id = body
            .get("user_id")
            .and_then(user_id_from_value)
            .ok_or(PulsewatchError::MissingParameters)?;

        let metrics = match body.get("metrics") {
            None | Some(Value::Null) => return Err(PulsewatchError::MissingParameters),
            Some(Value::Array(items)) => items,
            Some(_) => {
                return Err(PulsewatchError::InvalidBody(
                    "'metrics' must be an array of objects".to_string(),
                ))
            }
        };
        if metrics.is_empty() {
            return Err(PulsewatchError::MissingParameters);
        }

        let readings = parse_readings(metrics)?;

        Ok(Self { user_id, readings })
    }
}

/// Build readings from a list of decoded JSON objects.
///
/// Known metrics must be numbers or numeric strings; `null` marks a metric
/// as absent. Unknown keys are kept when numeric and dropped otherwise, so
/// fields like timestamps never fail a batch.
///
/// # Errors
/// - [`PulsewatchError::InvalidBody`] if an item is not an object
/// - [`PulsewatchError::InvalidMetricValue`] if a known metric is not numeric
pub fn parse_readings(items: &[Value]) -> Result<Vec<Reading>> {
    items
        .iter()
        .enumerate()
        .map(|(index, item)| {
            item.as_object()
                .ok_or_else(|| {
                    PulsewatchError::InvalidBody(format!("metrics[{index}] must be an object"))
                })
                .and_then(reading_from_object)
        })
        .collect()
}

fn user_id_from_value(value: &Value) -> Option<String> {
    match value {
        Value::String(s) if !s.trim().is_empty() => Some(s.trim().to_string()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

fn reading_from_object(fields: &Map<String, Value>) -> Result<Reading> {
    let mut reading = Reading::new();

    for (key, value) in fields {
        let known = key.parse::<Metric>().is_ok();
        match (numeric_value(value), known) {
            (Numeric::Absent, _) => {}
            (Numeric::Value(v), _) => {
                reading.insert(key.as_str(), v);
            }
            (Numeric::Invalid, false) => {}
            (Numeric::Invalid, true) => {
                return Err(PulsewatchError::InvalidMetricValue {
                    metric: key.clone(),
                    value: value.to_string(),
                })
            }
        }
    }

    Ok(reading)
}

enum Numeric {
    Absent,
    Value(f64),
    Invalid,
}

fn numeric_value(value: &Value) -> Numeric {
    let parsed = match value {
        Value::Null => return Numeric::Absent,
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    };
    match parsed {
        Some(v) if v.is_finite() => Numeric::Value(v),
        _ => Numeric::Invalid,
    }
}
