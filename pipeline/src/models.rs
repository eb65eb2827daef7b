//! Wire models exchanged with the forecasting backend.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Status discriminator of a successful backend response.
pub const SUCCESS_STATUS: &str = "success";

/// Value of one quantile band as seen in a single sample.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum BandValue {
    /// The key is not in the sample at all
    Absent,
    /// The key is present but holds null or a non-numeric value
    Missing,
    Present(f64),
}

/// One backend-returned sample.
///
/// Besides `timestamp` a record carries one column per quantile label plus
/// whatever bookkeeping columns the backend emits (`id`, `target_name`, ...).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QuantilePredictionPoint {
    /// Opaque ordering key
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<Value>,
    #[serde(flatten)]
    pub columns: Map<String, Value>,
}

impl QuantilePredictionPoint {
    pub fn new(timestamp: impl Into<Value>) -> Self {
        Self {
            timestamp: Some(timestamp.into()),
            columns: Map::new(),
        }
    }

    /// Add a quantile column (builder style).
    pub fn with_band(mut self, key: impl Into<String>, value: f64) -> Self {
        self.columns.insert(key.into(), Value::from(value));
        self
    }

    pub fn band(&self, key: &str) -> BandValue {
        match self.columns.get(key) {
            None => BandValue::Absent,
            Some(Value::Number(n)) => n.as_f64().map_or(BandValue::Missing, BandValue::Present),
            Some(Value::String(s)) => s
                .trim()
                .parse::<f64>()
                .map_or(BandValue::Missing, BandValue::Present),
            Some(_) => BandValue::Missing,
        }
    }
}

/// Successful forecast returned by the backend.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ForecastResponse {
    pub predictions: Vec<QuantilePredictionPoint>,
    /// Empty when the backend sent no advice
    pub energy_advice: Vec<String>,
    /// Backend's echo of the submitted attributes
    pub input_parameters: Option<Value>,
}

/// Payload of a body whose status discriminator is the success marker.
#[derive(Debug, Deserialize)]
pub(crate) struct ResponseEnvelope {
    pub predictions: Option<Vec<QuantilePredictionPoint>>,
    pub energy_advice: Option<Vec<String>>,
    pub input_parameters: Option<Value>,
}

/// Error body from the backend (`{ error, message }` or `{ error, missing }`)
/// or from the proxy in front of it (`{ error, message }`).
#[derive(Debug, Default, Deserialize)]
pub(crate) struct ErrorEnvelope {
    pub message: Option<String>,
    pub error: Option<String>,
    pub missing: Option<Vec<String>>,
}

impl ErrorEnvelope {
    /// Most specific human-readable text the envelope carries.
    pub fn best_message(self) -> Option<String> {
        let non_blank = |s: String| if s.trim().is_empty() { None } else { Some(s) };

        if let Some(message) = self.message.and_then(non_blank) {
            return Some(message);
        }
        let error = self.error.and_then(non_blank)?;
        match self.missing {
            Some(missing) if !missing.is_empty() => {
                Some(format!("{}: {}", error, missing.join(", ")))
            }
            _ => Some(error),
        }
    }
}
