//! Response normalization.
//!
//! The analysis service answers in one of a few shapes: a structured
//! object, a bare JSON string, or (for the adjudicator) a string that itself
//! holds a JSON object. Every body maps to exactly one canonical result.

use crate::error::MalformedResponse;
use crate::models::{AnalysisResult, VerdictResult, ERROR_VERDICT};
use serde_json::{Map, Value};
use tracing::{debug, warn};

/// Top-level shape of a response body.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ResponseShape<'a> {
    /// A JSON object with named fields.
    Structured(&'a Map<String, Value>),
    /// A bare JSON string.
    Text(&'a str),
    /// Anything else (number, array, bool, null).
    Unrecognized(&'a Value),
}

impl<'a> ResponseShape<'a> {
    pub fn classify(body: &'a Value) -> Self {
        match body {
            Value::Object(map) => ResponseShape::Structured(map),
            Value::String(text) => ResponseShape::Text(text),
            other => ResponseShape::Unrecognized(other),
        }
    }
}

/// Normalize a primary agent's response.
///
/// A missing `analysis` field yields empty text, which the adjudication
/// payload later reports as "No Data".
pub fn normalize_analysis(body: &Value) -> AnalysisResult {
    match ResponseShape::classify(body) {
        ResponseShape::Structured(map) => {
            let text = map.get("analysis").and_then(Value::as_str).unwrap_or_else(|| {
                debug!("Response object has no string `analysis` field");
                ""
            });
            AnalysisResult::new(text, score(map.get("risk_score")))
        }
        ResponseShape::Text(text) => AnalysisResult::new(text, 0),
        ResponseShape::Unrecognized(other) => {
            warn!("Unrecognized analysis response: {}", other);
            AnalysisResult::new("", 0)
        }
    }
}

/// Normalize the adjudicator's response.
pub fn normalize_verdict(body: &Value) -> VerdictResult {
    match ResponseShape::classify(body) {
        ResponseShape::Structured(map) => verdict_from_object(map),
        ResponseShape::Text(raw) => decode_verdict_text(raw).unwrap_or_else(|err| {
            warn!("{}", err);
            err.into_verdict()
        }),
        ResponseShape::Unrecognized(other) => {
            warn!("Unrecognized verdict response: {}", other);
            VerdictResult::error(other.to_string())
        }
    }
}

/// Decode a verdict that arrived double-encoded as a JSON string.
pub fn decode_verdict_text(raw: &str) -> Result<VerdictResult, MalformedResponse> {
    match serde_json::from_str::<Value>(raw) {
        Ok(Value::Object(map)) => Ok(verdict_from_object(&map)),
        Ok(other) => Err(MalformedResponse {
            raw: raw.to_string(),
            reason: format!("expected a JSON object, found {}", kind(&other)),
        }),
        Err(e) => Err(MalformedResponse {
            raw: raw.to_string(),
            reason: e.to_string(),
        }),
    }
}

fn verdict_from_object(map: &Map<String, Value>) -> VerdictResult {
    let verdict = map
        .get("verdict")
        .and_then(Value::as_str)
        .filter(|v| !v.is_empty())
        .unwrap_or(ERROR_VERDICT);

    let analysis = map.get("analysis").and_then(Value::as_str).unwrap_or("");

    VerdictResult::new(verdict, score(map.get("confidence_score")), analysis)
}

/// Read a 0-100 score. Absent or unusable values are 0.
fn score(value: Option<&Value>) -> u8 {
    let raw = match value {
        Some(Value::Number(n)) => n.as_f64(),
        Some(Value::String(s)) => s.trim().parse::<f64>().ok(),
        _ => None,
    };

    raw.filter(|v| v.is_finite())
        .map(|v| v.round().clamp(0.0, 100.0) as u8)
        .unwrap_or(0)
}

fn kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}
