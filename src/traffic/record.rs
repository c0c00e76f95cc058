//! Raw request/response pair envelope and the normalized entry.

use super::wire::{RequestKind, RequestVariant, ResponseVariant};
use crate::types::usage::u64_or_null;
use crate::types::TokenUsage;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

/// Logged request side of a traffic pair.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RequestRecord {
    #[serde(default, deserialize_with = "string_or_number")]
    pub id: String,
    #[serde(default, deserialize_with = "string_or_number")]
    pub timestamp: String,
    #[serde(default)]
    pub method: String,
    #[serde(default)]
    pub uri: String,
    #[serde(default)]
    pub headers: Value,
    #[serde(default)]
    pub body: Option<RequestVariant>,
}

/// Logged response side of a traffic pair.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ResponseRecord {
    #[serde(default, deserialize_with = "string_or_number")]
    pub id: String,
    #[serde(default, deserialize_with = "string_or_number")]
    pub timestamp: String,
    #[serde(default)]
    pub status_code: Option<u16>,
    #[serde(default)]
    pub headers: Value,
    #[serde(default)]
    pub body: Option<ResponseVariant>,
    #[serde(default, deserialize_with = "u64_or_null")]
    pub duration_ms: u64,
}

/// One request with its (optional) response, as supplied by the traffic list.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TrafficPair {
    pub request: RequestRecord,
    #[serde(default)]
    pub response: Option<ResponseRecord>,
}

impl TrafficPair {
    pub fn new(request: RequestRecord, response: Option<ResponseRecord>) -> Self {
        Self { request, response }
    }

    /// Decode any JSON value. An envelope that still does not fit is kept whole as
    /// an `other` request body so nothing is lost.
    pub fn from_value(value: &Value) -> Self {
        match TrafficPair::deserialize(value) {
            Ok(pair) => pair,
            Err(e) => {
                tracing::warn!(error = %e, "malformed traffic envelope, degrading to other");
                let id = value
                    .pointer("/request/id")
                    .map(scalar_to_string)
                    .unwrap_or_default();
                let timestamp = value
                    .pointer("/request/timestamp")
                    .map(scalar_to_string)
                    .unwrap_or_default();
                TrafficPair {
                    request: RequestRecord {
                        id,
                        timestamp,
                        body: RequestVariant::from_value(value.clone()),
                        ..Default::default()
                    },
                    response: None,
                }
            }
        }
    }
}

/// Canonical normalized traffic record. Immutable once built.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrafficEntry {
    pub id: String,
    pub timestamp: String,
    pub model: String,
    pub duration_ms: u64,
    pub request_kind: RequestKind,
    pub request_preview: String,
    pub response_preview: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status_code: Option<u16>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub usage: Option<TokenUsage>,
}

impl TrafficEntry {
    pub fn is_error(&self) -> bool {
        self.status_code.map_or(false, |s| s >= 400)
    }
}

fn scalar_to_string(v: &Value) -> String {
    match v {
        Value::String(s) => s.clone(),
        Value::Null => String::new(),
        other => other.to_string(),
    }
}

fn string_or_number<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    match Value::deserialize(deserializer)? {
        Value::String(s) => Ok(s),
        Value::Number(n) => Ok(n.to_string()),
        Value::Null => Ok(String::new()),
        other => Err(serde::de::Error::custom(format!(
            "expected string or number, got {}",
            other
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_numeric_ids_and_missing_fields() {
        let pair = TrafficPair::from_value(&json!({
            "request": {"id": 42, "timestamp": "2025-01-01T00:00:00Z"}
        }));
        assert_eq!(pair.request.id, "42");
        assert!(pair.request.body.is_none());
        assert!(pair.response.is_none());
    }

    #[test]
    fn test_envelope_that_cannot_decode_is_kept_as_other() {
        let raw = json!({"request": {"id": "r1", "headers": {}, "method": ["GET"]}});
        let pair = TrafficPair::from_value(&raw);
        assert_eq!(pair.request.id, "r1");
        assert_eq!(pair.request.body, Some(RequestVariant::Other(Some(raw))));
    }

    #[test]
    fn test_not_an_object_at_all() {
        let pair = TrafficPair::from_value(&json!(17));
        assert_eq!(pair.request.id, "");
        assert_eq!(pair.request.body, Some(RequestVariant::Other(Some(json!(17)))));
    }
}
