//! Pure, total conversion of a raw traffic pair into a [`TrafficEntry`].
//!
//! Every branch ends in a defined string; nothing here returns an error or panics.

use super::record::{TrafficEntry, TrafficPair};
use super::wire::{RequestKind, RequestVariant, ResponseVariant, TextInput};
use crate::stream::ChunkAggregator;
use crate::types::TokenUsage;
use serde_json::Value;

pub const NO_REQUEST_BODY: &str = "No request body";
pub const NO_USER_MESSAGE: &str = "No user message found";
pub const NO_PROMPT: &str = "No prompt found";
pub const NO_INPUT: &str = "No input found";
pub const NO_DATA: &str = "No data found";
pub const NO_RESPONSE: &str = "No response";
pub const NO_RESPONSE_CONTENT: &str = "No response content";
pub const NO_STREAM_CONTENT: &str = "No stream content";
pub const NO_COMPLETION_TEXT: &str = "No completion text";
pub const UNKNOWN_MODEL: &str = "unknown";

/// Normalize one request/response pair.
pub fn normalize(pair: &TrafficPair) -> TrafficEntry {
    let request = &pair.request;
    let body = request.body.as_ref();

    let (response_preview, usage, duration_ms, status_code) = match &pair.response {
        Some(resp) => {
            let (preview, usage) = match &resp.body {
                Some(body) => response_preview(body),
                None => (NO_DATA.to_string(), None),
            };
            (preview, usage, resp.duration_ms, resp.status_code)
        }
        None => (NO_RESPONSE.to_string(), None, 0, None),
    };

    TrafficEntry {
        id: request.id.clone(),
        timestamp: request.timestamp.clone(),
        model: body
            .and_then(RequestVariant::model)
            .unwrap_or(UNKNOWN_MODEL)
            .to_string(),
        duration_ms,
        request_kind: body.map_or(RequestKind::Other, RequestVariant::kind),
        request_preview: body.map_or_else(|| NO_REQUEST_BODY.to_string(), request_preview),
        response_preview,
        status_code,
        usage,
    }
}

/// Normalize an arbitrary JSON value (the traffic list's raw items).
pub fn normalize_value(value: &Value) -> TrafficEntry {
    normalize(&TrafficPair::from_value(value))
}

pub fn normalize_all(pairs: &[TrafficPair]) -> Vec<TrafficEntry> {
    pairs.iter().map(normalize).collect()
}

/// Short human-readable text for a request body.
pub fn request_preview(body: &RequestVariant) -> String {
    match body {
        RequestVariant::Chat(req) => req
            .messages
            .iter()
            .rev()
            .find(|m| m.is_user())
            .and_then(|m| m.text())
            .filter(|text| !text.is_empty())
            .unwrap_or_else(|| NO_USER_MESSAGE.to_string()),
        RequestVariant::Completion(req) => match &req.prompt {
            Some(TextInput::Single(prompt)) => prompt.clone(),
            Some(TextInput::Batch(prompts)) => prompts
                .first()
                .cloned()
                .unwrap_or_else(|| NO_PROMPT.to_string()),
            None => NO_PROMPT.to_string(),
        },
        RequestVariant::Embedding(req) => match &req.input {
            Some(TextInput::Single(text)) => text.clone(),
            Some(TextInput::Batch(texts)) => match texts.first() {
                Some(first) => format!("{} texts: {}...", texts.len(), first),
                None => NO_INPUT.to_string(),
            },
            None => NO_INPUT.to_string(),
        },
        RequestVariant::Rerank(req) => format!(
            "Query: \"{}\" | {} documents",
            req.query.as_deref().unwrap_or_default(),
            req.documents.len()
        ),
        RequestVariant::Other(payload) => other_preview(payload.as_ref()),
    }
}

/// Short human-readable text and unified usage for a response body.
pub fn response_preview(body: &ResponseVariant) -> (String, Option<TokenUsage>) {
    match body {
        ResponseVariant::ChatSingle(resp) => {
            let text = resp
                .choices
                .first()
                .and_then(|c| c.message.content.as_ref())
                .map(|c| c.as_text())
                .filter(|t| !t.is_empty())
                .unwrap_or_else(|| NO_RESPONSE_CONTENT.to_string());
            (text, resp.usage)
        }
        ResponseVariant::ChatStream(frames) => {
            let agg = ChunkAggregator::from_frames(frames);
            let usage = agg.usage();
            let text = if agg.is_empty() {
                NO_STREAM_CONTENT.to_string()
            } else {
                agg.into_text()
            };
            (text, usage)
        }
        ResponseVariant::Completion(resp) => {
            let text = resp
                .choices
                .first()
                .and_then(|c| c.text.clone())
                .filter(|t| !t.is_empty())
                .unwrap_or_else(|| NO_COMPLETION_TEXT.to_string());
            (text, resp.usage)
        }
        ResponseVariant::Embedding(resp) => (
            format!("Generated {} embeddings", resp.data.len()),
            resp.usage.map(TokenUsage::from),
        ),
        ResponseVariant::Rerank(resp) => (
            format!("Ranked {} documents", resp.results.len()),
            resp.usage.map(TokenUsage::from),
        ),
        ResponseVariant::Other(payload) => (other_preview(payload.as_ref()), None),
    }
}

fn other_preview(payload: Option<&Value>) -> String {
    match payload {
        None | Some(Value::Null) => NO_DATA.to_string(),
        Some(v) => serde_json::to_string(v).unwrap_or_else(|_| NO_DATA.to_string()),
    }
}
