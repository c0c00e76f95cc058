//! Build tagged variants from raw logged HTTP bodies.
//!
//! The request path decides the kind; when the path is not one of the known endpoints
//! the payload shape is sniffed instead. Bodies that are not JSON are kept as a
//! `base64:` string so nothing is lost.

use super::sse::parse_chat_stream;
use super::wire::{RequestKind, RequestVariant, ResponseKind, ResponseVariant};
use base64::Engine as _;
use serde_json::{json, Value};
use tracing::{debug, instrument};

/// Endpoint family a request path belongs to.
fn kind_from_path(uri: &str) -> Option<RequestKind> {
    let path = uri.split(['?', '#']).next().unwrap_or_default();
    let path = path.trim_end_matches('/');
    if path.ends_with("/chat/completions") {
        Some(RequestKind::Chat)
    } else if path.ends_with("/completions") {
        Some(RequestKind::Completion)
    } else if path.ends_with("/embeddings") {
        Some(RequestKind::Embedding)
    } else if path.ends_with("/rerank") {
        Some(RequestKind::Rerank)
    } else {
        None
    }
}

fn sniff_request(value: &Value) -> RequestKind {
    let has = |key: &str| value.get(key).is_some();
    if has("messages") {
        RequestKind::Chat
    } else if has("prompt") {
        RequestKind::Completion
    } else if has("query") && has("documents") {
        RequestKind::Rerank
    } else if has("input") {
        RequestKind::Embedding
    } else {
        RequestKind::Other
    }
}

fn sniff_response(value: &Value) -> ResponseKind {
    match value.get("object").and_then(Value::as_str) {
        Some("chat.completion") => return ResponseKind::ChatSingle,
        Some("text_completion") => return ResponseKind::Completion,
        Some("list") if value.get("data").map_or(false, Value::is_array) => {
            return ResponseKind::Embedding
        }
        _ => {}
    }
    if value.get("results").map_or(false, Value::is_array) {
        ResponseKind::Rerank
    } else {
        ResponseKind::Other
    }
}

fn request_tag(kind: RequestKind) -> &'static str {
    match kind {
        RequestKind::Chat => "chat",
        RequestKind::Completion => "completion",
        RequestKind::Embedding => "embedding",
        RequestKind::Rerank => "rerank",
        RequestKind::Other => "other",
    }
}

fn response_tag(kind: ResponseKind) -> &'static str {
    match kind {
        ResponseKind::ChatSingle => "chat-single",
        ResponseKind::ChatStream => "chat-stream",
        ResponseKind::Completion => "completion",
        ResponseKind::Embedding => "embedding",
        ResponseKind::Rerank => "rerank",
        ResponseKind::Other => "other",
    }
}

fn undecodable(bytes: &[u8]) -> Value {
    Value::String(format!(
        "base64:{}",
        base64::engine::general_purpose::STANDARD.encode(bytes)
    ))
}

fn looks_like_sse(body: &str) -> bool {
    let body = body.trim_start();
    body.starts_with("data:") || body.starts_with(':') || body.starts_with("event:")
}

/// Classify a raw request body. `None` for an absent or blank body.
#[instrument(skip_all, fields(uri = %uri))]
pub fn request_from_body(uri: &str, bytes: &[u8]) -> Option<RequestVariant> {
    let text = String::from_utf8_lossy(bytes);
    if text.trim().is_empty() {
        return None;
    }
    let value: Value = match serde_json::from_str(&text) {
        Ok(v) => v,
        Err(e) => {
            debug!(error = %e, "request body is not JSON");
            return Some(RequestVariant::Other(Some(undecodable(bytes))));
        }
    };
    let kind = kind_from_path(uri).unwrap_or_else(|| sniff_request(&value));
    RequestVariant::from_value(json!({ "kind": request_tag(kind), "data": value }))
}

/// Classify a raw response body. `None` for an absent or blank body.
///
/// Chat responses captured as SSE become `ChatStream`; everything else is parsed as JSON.
#[instrument(skip_all, fields(uri = %uri))]
pub fn response_from_body(uri: &str, bytes: &[u8]) -> Option<ResponseVariant> {
    let text = String::from_utf8_lossy(bytes);
    if text.trim().is_empty() {
        return None;
    }
    let path_kind = kind_from_path(uri);

    if looks_like_sse(&text) && matches!(path_kind, Some(RequestKind::Chat) | None) {
        if let Ok(frames) = parse_chat_stream(&text) {
            return Some(ResponseVariant::ChatStream(frames));
        }
    }

    let value: Value = match serde_json::from_str(&text) {
        Ok(v) => v,
        Err(e) => {
            debug!(error = %e, "response body is neither SSE nor JSON");
            return Some(ResponseVariant::Other(Some(undecodable(bytes))));
        }
    };
    let kind = match path_kind {
        Some(RequestKind::Chat) => ResponseKind::ChatSingle,
        Some(RequestKind::Completion) => ResponseKind::Completion,
        Some(RequestKind::Embedding) => ResponseKind::Embedding,
        Some(RequestKind::Rerank) => ResponseKind::Rerank,
        Some(RequestKind::Other) | None => sniff_response(&value),
    };
    ResponseVariant::from_value(json!({ "kind": response_tag(kind), "data": value }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::StreamFrame;

    #[test]
    fn test_request_kind_from_path() {
        let body = br#"{"model":"gpt-4o","messages":[{"role":"user","content":"hi"}]}"#;
        let v = request_from_body("/ai/v1/chat/completions?trace=1", body).unwrap();
        assert_eq!(v.kind(), RequestKind::Chat);
        assert_eq!(v.model(), Some("gpt-4o"));

        let v = request_from_body("/v1/completions", br#"{"prompt":"x"}"#).unwrap();
        assert_eq!(v.kind(), RequestKind::Completion);
    }

    #[test]
    fn test_request_kind_sniffed_for_unknown_path() {
        let v = request_from_body("/proxy", br#"{"query":"q","documents":["a"]}"#).unwrap();
        assert_eq!(v.kind(), RequestKind::Rerank);
        let v = request_from_body("/proxy", br#"{"input":"q"}"#).unwrap();
        assert_eq!(v.kind(), RequestKind::Embedding);
        let v = request_from_body("/proxy", br#"{"voice":"alloy"}"#).unwrap();
        assert_eq!(v.kind(), RequestKind::Other);
    }

    #[test]
    fn test_blank_and_invalid_bodies() {
        assert!(request_from_body("/v1/embeddings", b"  \n").is_none());
        assert!(response_from_body("/v1/embeddings", b"").is_none());

        let v = request_from_body("/v1/embeddings", b"{not json").unwrap();
        match v {
            RequestVariant::Other(Some(Value::String(s))) => assert!(s.starts_with("base64:")),
            other => panic!("expected base64 fallback, got {:?}", other),
        }
    }

    #[test]
    fn test_streamed_chat_response() {
        let body = concat!(
            "data: {\"choices\":[{\"delta\":{\"content\":\"Hel\"}}]}\n\n",
            "data: {\"choices\":[{\"delta\":{\"content\":\"lo\"}}],",
            "\"usage\":{\"prompt_tokens\":3,\"completion_tokens\":2,\"total_tokens\":5}}\n\n",
            "data: [DONE]\n\n"
        );
        let v = response_from_body("/ai/v1/chat/completions", body.as_bytes()).unwrap();
        match v {
            ResponseVariant::ChatStream(frames) => {
                assert_eq!(frames.len(), 3);
                assert_eq!(frames[2], StreamFrame::Done);
            }
            other => panic!("expected chat stream, got {:?}", other),
        }
    }

    #[test]
    fn test_single_chat_response_and_sniffing() {
        let body = br#"{"object":"chat.completion","choices":[{"index":0,"message":{"role":"assistant","content":"ok"}}]}"#;
        let v = response_from_body("/v1/chat/completions", body).unwrap();
        assert_eq!(v.kind(), ResponseKind::ChatSingle);

        let body = br#"{"object":"list","data":[{"embedding":[0.1]}],"usage":{"prompt_tokens":1,"total_tokens":1}}"#;
        let v = response_from_body("/gateway", body).unwrap();
        assert_eq!(v.kind(), ResponseKind::Embedding);
    }
}
