//! End-to-end normalizer behaviour on logged traffic pairs.

use ai_traffic_rust::traffic::{
    normalize, normalize_all, normalize_value, RequestKind, TrafficPair, TrafficSummary,
};
use ai_traffic_rust::TokenUsage;
use serde_json::{json, Value};

fn pair(uri: &str, request: Value, response: Option<Value>) -> Value {
    let mut raw = json!({
        "request": {
            "id": 7,
            "timestamp": "2025-06-01T12:00:00Z",
            "method": "POST",
            "uri": uri,
            "headers": {"content-type": "application/json"},
            "body": request
        }
    });
    if let Some(body) = response {
        raw["response"] = json!({
            "id": 7,
            "timestamp": "2025-06-01T12:00:02Z",
            "status_code": 200,
            "headers": {},
            "body": body,
            "duration_ms": 1500
        });
    }
    raw
}

#[test]
fn test_chat_stream_concatenates_deltas_and_takes_terminal_usage() {
    let raw = pair(
        "/ai/v1/chat/completions",
        json!({"kind": "chat", "data": {
            "model": "gpt-4o",
            "messages": [{"role": "user", "content": "Say hello"}],
            "stream": true
        }}),
        Some(json!({"kind": "chat-stream", "data": [
            {"choices": [{"index": 0, "delta": {"role": "assistant", "content": ""}}]},
            {"choices": [{"index": 0, "delta": {"content": "Hel"}}]},
            {"choices": [{"index": 0, "delta": {"content": "lo"}}]},
            {"choices": [{"index": 0, "delta": {"content": " world!"}, "finish_reason": "stop"}],
             "usage": {"prompt_tokens": 5, "completion_tokens": 3, "total_tokens": 8}},
            "[DONE]"
        ]})),
    );
    let entry = normalize_value(&raw);
    assert_eq!(entry.id, "7");
    assert_eq!(entry.model, "gpt-4o");
    assert_eq!(entry.request_kind, RequestKind::Chat);
    assert_eq!(entry.request_preview, "Say hello");
    assert_eq!(entry.response_preview, "Hello world!");
    assert_eq!(entry.usage, Some(TokenUsage::new(5, 3, 8)));
    assert_eq!(entry.duration_ms, 1500);
}

#[test]
fn test_chat_stream_ignores_frames_after_done() {
    let raw = pair(
        "/ai/v1/chat/completions",
        json!({"kind": "chat", "data": {"messages": []}}),
        Some(json!({"kind": "chat-stream", "data": [
            {"choices": [{"delta": {"content": "ok"}}]},
            "[DONE]",
            {"choices": [{"delta": {"content": " late"}}],
             "usage": {"prompt_tokens": 1, "completion_tokens": 1, "total_tokens": 2}}
        ]})),
    );
    let entry = normalize_value(&raw);
    assert_eq!(entry.response_preview, "ok");
    assert_eq!(entry.usage, None);
    assert_eq!(entry.request_preview, "No user message found");
    assert_eq!(entry.model, "unknown");
}

#[test]
fn test_chat_stream_without_deltas_uses_fallback() {
    let raw = pair(
        "/ai/v1/chat/completions",
        json!({"kind": "chat", "data": {"messages": []}}),
        Some(json!({"kind": "chat-stream", "data": [
            {"choices": [{"delta": {"role": "assistant"}}]},
            {"choices": [{"delta": {"content": ""}, "finish_reason": "stop"}]},
            "[DONE]"
        ]})),
    );
    assert_eq!(normalize_value(&raw).response_preview, "No stream content");
}

#[test]
fn test_tool_calling_conversation_keeps_chat_kind() {
    let raw = pair(
        "/ai/v1/chat/completions",
        json!({"kind": "chat", "data": {
            "model": "gpt-4o",
            "messages": [
                {"role": "developer", "content": "sys"},
                {"role": "user", "content": "weather in Paris?"},
                {"role": "assistant", "content": null, "tool_calls": [{
                    "id": "call_1",
                    "type": "function",
                    "function": {"name": "get_weather", "arguments": "{\"city\":\"Paris\"}"}
                }]},
                {"role": "tool", "tool_call_id": "call_1", "content": "18C"},
                {"role": "user", "content": "thanks"}
            ],
            "tools": [{"type": "function", "function": {"name": "get_weather"}}]
        }}),
        None,
    );
    let entry = normalize_value(&raw);
    assert_eq!(entry.request_kind, RequestKind::Chat);
    assert_eq!(entry.request_preview, "thanks");
    assert_eq!(entry.model, "gpt-4o");
}

#[test]
fn test_embedding_batch_input_preview() {
    let raw = pair(
        "/ai/v1/embeddings",
        json!({"kind": "embedding", "data": {"model": "text-embedding-3-small", "input": ["a", "b", "c"]}}),
        None,
    );
    let entry = normalize_value(&raw);
    assert_eq!(entry.request_preview, "3 texts: a...");
    assert_eq!(entry.response_preview, "No response");
    assert_eq!(entry.duration_ms, 0);
}

#[test]
fn test_embedding_response_with_no_vectors() {
    let raw = pair(
        "/ai/v1/embeddings",
        json!({"kind": "embedding", "data": {"input": []}}),
        Some(json!({"kind": "embedding", "data": {
            "object": "list",
            "data": [],
            "usage": {"prompt_tokens": 0, "total_tokens": 4}
        }})),
    );
    let entry = normalize_value(&raw);
    assert_eq!(entry.request_preview, "No input found");
    assert_eq!(entry.response_preview, "Generated 0 embeddings");
    let usage = entry.usage.unwrap();
    assert_eq!(usage.total_tokens, 4);
    assert_eq!(usage.completion_tokens, 0);
}

#[test]
fn test_other_response_with_explicit_null_data() {
    let raw = pair(
        "/ai/v1/audio/speech",
        json!({"kind": "other", "data": {"model": "tts-1", "voice": "alloy"}}),
        Some(json!({"kind": "other", "data": null})),
    );
    let entry = normalize_value(&raw);
    assert_eq!(entry.response_preview, "No data found");
    assert_eq!(entry.model, "tts-1");
    assert_eq!(entry.request_kind, RequestKind::Other);
}

#[test]
fn test_rerank_pair() {
    let raw = pair(
        "/ai/v1/rerank",
        json!({"kind": "rerank", "data": {
            "model": "rerank-v3",
            "query": "best pizza",
            "documents": ["a", {"text": "b"}, "c"]
        }}),
        Some(json!({"kind": "rerank", "data": {
            "results": [{"index": 2, "relevance_score": 0.8}, {"index": 0, "relevance_score": 0.1}],
            "usage": {"total_tokens": 21}
        }})),
    );
    let entry = normalize_value(&raw);
    assert_eq!(entry.request_preview, "Query: \"best pizza\" | 3 documents");
    assert_eq!(entry.response_preview, "Ranked 2 documents");
    assert_eq!(entry.usage, Some(TokenUsage::new(0, 0, 21)));
}

#[test]
fn test_malformed_payloads_never_fail() {
    let garbage = [
        json!(null),
        json!(42),
        json!("text"),
        json!([1, 2, 3]),
        json!({"messages": {"role": 3}}),
        json!({"prompt": {"nested": true}, "model": 5}),
        json!({"input": [1, null, {}]}),
        json!({"query": ["q"], "documents": "not a list"}),
    ];
    for kind in ["chat", "completion", "embedding", "rerank", "other"] {
        for data in &garbage {
            let raw = pair(
                "/x",
                json!({"kind": kind, "data": data}),
                Some(json!({"kind": kind, "data": data})),
            );
            let entry = normalize_value(&raw);
            assert!(!entry.request_preview.is_empty(), "kind {} data {}", kind, data);
            assert!(!entry.response_preview.is_empty(), "kind {} data {}", kind, data);
        }
    }

    for raw in [json!(null), json!([]), json!({"request": "nope"}), json!({"response": {}})] {
        let entry = normalize_value(&raw);
        assert!(!entry.request_preview.is_empty());
    }
}

#[test]
fn test_normalize_is_idempotent() {
    let raw = pair(
        "/ai/v1/completions",
        json!({"kind": "completion", "data": {"model": "davinci", "prompt": ["first", "second"]}}),
        Some(json!({"kind": "completion", "data": {
            "choices": [{"index": 0, "text": "done"}],
            "usage": {"prompt_tokens": 2, "completion_tokens": 1, "total_tokens": 3}
        }})),
    );
    let pair = TrafficPair::from_value(&raw);
    let first = normalize(&pair);
    let second = normalize(&pair);
    assert_eq!(first, second);
    assert_eq!(first.request_preview, "first");
}

#[test]
fn test_summary_over_normalized_list() {
    let raws = vec![
        pair(
            "/ai/v1/chat/completions",
            json!({"kind": "chat", "data": {"model": "gpt-4o", "messages": []}}),
            Some(json!({"kind": "chat-single", "data": {
                "choices": [{"index": 0, "message": {"role": "assistant", "content": "x"}}],
                "usage": {"prompt_tokens": 1, "completion_tokens": 1, "total_tokens": 2}
            }})),
        ),
        pair(
            "/ai/v1/embeddings",
            json!({"kind": "embedding", "data": {"model": "embed", "input": "x"}}),
            None,
        ),
    ];
    let pairs: Vec<TrafficPair> = raws.iter().map(TrafficPair::from_value).collect();
    let entries = normalize_all(&pairs);
    assert_eq!(entries.len(), 2);

    let summary = TrafficSummary::from_entries(&entries);
    assert_eq!(summary.total, 2);
    assert_eq!(summary.errors, 0);
    assert_eq!(summary.model("gpt-4o").unwrap().usage.total_tokens, 2);
    assert_eq!(summary.model("embed").unwrap().mean_duration_ms, None);
}
