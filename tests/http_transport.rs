//! HttpChatTransport against a mock gateway.

use ai_traffic_rust::playground::{CancelHandle, Orchestrator, SessionOutcome, Slot};
use ai_traffic_rust::transport::{ChatStreamRequest, ChatTransport, HttpChatTransport};
use ai_traffic_rust::types::{ChatCompletionChunk, ChatMessage, StreamFrame, TokenUsage};
use ai_traffic_rust::Error;
use futures::TryStreamExt;
use mockito::{Matcher, Server};
use std::sync::Arc;

fn sse_body(events: &[&str]) -> String {
    events.iter().map(|e| format!("data: {}\n\n", e)).collect()
}

const HELLO_STREAM: &[&str] = &[
    r#"{"id":"c1","model":"gpt-4o","choices":[{"index":0,"delta":{"role":"assistant","content":""}}]}"#,
    r#"{"id":"c1","model":"gpt-4o","choices":[{"index":0,"delta":{"content":"Hello"}}]}"#,
    r#"{"id":"c1","model":"gpt-4o","choices":[{"index":0,"delta":{},"finish_reason":"stop"}]}"#,
    r#"{"id":"c1","model":"gpt-4o","choices":[],"usage":{"prompt_tokens":9,"completion_tokens":1,"total_tokens":10}}"#,
    "[DONE]",
];

#[tokio::test]
async fn test_streams_frames_with_auth_and_usage_flag() {
    let mut server = Server::new_async().await;
    let mock = server
        .mock("POST", "/ai/v1/chat/completions")
        .match_header("authorization", "Bearer sk-test")
        .match_header("accept", "text/event-stream")
        .match_header("content-type", "application/json")
        .match_header("x-request-id", Matcher::Any)
        .match_body(Matcher::PartialJson(serde_json::json!({
            "model": "gpt-4o",
            "stream": true,
            "stream_options": {"include_usage": true}
        })))
        .with_status(200)
        .with_header("content-type", "text/event-stream")
        .with_body(sse_body(HELLO_STREAM))
        .create_async()
        .await;

    let transport = HttpChatTransport::builder()
        .base_url(format!("{}/ai/v1", server.url()))
        .api_key("sk-test")
        .build()
        .unwrap();
    let request = ChatStreamRequest::new("gpt-4o", vec![ChatMessage::user("hi")]);
    let frames: Vec<StreamFrame> = transport
        .stream_chat(request, CancelHandle::new())
        .await
        .unwrap()
        .try_collect()
        .await
        .unwrap();

    mock.assert_async().await;
    assert_eq!(frames.len(), 5);
    assert_eq!(frames[4], StreamFrame::Done);
    match &frames[1] {
        StreamFrame::Chunk(chunk) => assert_eq!(chunk.delta_text(), Some("Hello")),
        other => panic!("expected chunk, got {:?}", other),
    }
    match &frames[3] {
        StreamFrame::Chunk(ChatCompletionChunk { usage, .. }) => {
            assert_eq!(*usage, Some(TokenUsage::new(9, 1, 10)))
        }
        other => panic!("expected usage chunk, got {:?}", other),
    }
}

#[tokio::test]
async fn test_non_success_status_is_remote_error() {
    let mut server = Server::new_async().await;
    let _mock = server
        .mock("POST", "/chat/completions")
        .with_status(404)
        .with_header("content-type", "application/json")
        .with_body(r#"{"error":{"message":"model 'nope' not found"}}"#)
        .create_async()
        .await;

    let transport = HttpChatTransport::builder()
        .base_url(server.url())
        .build()
        .unwrap();
    let request = ChatStreamRequest::new("nope", vec![ChatMessage::user("hi")]);
    let err = match transport.stream_chat(request, CancelHandle::new()).await {
        Err(e) => e,
        Ok(_) => panic!("expected an error"),
    };
    match err {
        Error::Remote { status, message } => {
            assert_eq!(status, 404);
            assert_eq!(message, "model 'nope' not found");
        }
        other => panic!("expected remote error, got {:?}", other),
    }
}

#[tokio::test]
async fn test_in_band_error_event_fails_the_stream() {
    let mut server = Server::new_async().await;
    let _mock = server
        .mock("POST", "/chat/completions")
        .with_status(200)
        .with_header("content-type", "text/event-stream")
        .with_body(sse_body(&[
            r#"{"choices":[{"index":0,"delta":{"content":"Hi"}}]}"#,
            r#"{"error":{"message":"upstream overloaded","type":"server_error"}}"#,
        ]))
        .create_async()
        .await;

    let transport = HttpChatTransport::builder()
        .base_url(server.url())
        .build()
        .unwrap();
    let request = ChatStreamRequest::new("gpt-4o", vec![ChatMessage::user("hi")]);
    let result: ai_traffic_rust::Result<Vec<StreamFrame>> = transport
        .stream_chat(request, CancelHandle::new())
        .await
        .unwrap()
        .try_collect()
        .await;
    let err = result.unwrap_err();
    assert!(err.to_string().contains("upstream overloaded"), "{}", err);
}

#[tokio::test]
async fn test_cancelled_before_open_never_sends() {
    let mut server = Server::new_async().await;
    let mock = server
        .mock("POST", "/chat/completions")
        .with_status(200)
        .with_body(sse_body(HELLO_STREAM))
        .expect(0)
        .create_async()
        .await;

    let transport = HttpChatTransport::builder()
        .base_url(server.url())
        .build()
        .unwrap();
    let cancel = CancelHandle::new();
    cancel.cancel();
    let request = ChatStreamRequest::new("gpt-4o", vec![ChatMessage::user("hi")]);
    assert!(transport.stream_chat(request, cancel).await.is_err());
    mock.assert_async().await;
}

#[tokio::test]
async fn test_orchestrator_over_http() {
    let mut server = Server::new_async().await;
    let _mock = server
        .mock("POST", "/chat/completions")
        .with_status(200)
        .with_header("content-type", "text/event-stream")
        .with_body(sse_body(HELLO_STREAM))
        .create_async()
        .await;

    let transport = HttpChatTransport::builder()
        .base_url(server.url())
        .build()
        .unwrap();
    let orch = Orchestrator::builder()
        .transport(Arc::new(transport))
        .primary_model("gpt-4o")
        .build()
        .unwrap();

    match orch.send(Slot::Primary, "hi").await.unwrap() {
        SessionOutcome::Completed(metrics) => {
            assert_eq!(metrics.total_tokens, Some(10));
            assert_eq!(metrics.input_tokens, Some(9));
        }
        other => panic!("expected completion, got {:?}", other),
    }
    let snap = orch.snapshot(Slot::Primary);
    assert_eq!(snap.messages[1].message, ChatMessage::assistant("Hello"));
}
