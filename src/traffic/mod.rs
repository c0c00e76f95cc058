//! 流量模块：将网关记录的请求/响应对归一化为统一的展示条目。
//!
//! # Traffic Module
//!
//! Converts logged gateway request/response pairs into [`TrafficEntry`] values with a
//! model name, short previews and unified token usage.
//!
//! | Submodule | Description |
//! |-----------|-------------|
//! | [`wire`] | Tagged request/response variants and per-kind payloads |
//! | [`record`] | Raw pair envelope and the normalized entry |
//! | [`normalize`] | Total pair-to-entry conversion |
//! | [`sse`] | Splitting of captured SSE bodies |
//! | [`classify`] | Variants from raw HTTP bodies |
//! | [`summary`] | Per-kind and per-model aggregates |
//!
//! ```rust
//! use ai_traffic_rust::traffic::normalize_value;
//! use serde_json::json;
//!
//! let entry = normalize_value(&json!({
//!     "request": {
//!         "id": "req-1",
//!         "timestamp": "2025-06-01T12:00:00Z",
//!         "body": {"kind": "embedding", "data": {"model": "embed", "input": ["a", "b", "c"]}}
//!     }
//! }));
//! assert_eq!(entry.request_preview, "3 texts: a...");
//! assert_eq!(entry.response_preview, "No response");
//! ```

pub mod classify;
pub mod normalize;
pub mod record;
pub mod sse;
pub mod summary;
pub mod wire;

pub use classify::{request_from_body, response_from_body};
pub use normalize::{normalize, normalize_all, normalize_value, request_preview, response_preview};
pub use record::{RequestRecord, ResponseRecord, TrafficEntry, TrafficPair};
pub use sse::{parse_chat_stream, parse_sse_data};
pub use summary::{ModelStats, TrafficSummary};
pub use wire::{
    ChatCompletionResponse, ChatRequest, CompletionRequest, CompletionResponse, EmbeddingRequest,
    EmbeddingResponse, EmbeddingUsage, LoggedMessage, RequestKind, RequestVariant,
    RerankRequest, RerankResponse, RerankUsage, ResponseKind, ResponseVariant, TextInput,
};
