//! # ai-traffic-rust
//!
//! AI 网关流量归一化与双模型流式对比运行时。
//!
//! Traffic normalization and dual-session streaming runtime for an OpenAI-compatible
//! AI gateway.
//!
//! ## Overview
//!
//! Two independent halves share one set of wire types:
//!
//! - **Traffic**: logged request/response pairs (chat, completion, embedding, rerank or
//!   anything else) are turned into [`TrafficEntry`] values with a model name, short
//!   previews and unified [`TokenUsage`]. Normalization is total: malformed payloads
//!   degrade to documented fallback text and never fail.
//! - **Playground**: the [`Orchestrator`] drives a primary and an optional comparison
//!   chat session concurrently over a cancellable streaming transport, publishing
//!   partial text and per-message metrics (time to first token, total time, tokens,
//!   tokens/second) to a [`SessionObserver`].
//!
//! ## Quick Start
//!
//! ```rust
//! use ai_traffic_rust::stream::ChunkAggregator;
//! use ai_traffic_rust::types::{ChatCompletionChunk, StreamFrame, TokenUsage};
//!
//! let frames = vec![
//!     StreamFrame::Chunk(ChatCompletionChunk::delta("Hel")),
//!     StreamFrame::Chunk(ChatCompletionChunk::delta("lo")),
//!     StreamFrame::Chunk(ChatCompletionChunk::usage_only(TokenUsage::new(5, 2, 7))),
//!     StreamFrame::Done,
//! ];
//! let agg = ChunkAggregator::from_frames(&frames);
//! assert_eq!(agg.text(), "Hello");
//! assert_eq!(agg.usage().map(|u| u.total_tokens), Some(7));
//! ```
//!
//! ## Module Organization
//!
//! | Module | Description |
//! |--------|-------------|
//! | [`types`] | Messages, usage, stream chunks, session events |
//! | [`traffic`] | Tagged request/response variants and the normalizer |
//! | [`stream`] | SSE decoding and chunk aggregation |
//! | [`transport`] | Streaming chat transport trait and HTTP implementation |
//! | [`playground`] | Dual-session orchestrator, sessions, metrics, cancellation |
//! | [`telemetry`] | Tracing setup and session observers |

pub mod playground;
pub mod stream;
pub mod telemetry;
pub mod traffic;
pub mod transport;
pub mod types;

pub use playground::{
    CancelHandle, MessageMetrics, Orchestrator, OrchestratorBuilder, SessionObserver,
    SessionOutcome, SessionState, Slot, StreamSession, UnifiedOutcome,
};
pub use traffic::{normalize, normalize_value, RequestVariant, ResponseVariant, TrafficEntry, TrafficPair};
pub use transport::{ChatStreamRequest, ChatTransport, HttpChatTransport, TransportConfig};
pub use types::{
    ChatCompletionChunk, ChatMessage, ContentPart, MessageContent, MessageRole, SessionEvent,
    StreamFrame, TokenUsage,
};

use futures::Stream;
use std::pin::Pin;

/// Result type alias for the library
pub type Result<T> = std::result::Result<T, Error>;

/// A unified pinned, boxed stream that emits `Result<T>`
pub type BoxStream<'a, T> = Pin<Box<dyn Stream<Item = Result<T>> + Send + 'a>>;

/// Error type for the library
pub mod error;
pub use error::{Error, ErrorContext, SseParseError, TransportError};
