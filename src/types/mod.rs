//! 类型系统模块：定义流量归一化与流式会话共用的核心数据类型。
//!
//! # Types Module
//!
//! Core wire and presentation types shared by the traffic normalizer and the
//! playground orchestrator.
//!
//! ## Key Types
//!
//! | Type | Description |
//! |------|-------------|
//! | [`ChatMessage`] | Chat message with role and text-or-parts content |
//! | [`TokenUsage`] | Prompt/completion/total counts, always all three |
//! | [`ChatCompletionChunk`] | One incremental chat stream chunk |
//! | [`StreamFrame`] | A chunk or the terminal `[DONE]` sentinel |
//! | [`SessionEvent`] | Incremental update handed to the presentation layer |
//!
//! ## Example
//!
//! ```rust
//! use ai_traffic_rust::types::{ChatMessage, ContentPart, MessageContent, MessageRole};
//!
//! let system = ChatMessage::system("You are terse.");
//! let user = ChatMessage::with_content(
//!     MessageRole::User,
//!     MessageContent::parts(vec![
//!         ContentPart::text("Describe this"),
//!         ContentPart::image_url("https://example.com/a.png"),
//!     ]),
//! );
//! assert!(user.contains_image());
//! assert!(!system.contains_image());
//! ```

pub mod chunk;
pub mod events;
pub mod message;
pub mod usage;

pub use chunk::{ChatCompletionChunk, ChunkChoice, ChunkDelta, StreamFrame, DONE_SENTINEL};
pub use events::SessionEvent;
pub use message::{ChatMessage, ContentPart, ImageUrl, MessageContent, MessageRole};
pub use usage::TokenUsage;
