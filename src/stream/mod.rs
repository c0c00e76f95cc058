//! 流式处理模块：SSE 解码与增量块聚合。
//!
//! # Streaming Layer
//!
//! ```text
//! Raw Bytes → SseDecoder → StreamFrame* → ChunkAggregator → text + usage
//! ```
//!
//! | Component | Description |
//! |-----------|-------------|
//! | [`SseDecoder`] | Incremental bytes-to-frames decoder used by the HTTP transport |
//! | [`ChunkAggregator`] | Folds frames into accumulated text and last-seen usage |

pub mod aggregate;
pub mod decode;

pub use aggregate::{ChunkAggregator, FrameOutcome};
pub use decode::{event_data, frame_from_data, SseDecoder};
