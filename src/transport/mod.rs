//! 传输层：向网关的聊天补全端点发起流式请求。
//!
//! # Transport
//!
//! The orchestrator only sees [`ChatTransport`]: hand it a [`ChatStreamRequest`] and a
//! [`CancelHandle`], get back a stream of [`StreamFrame`]s. [`HttpChatTransport`] is the
//! production implementation; tests plug in scripted transports.

pub mod config;
pub mod http;

pub use config::TransportConfig;
pub use http::{HttpChatTransport, HttpChatTransportBuilder};

use crate::playground::CancelHandle;
use crate::types::{ChatMessage, StreamFrame};
use crate::{BoxStream, Result};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// Request body for a streamed chat completion.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatStreamRequest {
    pub model: String,
    pub messages: Vec<ChatMessage>,
    pub stream: bool,
    pub stream_options: StreamOptions,
}

/// Always asks the gateway to attach usage to the terminal chunk.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct StreamOptions {
    pub include_usage: bool,
}

impl ChatStreamRequest {
    pub fn new(model: impl Into<String>, messages: Vec<ChatMessage>) -> Self {
        Self {
            model: model.into(),
            messages,
            stream: true,
            stream_options: StreamOptions {
                include_usage: true,
            },
        }
    }
}

/// Source of streamed chat completions.
///
/// The returned stream must stop yielding once `cancel` fires; it ends after the
/// terminal `Done` frame, or early (without `Done`) when the upstream closes.
#[async_trait]
pub trait ChatTransport: Send + Sync {
    async fn stream_chat(
        &self,
        request: ChatStreamRequest,
        cancel: CancelHandle,
    ) -> Result<BoxStream<'static, StreamFrame>>;
}
