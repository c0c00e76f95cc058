use super::config::TransportConfig;
use super::{ChatStreamRequest, ChatTransport};
use crate::error::{Error, ErrorContext, TransportError};
use crate::playground::CancelHandle;
use crate::stream::SseDecoder;
use crate::types::StreamFrame;
use crate::{BoxStream, Result};
use async_trait::async_trait;
use futures::{StreamExt, TryStreamExt};
use reqwest::Proxy;
use std::time::Duration;
use tracing::{debug, warn};

/// Streams chat completions from the gateway over HTTP + SSE.
pub struct HttpChatTransport {
    client: reqwest::Client,
    config: TransportConfig,
}

impl HttpChatTransport {
    pub fn new(config: TransportConfig) -> Result<Self> {
        config.validate()?;

        let mut builder = reqwest::Client::builder()
            .connect_timeout(config.connect_timeout)
            .pool_idle_timeout(Some(Duration::from_secs(90)));
        if let Some(timeout) = config.request_timeout {
            builder = builder.timeout(timeout);
        }
        if let Some(proxy_url) = &config.proxy_url {
            match Proxy::all(proxy_url) {
                Ok(proxy) => builder = builder.proxy(proxy),
                Err(e) => warn!(error = %e, "ignoring invalid AI_PROXY_URL"),
            }
        }

        let client = builder
            .build()
            .map_err(|e| Error::Transport(TransportError::Other(e.to_string())))?;
        Ok(Self { client, config })
    }

    /// Transport configured from the `AI_GATEWAY_*` / `AI_HTTP_*` environment.
    pub fn from_env() -> Result<Self> {
        Self::new(TransportConfig::from_env()?)
    }

    pub fn builder() -> HttpChatTransportBuilder {
        HttpChatTransportBuilder::new()
    }

    pub fn config(&self) -> &TransportConfig {
        &self.config
    }

    async fn open(&self, request: &ChatStreamRequest) -> Result<reqwest::Response> {
        let url = self.config.chat_url();
        let request_id = uuid::Uuid::new_v4().to_string();
        debug!(url = %url, model = %request.model, request_id = %request_id, "opening chat stream");

        let body = serde_json::to_vec(request)?;
        let mut req = self
            .client
            .post(&url)
            .header("content-type", "application/json")
            .body(body)
            .header("accept", "text/event-stream")
            .header("x-request-id", request_id);
        if let Some(key) = &self.config.api_key {
            req = req.bearer_auth(key);
        }

        let resp = req.send().await.map_err(TransportError::Http)?;
        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(Error::Remote {
                status: status.as_u16(),
                message: remote_message(&body)
                    .unwrap_or_else(|| status.canonical_reason().unwrap_or("error").to_string()),
            });
        }
        Ok(resp)
    }
}

#[async_trait]
impl ChatTransport for HttpChatTransport {
    async fn stream_chat(
        &self,
        request: ChatStreamRequest,
        cancel: CancelHandle,
    ) -> Result<BoxStream<'static, StreamFrame>> {
        let resp = tokio::select! {
            biased;
            _ = cancel.cancelled() => {
                return Err(Error::runtime_with_context(
                    "request cancelled before the stream opened",
                    ErrorContext::new().with_source("http_transport"),
                ));
            }
            resp = self.open(&request) => resp?,
        };

        let bytes = resp
            .bytes_stream()
            .map_err(|e| Error::Transport(TransportError::Http(e)));
        let frames = SseDecoder::new()
            .decode_stream(Box::pin(bytes))
            .take_until(cancel.cancelled_owned());
        Ok(Box::pin(frames))
    }
}

/// Extract a readable message from an error body (`{"error": {"message": ..}}`, or the raw text).
fn remote_message(body: &str) -> Option<String> {
    let trimmed = body.trim();
    if trimmed.is_empty() {
        return None;
    }
    let parsed = serde_json::from_str::<serde_json::Value>(trimmed).ok();
    let from_json = parsed.as_ref().and_then(|v| {
        v.pointer("/error/message")
            .or_else(|| v.get("message"))
            .or_else(|| v.get("error"))
            .and_then(|m| m.as_str())
            .map(String::from)
    });
    Some(from_json.unwrap_or_else(|| trimmed.to_string()))
}

/// Builder for [`HttpChatTransport`], seeded from [`TransportConfig::default`].
#[derive(Debug, Clone, Default)]
pub struct HttpChatTransportBuilder {
    config: TransportConfig,
}

impl HttpChatTransportBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start from an existing config (e.g. [`TransportConfig::from_env`]).
    pub fn config(mut self, config: TransportConfig) -> Self {
        self.config = config;
        self
    }

    pub fn base_url(mut self, base_url: impl Into<String>) -> Self {
        self.config.base_url = base_url.into();
        self
    }

    pub fn api_key(mut self, api_key: impl Into<String>) -> Self {
        self.config.api_key = Some(api_key.into());
        self
    }

    pub fn chat_path(mut self, path: impl Into<String>) -> Self {
        self.config.chat_path = path.into();
        self
    }

    pub fn connect_timeout(mut self, timeout: Duration) -> Self {
        self.config.connect_timeout = timeout;
        self
    }

    pub fn request_timeout(mut self, timeout: Duration) -> Self {
        self.config.request_timeout = Some(timeout);
        self
    }

    pub fn build(self) -> Result<HttpChatTransport> {
        HttpChatTransport::new(self.config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_remote_message_shapes() {
        assert_eq!(
            remote_message(r#"{"error":{"message":"model not found"}}"#),
            Some("model not found".into())
        );
        assert_eq!(remote_message(r#"{"error":"quota"}"#), Some("quota".into()));
        assert_eq!(remote_message("Bad Gateway"), Some("Bad Gateway".into()));
        assert_eq!(remote_message("  "), None);
    }

    #[test]
    fn test_builder_rejects_invalid_base_url() {
        let res = HttpChatTransport::builder().base_url("::nope").build();
        assert!(matches!(res, Err(Error::Configuration { .. })));
    }
}
