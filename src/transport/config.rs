use crate::error::{Error, ErrorContext};
use crate::Result;
use std::env;
use std::time::Duration;

pub const DEFAULT_BASE_URL: &str = "http://localhost:3001/ai/v1";
pub const DEFAULT_CHAT_PATH: &str = "/chat/completions";

/// Connection settings for the gateway's chat endpoint.
///
/// Env knobs read by [`TransportConfig::from_env`]:
/// - `AI_GATEWAY_BASE_URL` (default `http://localhost:3001/ai/v1`)
/// - `AI_GATEWAY_API_KEY`
/// - `AI_HTTP_CONNECT_TIMEOUT_SECS` (default 10)
/// - `AI_HTTP_TIMEOUT_SECS` (no whole-request timeout unless set; streams can be long)
/// - `AI_PROXY_URL`
#[derive(Debug, Clone, PartialEq)]
pub struct TransportConfig {
    pub base_url: String,
    pub api_key: Option<String>,
    pub chat_path: String,
    pub connect_timeout: Duration,
    pub request_timeout: Option<Duration>,
    pub proxy_url: Option<String>,
}

impl Default for TransportConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            api_key: None,
            chat_path: DEFAULT_CHAT_PATH.to_string(),
            connect_timeout: Duration::from_secs(10),
            request_timeout: None,
            proxy_url: None,
        }
    }
}

impl TransportConfig {
    pub fn from_env() -> Result<Self> {
        let mut cfg = Self::default();
        if let Some(url) = non_empty_var("AI_GATEWAY_BASE_URL") {
            cfg.base_url = url;
        }
        cfg.api_key = non_empty_var("AI_GATEWAY_API_KEY");
        if let Some(secs) = non_empty_var("AI_HTTP_CONNECT_TIMEOUT_SECS")
            .and_then(|s| s.parse::<u64>().ok())
        {
            cfg.connect_timeout = Duration::from_secs(secs.max(1));
        }
        cfg.request_timeout = non_empty_var("AI_HTTP_TIMEOUT_SECS")
            .and_then(|s| s.parse::<u64>().ok())
            .filter(|s| *s > 0)
            .map(Duration::from_secs);
        cfg.proxy_url = non_empty_var("AI_PROXY_URL");
        cfg.validate()?;
        Ok(cfg)
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    pub fn with_api_key(mut self, api_key: impl Into<String>) -> Self {
        self.api_key = Some(api_key.into());
        self
    }

    pub fn with_chat_path(mut self, path: impl Into<String>) -> Self {
        self.chat_path = path.into();
        self
    }

    pub fn validate(&self) -> Result<()> {
        let url = url::Url::parse(&self.base_url).map_err(|e| {
            Error::configuration_with_context(
                format!("invalid gateway base URL: {}", e),
                ErrorContext::new()
                    .with_field_path("base_url")
                    .with_details(self.base_url.clone()),
            )
        })?;
        if !matches!(url.scheme(), "http" | "https") {
            return Err(Error::configuration_with_context(
                format!("unsupported URL scheme '{}'", url.scheme()),
                ErrorContext::new().with_field_path("base_url"),
            ));
        }
        Ok(())
    }

    /// Full URL of the chat completions endpoint.
    pub fn chat_url(&self) -> String {
        let base = self.base_url.trim_end_matches('/');
        if self.chat_path.starts_with('/') {
            format!("{}{}", base, self.chat_path)
        } else {
            format!("{}/{}", base, self.chat_path)
        }
    }
}

fn non_empty_var(key: &str) -> Option<String> {
    env::var(key).ok().filter(|v| !v.trim().is_empty())
}
