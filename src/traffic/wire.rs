//! Tagged request/response variants and their per-kind payloads.
//!
//! Wire shape is `{"kind": <kind>, "data": <payload>}`. Decoding is total: an unknown
//! kind, or a payload that does not fit its tag, becomes `Other(payload)`.

use crate::types::usage::u64_or_null;
use crate::types::{ChatMessage, MessageContent, MessageRole, StreamFrame, TokenUsage};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};
use tracing::warn;

/// String or list-of-strings input (`prompt`, `input`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum TextInput {
    Single(String),
    Batch(Vec<String>),
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ChatRequest {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,
    #[serde(default)]
    pub messages: Vec<LoggedMessage>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// One message of a logged chat request.
///
/// Logged traffic carries every role the upstream API accepts (`developer`, `tool`,
/// ...), assistant turns with `content: null` plus `tool_calls`, and part types the
/// playground never sends, so role and content stay loosely typed here.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LoggedMessage {
    #[serde(default)]
    pub role: String,
    #[serde(default)]
    pub content: Option<Value>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl LoggedMessage {
    pub fn is_user(&self) -> bool {
        self.role == MessageRole::User.as_str()
    }

    /// Plain string content, or the `text` parts joined with a single space.
    pub fn text(&self) -> Option<String> {
        match self.content.as_ref()? {
            Value::String(s) => Some(s.clone()),
            Value::Array(parts) => {
                let texts: Vec<&str> = parts
                    .iter()
                    .filter(|p| p.get("type").and_then(Value::as_str) == Some("text"))
                    .filter_map(|p| p.get("text").and_then(Value::as_str))
                    .collect();
                (!texts.is_empty()).then(|| texts.join(" "))
            }
            _ => None,
        }
    }
}

impl From<ChatMessage> for LoggedMessage {
    fn from(message: ChatMessage) -> Self {
        Self {
            role: message.role.as_str().to_string(),
            content: serde_json::to_value(&message.content).ok(),
            extra: Map::new(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CompletionRequest {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub prompt: Option<TextInput>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EmbeddingRequest {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub input: Option<TextInput>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RerankRequest {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub query: Option<String>,
    /// Plain strings or `{ "text": .. }` objects, depending on the backend.
    #[serde(default)]
    pub documents: Vec<Value>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ChatCompletionResponse {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,
    #[serde(default)]
    pub choices: Vec<ChatChoice>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub usage: Option<TokenUsage>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ChatChoice {
    #[serde(default)]
    pub index: u32,
    #[serde(default)]
    pub message: ChatChoiceMessage,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub finish_reason: Option<String>,
}

/// Assistant message of a non-streamed reply. `content` is null for tool-call-only replies.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ChatChoiceMessage {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub role: Option<String>,
    #[serde(default)]
    pub content: Option<MessageContent>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CompletionResponse {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,
    #[serde(default)]
    pub choices: Vec<CompletionChoice>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub usage: Option<TokenUsage>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CompletionChoice {
    #[serde(default)]
    pub index: u32,
    #[serde(default)]
    pub text: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub finish_reason: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EmbeddingResponse {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,
    /// Float or base64 vectors; only the count matters here.
    #[serde(default)]
    pub data: Vec<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub usage: Option<EmbeddingUsage>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Two-field usage reported by embedding endpoints.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EmbeddingUsage {
    #[serde(default, deserialize_with = "u64_or_null")]
    pub prompt_tokens: u64,
    #[serde(default, deserialize_with = "u64_or_null")]
    pub total_tokens: u64,
}

impl From<EmbeddingUsage> for TokenUsage {
    fn from(u: EmbeddingUsage) -> Self {
        TokenUsage::input_only(u.prompt_tokens, u.total_tokens)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RerankResponse {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,
    #[serde(default)]
    pub results: Vec<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub usage: Option<RerankUsage>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RerankUsage {
    #[serde(default, deserialize_with = "u64_or_null")]
    pub total_tokens: u64,
}

impl From<RerankUsage> for TokenUsage {
    fn from(u: RerankUsage) -> Self {
        TokenUsage::total_only(u.total_tokens)
    }
}

/// Discriminant of a request variant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum RequestKind {
    Chat,
    Completion,
    Embedding,
    Rerank,
    Other,
}

/// Discriminant of a response variant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ResponseKind {
    ChatSingle,
    ChatStream,
    Completion,
    Embedding,
    Rerank,
    Other,
}

/// Request body tagged by kind.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", content = "data", rename_all = "kebab-case")]
pub enum RequestVariant {
    Chat(ChatRequest),
    Completion(CompletionRequest),
    Embedding(EmbeddingRequest),
    Rerank(RerankRequest),
    Other(Option<Value>),
}

/// Response body tagged by kind. A chat stream is always the full collected frame list.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", content = "data", rename_all = "kebab-case")]
pub enum ResponseVariant {
    ChatSingle(ChatCompletionResponse),
    ChatStream(Vec<StreamFrame>),
    Completion(CompletionResponse),
    Embedding(EmbeddingResponse),
    Rerank(RerankResponse),
    Other(Option<Value>),
}

/// Split `{"kind", "data"}` off a JSON value; anything else is returned untouched.
fn split_tagged(value: Value) -> Result<(String, Value), Value> {
    match value {
        Value::Object(mut map) if map.get("kind").map_or(false, Value::is_string) => {
            let kind = match map.remove("kind") {
                Some(Value::String(k)) => k,
                _ => String::new(),
            };
            let data = map.remove("data").unwrap_or(Value::Null);
            Ok((kind, data))
        }
        other => Err(other),
    }
}

fn other_payload(data: Value) -> Option<Value> {
    if data.is_null() {
        None
    } else {
        Some(data)
    }
}

/// Decode `data` as `T`, or hand it back for the `Other` fallback.
fn typed<T: DeserializeOwned>(kind: &str, data: Value) -> Result<T, Value> {
    match T::deserialize(&data) {
        Ok(t) => Ok(t),
        Err(e) => {
            warn!(kind = kind, error = %e, "payload does not match its kind, degrading to other");
            Err(data)
        }
    }
}

impl RequestVariant {
    /// Total decoding from an arbitrary JSON value. `null` means no body.
    pub fn from_value(value: Value) -> Option<Self> {
        if value.is_null() {
            return None;
        }
        let (kind, data) = match split_tagged(value) {
            Ok(parts) => parts,
            Err(untagged) => return Some(RequestVariant::Other(Some(untagged))),
        };
        let variant = match kind.as_str() {
            "chat" => typed(&kind, data).map(RequestVariant::Chat),
            "completion" => typed(&kind, data).map(RequestVariant::Completion),
            "embedding" => typed(&kind, data).map(RequestVariant::Embedding),
            "rerank" => typed(&kind, data).map(RequestVariant::Rerank),
            _ => Err(data),
        };
        Some(variant.unwrap_or_else(|data| RequestVariant::Other(other_payload(data))))
    }

    pub fn kind(&self) -> RequestKind {
        match self {
            RequestVariant::Chat(_) => RequestKind::Chat,
            RequestVariant::Completion(_) => RequestKind::Completion,
            RequestVariant::Embedding(_) => RequestKind::Embedding,
            RequestVariant::Rerank(_) => RequestKind::Rerank,
            RequestVariant::Other(_) => RequestKind::Other,
        }
    }

    /// Model named in the payload, if any.
    pub fn model(&self) -> Option<&str> {
        let model = match self {
            RequestVariant::Chat(r) => r.model.as_deref(),
            RequestVariant::Completion(r) => r.model.as_deref(),
            RequestVariant::Embedding(r) => r.model.as_deref(),
            RequestVariant::Rerank(r) => r.model.as_deref(),
            RequestVariant::Other(v) => v.as_ref().and_then(|v| v.get("model")).and_then(Value::as_str),
        };
        model.filter(|m| !m.is_empty())
    }
}

impl ResponseVariant {
    /// Total decoding from an arbitrary JSON value. `null` means no body.
    pub fn from_value(value: Value) -> Option<Self> {
        if value.is_null() {
            return None;
        }
        let (kind, data) = match split_tagged(value) {
            Ok(parts) => parts,
            Err(untagged) => return Some(ResponseVariant::Other(Some(untagged))),
        };
        let variant = match kind.as_str() {
            "chat-single" => typed(&kind, data).map(ResponseVariant::ChatSingle),
            "chat-stream" => typed(&kind, data).map(ResponseVariant::ChatStream),
            "completion" => typed(&kind, data).map(ResponseVariant::Completion),
            "embedding" => typed(&kind, data).map(ResponseVariant::Embedding),
            "rerank" => typed(&kind, data).map(ResponseVariant::Rerank),
            _ => Err(data),
        };
        Some(variant.unwrap_or_else(|data| ResponseVariant::Other(other_payload(data))))
    }

    pub fn kind(&self) -> ResponseKind {
        match self {
            ResponseVariant::ChatSingle(_) => ResponseKind::ChatSingle,
            ResponseVariant::ChatStream(_) => ResponseKind::ChatStream,
            ResponseVariant::Completion(_) => ResponseKind::Completion,
            ResponseVariant::Embedding(_) => ResponseKind::Embedding,
            ResponseVariant::Rerank(_) => ResponseKind::Rerank,
            ResponseVariant::Other(_) => ResponseKind::Other,
        }
    }
}

impl<'de> Deserialize<'de> for RequestVariant {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let value = Value::deserialize(deserializer)?;
        Ok(Self::from_value(value).unwrap_or(RequestVariant::Other(None)))
    }
}

impl<'de> Deserialize<'de> for ResponseVariant {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let value = Value::deserialize(deserializer)?;
        Ok(Self::from_value(value).unwrap_or(ResponseVariant::Other(None)))
    }
}
