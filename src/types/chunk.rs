//! Incremental chat completion chunks and the terminal sentinel.

use super::usage::TokenUsage;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// Wire value of the out-of-band terminal marker.
pub const DONE_SENTINEL: &str = "[DONE]";

/// One `chat.completion.chunk` object.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ChatCompletionChunk {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,
    #[serde(default)]
    pub choices: Vec<ChunkChoice>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub usage: Option<TokenUsage>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ChunkChoice {
    #[serde(default)]
    pub index: u32,
    #[serde(default)]
    pub delta: ChunkDelta,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub finish_reason: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ChunkDelta {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub role: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
}

impl ChatCompletionChunk {
    /// A chunk whose first choice carries `text` as its delta.
    pub fn delta(text: impl Into<String>) -> Self {
        Self {
            choices: vec![ChunkChoice {
                index: 0,
                delta: ChunkDelta {
                    role: None,
                    content: Some(text.into()),
                },
                finish_reason: None,
            }],
            ..Default::default()
        }
    }

    /// A choice-less chunk carrying only a usage block.
    pub fn usage_only(usage: TokenUsage) -> Self {
        Self {
            usage: Some(usage),
            ..Default::default()
        }
    }

    pub fn with_usage(mut self, usage: TokenUsage) -> Self {
        self.usage = Some(usage);
        self
    }

    /// Non-empty delta text of the first choice.
    pub fn delta_text(&self) -> Option<&str> {
        self.choices
            .first()
            .and_then(|c| c.delta.content.as_deref())
            .filter(|s| !s.is_empty())
    }
}

/// One element of a chat stream: a chunk, or the terminal sentinel.
///
/// In logged payloads the sentinel is the JSON string `"[DONE]"`.
#[derive(Debug, Clone, PartialEq)]
pub enum StreamFrame {
    Chunk(ChatCompletionChunk),
    Done,
}

impl From<ChatCompletionChunk> for StreamFrame {
    fn from(chunk: ChatCompletionChunk) -> Self {
        StreamFrame::Chunk(chunk)
    }
}

impl Serialize for StreamFrame {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            StreamFrame::Chunk(chunk) => chunk.serialize(serializer),
            StreamFrame::Done => serializer.serialize_str(DONE_SENTINEL),
        }
    }
}

impl<'de> Deserialize<'de> for StreamFrame {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let value = serde_json::Value::deserialize(deserializer)?;
        match value {
            serde_json::Value::String(s) if s.trim() == DONE_SENTINEL => Ok(StreamFrame::Done),
            other => serde_json::from_value(other)
                .map(StreamFrame::Chunk)
                .map_err(serde::de::Error::custom),
        }
    }
}
