//! Unified token usage.

use serde::{Deserialize, Deserializer, Serialize};

/// Token counts in one shape for every request kind.
///
/// All three fields are always present. Kinds that report fewer counters
/// (embeddings, rerank) fill the missing ones with 0.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenUsage {
    #[serde(default, deserialize_with = "u64_or_null")]
    pub prompt_tokens: u64,
    #[serde(default, deserialize_with = "u64_or_null")]
    pub completion_tokens: u64,
    #[serde(default, deserialize_with = "u64_or_null")]
    pub total_tokens: u64,
}

impl TokenUsage {
    pub fn new(prompt_tokens: u64, completion_tokens: u64, total_tokens: u64) -> Self {
        Self {
            prompt_tokens,
            completion_tokens,
            total_tokens,
        }
    }

    /// Input-only usage (embeddings): completion is forced to 0.
    pub fn input_only(prompt_tokens: u64, total_tokens: u64) -> Self {
        Self::new(prompt_tokens, 0, total_tokens)
    }

    /// Total-only usage (rerank): prompt and completion are forced to 0.
    pub fn total_only(total_tokens: u64) -> Self {
        Self::new(0, 0, total_tokens)
    }

    /// Add another usage block, saturating at `u64::MAX` (counts come from upstream payloads).
    pub fn add(&mut self, other: &TokenUsage) {
        self.prompt_tokens = self.prompt_tokens.saturating_add(other.prompt_tokens);
        self.completion_tokens = self
            .completion_tokens
            .saturating_add(other.completion_tokens);
        self.total_tokens = self.total_tokens.saturating_add(other.total_tokens);
    }
}

pub(crate) fn u64_or_null<'de, D>(deserializer: D) -> Result<u64, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<u64>::deserialize(deserializer)?.unwrap_or(0))
}
