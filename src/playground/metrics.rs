//! Per-message timing and token metrics.

use crate::stream::ChunkAggregator;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tokio::time::Instant;

/// Metrics attached to one completed assistant message.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MessageMetrics {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub time_to_first_token_ms: Option<u64>,
    pub total_time_ms: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub total_tokens: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub input_tokens: Option<u64>,
    /// `total_tokens` was estimated from the delta count because the stream carried no usage.
    #[serde(default)]
    pub token_count_is_approximate: bool,
}

impl MessageMetrics {
    /// `total_tokens / (total_time_ms / 1000)`; `None` if tokens are unknown or no time elapsed.
    pub fn tokens_per_second(&self) -> Option<f64> {
        let tokens = self.total_tokens?;
        if self.total_time_ms == 0 {
            return None;
        }
        Some(tokens as f64 / (self.total_time_ms as f64 / 1000.0))
    }
}

/// Clock for one streaming round.
#[derive(Debug, Clone, Copy)]
pub struct MetricsRecorder {
    started: Instant,
    first_token: Option<Duration>,
}

impl MetricsRecorder {
    pub fn start() -> Self {
        Self {
            started: Instant::now(),
            first_token: None,
        }
    }

    /// Record time-to-first-token. Only the first call counts.
    pub fn mark_first_token(&mut self) {
        if self.first_token.is_none() {
            self.first_token = Some(self.started.elapsed());
        }
    }

    pub fn finish(&self, aggregator: &ChunkAggregator) -> MessageMetrics {
        let usage = aggregator.usage();
        let (total_tokens, approximate) = match usage {
            Some(u) => (Some(u.total_tokens), false),
            None if aggregator.delta_count() > 0 => (Some(aggregator.delta_count() as u64), true),
            None => (None, false),
        };
        MessageMetrics {
            time_to_first_token_ms: self.first_token.map(|d| d.as_millis() as u64),
            total_time_ms: self.started.elapsed().as_millis() as u64,
            total_tokens,
            input_tokens: usage.map(|u| u.prompt_tokens),
            token_count_is_approximate: approximate,
        }
    }
}
