//! Presentation events published by playground sessions

use crate::playground::{MessageMetrics, SessionState, Slot};
use crate::types::message::ChatMessage;
use serde::{Deserialize, Serialize};

/// Unified session event enum
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event_type")]
pub enum SessionEvent {
    /// Session moved to a new state
    #[serde(rename = "StateChanged")]
    StateChanged { slot: Slot, state: SessionState },

    /// Accumulated assistant text so far (not just the newest delta)
    #[serde(rename = "PartialText")]
    PartialText { slot: Slot, text: String },

    /// Finished assistant message, appended to history
    #[serde(rename = "MessageCompleted")]
    MessageCompleted {
        slot: Slot,
        message: ChatMessage,
        metrics: MessageMetrics,
    },

    /// User-initiated cancellation notice
    #[serde(rename = "Cancelled")]
    Cancelled { slot: Slot, notice: String },

    /// Transport or stream failure for this session only
    #[serde(rename = "Errored")]
    Errored { slot: Slot, message: String },
}

impl SessionEvent {
    pub fn slot(&self) -> Slot {
        match self {
            SessionEvent::StateChanged { slot, .. }
            | SessionEvent::PartialText { slot, .. }
            | SessionEvent::MessageCompleted { slot, .. }
            | SessionEvent::Cancelled { slot, .. }
            | SessionEvent::Errored { slot, .. } => *slot,
        }
    }
}
