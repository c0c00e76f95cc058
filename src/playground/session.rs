use super::cancel::CancelHandle;
use super::metrics::MessageMetrics;
use crate::types::ChatMessage;
use serde::{Deserialize, Serialize};

/// Which of the two comparison sessions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Slot {
    Primary,
    Comparison,
}

impl Slot {
    pub const ALL: [Slot; 2] = [Slot::Primary, Slot::Comparison];

    pub(crate) fn index(self) -> usize {
        match self {
            Slot::Primary => 0,
            Slot::Comparison => 1,
        }
    }
}

impl std::fmt::Display for Slot {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Slot::Primary => f.write_str("primary"),
            Slot::Comparison => f.write_str("comparison"),
        }
    }
}

/// `idle → sending → streaming → {completed | cancelled | errored}`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SessionState {
    #[default]
    Idle,
    Sending,
    Streaming,
    Completed,
    Cancelled,
    Errored,
}

impl SessionState {
    pub fn is_in_flight(self) -> bool {
        matches!(self, SessionState::Sending | SessionState::Streaming)
    }
}

/// A history entry. Only assistant messages carry metrics.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionMessage {
    pub message: ChatMessage,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metrics: Option<MessageMetrics>,
}

impl SessionMessage {
    pub fn new(message: ChatMessage) -> Self {
        Self {
            message,
            metrics: None,
        }
    }

    pub fn with_metrics(message: ChatMessage, metrics: MessageMetrics) -> Self {
        Self {
            message,
            metrics: Some(metrics),
        }
    }
}

/// One conversation thread with a single model.
///
/// `generation` is bumped whenever the session is reset underneath an in-flight round
/// (model switch, clear), so that round's late chunks can be recognised and dropped.
#[derive(Debug, Default)]
pub struct StreamSession {
    pub(crate) state: SessionState,
    pub(crate) model: Option<String>,
    pub(crate) system_prompt: Option<String>,
    pub(crate) messages: Vec<SessionMessage>,
    pub(crate) pending_text: String,
    pub(crate) last_error: Option<String>,
    pub(crate) cancel: Option<CancelHandle>,
    pub(crate) generation: u64,
}

impl StreamSession {
    pub(crate) fn with_model(model: Option<String>) -> Self {
        Self {
            model,
            ..Default::default()
        }
    }

    /// Drop history and any in-flight round; model and system prompt are kept.
    pub(crate) fn reset(&mut self) {
        if let Some(handle) = self.cancel.take() {
            handle.cancel();
        }
        self.generation += 1;
        self.state = SessionState::Idle;
        self.messages.clear();
        self.pending_text.clear();
        self.last_error = None;
    }

    pub(crate) fn snapshot(&self, slot: Slot) -> SessionSnapshot {
        SessionSnapshot {
            slot,
            state: self.state,
            model: self.model.clone(),
            system_prompt: self.system_prompt.clone(),
            messages: self.messages.clone(),
            pending_text: self.pending_text.clone(),
            last_error: self.last_error.clone(),
        }
    }
}

/// Point-in-time copy of a session for presentation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionSnapshot {
    pub slot: Slot,
    pub state: SessionState,
    pub model: Option<String>,
    pub system_prompt: Option<String>,
    pub messages: Vec<SessionMessage>,
    pub pending_text: String,
    pub last_error: Option<String>,
}
