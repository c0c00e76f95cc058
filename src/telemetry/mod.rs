//! 遥测模块：日志初始化与会话事件观察者。
//!
//! Telemetry: tracing setup and ready-made [`SessionObserver`] implementations.
//!
//! Nothing here is installed implicitly; applications opt in.
//!
//! | Component | Description |
//! |-----------|-------------|
//! | [`init_tracing`] | fmt subscriber filtered by `RUST_LOG` (default `info`) |
//! | [`TracingObserver`] | Logs every session event |
//! | [`InMemoryObserver`] | Bounded in-memory event log, for tests and UIs polling state |
//! | [`CompositeObserver`] | Fans events out to several observers |

pub use crate::playground::{noop_observer, NoopObserver, SessionObserver};

use crate::playground::Slot;
use crate::types::SessionEvent;
use parking_lot::RwLock;
use std::sync::Arc;
use tracing::{debug, info, warn};
use tracing_subscriber::EnvFilter;

/// Install a global fmt subscriber. Returns `false` if one was already installed.
pub fn init_tracing() -> bool {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .try_init()
        .is_ok()
}

/// Logs session events: partial text at debug, lifecycle at info, errors at warn.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingObserver;

impl SessionObserver for TracingObserver {
    fn on_event(&self, event: SessionEvent) {
        match &event {
            SessionEvent::StateChanged { slot, state } => {
                debug!(slot = %slot, state = ?state, "session state changed")
            }
            SessionEvent::PartialText { slot, text } => {
                debug!(slot = %slot, chars = text.chars().count(), "partial text")
            }
            SessionEvent::MessageCompleted { slot, metrics, .. } => info!(
                slot = %slot,
                total_ms = metrics.total_time_ms,
                ttft_ms = ?metrics.time_to_first_token_ms,
                tokens = ?metrics.total_tokens,
                approximate = metrics.token_count_is_approximate,
                "message completed"
            ),
            SessionEvent::Cancelled { slot, notice } => info!(slot = %slot, "{}", notice),
            SessionEvent::Errored { slot, message } => {
                warn!(slot = %slot, error = %message, "session errored")
            }
        }
    }
}

/// Bounded in-memory event log. Oldest events are dropped past `max_events`.
pub struct InMemoryObserver {
    events: RwLock<Vec<SessionEvent>>,
    max_events: usize,
}

impl InMemoryObserver {
    pub fn new(max_events: usize) -> Self {
        Self {
            events: RwLock::new(Vec::new()),
            max_events: max_events.max(1),
        }
    }

    pub fn events(&self) -> Vec<SessionEvent> {
        self.events.read().clone()
    }

    pub fn events_for(&self, slot: Slot) -> Vec<SessionEvent> {
        self.events
            .read()
            .iter()
            .filter(|e| e.slot() == slot)
            .cloned()
            .collect()
    }

    /// Every published partial text for `slot`, in order.
    pub fn partial_texts(&self, slot: Slot) -> Vec<String> {
        self.events
            .read()
            .iter()
            .filter_map(|e| match e {
                SessionEvent::PartialText { slot: s, text } if *s == slot => Some(text.clone()),
                _ => None,
            })
            .collect()
    }

    pub fn clear(&self) {
        self.events.write().clear();
    }

    pub fn len(&self) -> usize {
        self.events.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Default for InMemoryObserver {
    fn default() -> Self {
        Self::new(10_000)
    }
}

impl SessionObserver for InMemoryObserver {
    fn on_event(&self, event: SessionEvent) {
        let mut events = self.events.write();
        events.push(event);
        if events.len() > self.max_events {
            events.remove(0);
        }
    }
}

/// Forwards each event to every inner observer, in insertion order.
#[derive(Default)]
pub struct CompositeObserver {
    observers: Vec<Arc<dyn SessionObserver>>,
}

impl CompositeObserver {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_observer(mut self, observer: Arc<dyn SessionObserver>) -> Self {
        self.observers.push(observer);
        self
    }
}

impl SessionObserver for CompositeObserver {
    fn on_event(&self, event: SessionEvent) {
        for observer in &self.observers {
            observer.on_event(event.clone());
        }
    }
}
