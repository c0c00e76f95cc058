use crate::types::SessionEvent;
use std::sync::Arc;

/// Receiver of incremental session updates (the presentation layer).
///
/// Called synchronously from the streaming round, never while session state is locked.
pub trait SessionObserver: Send + Sync {
    fn on_event(&self, event: SessionEvent);
}

/// Discards every event.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopObserver;

impl SessionObserver for NoopObserver {
    fn on_event(&self, _event: SessionEvent) {}
}

pub fn noop_observer() -> Arc<dyn SessionObserver> {
    Arc::new(NoopObserver)
}
