//! Dual-session stream orchestrator.
//!
//! Each slot's state sits behind its own lock, which is never held across an await; the
//! only suspension points of a round are opening the stream and waiting for the next
//! frame. Before any frame mutates a session the round re-checks, under the lock, that
//! it is still the session's current round and has not been cancelled.
//!
//! Observer events are queued in a per-slot outbox while the session lock is held, so
//! they follow the order of the state transitions they describe, and are delivered by
//! a single drainer with no lock held.

use super::cancel::CancelHandle;
use super::metrics::{MessageMetrics, MetricsRecorder};
use super::observer::{noop_observer, SessionObserver};
use super::session::{SessionMessage, SessionSnapshot, SessionState, Slot, StreamSession};
use crate::error::{Error, ErrorContext};
use crate::stream::{ChunkAggregator, FrameOutcome};
use crate::transport::{ChatStreamRequest, ChatTransport};
use crate::types::{ChatMessage, MessageContent, MessageRole, SessionEvent};
use crate::Result;
use futures::future::OptionFuture;
use futures::StreamExt;
use parking_lot::Mutex;
use std::collections::VecDeque;
use std::sync::Arc;
use tracing::{debug, info, warn};

pub const CANCELLED_NOTICE: &str = "Message cancelled";
pub const INCOMPLETE_STREAM: &str = "stream ended before completion";

/// How one send round ended.
#[derive(Debug, Clone, PartialEq)]
pub enum SessionOutcome {
    Completed(MessageMetrics),
    Cancelled,
    Errored(String),
    /// The session was reset underneath the round (model switch or clear).
    Superseded,
}

impl SessionOutcome {
    pub fn is_completed(&self) -> bool {
        matches!(self, SessionOutcome::Completed(_))
    }
}

/// Per-slot results of [`Orchestrator::send_unified`]. `None` for a slot with no model.
#[derive(Debug)]
pub struct UnifiedOutcome {
    pub primary: Option<Result<SessionOutcome>>,
    pub comparison: Option<Result<SessionOutcome>>,
}

impl UnifiedOutcome {
    pub fn get(&self, slot: Slot) -> Option<&Result<SessionOutcome>> {
        match slot {
            Slot::Primary => self.primary.as_ref(),
            Slot::Comparison => self.comparison.as_ref(),
        }
    }
}

/// Identity of one in-flight round.
struct Round {
    slot: Slot,
    generation: u64,
    cancel: CancelHandle,
}

#[derive(Default)]
struct Outbox {
    queue: VecDeque<SessionEvent>,
    draining: bool,
}

pub struct Orchestrator {
    transport: Arc<dyn ChatTransport>,
    observer: Arc<dyn SessionObserver>,
    shared_system_prompt: Mutex<Option<String>>,
    sessions: [Mutex<StreamSession>; 2],
    outboxes: [Mutex<Outbox>; 2],
}

impl Orchestrator {
    pub fn builder() -> OrchestratorBuilder {
        OrchestratorBuilder::new()
    }

    fn session(&self, slot: Slot) -> &Mutex<StreamSession> {
        &self.sessions[slot.index()]
    }

    /// Queue events for `slot`. Call with the slot's session lock held.
    fn enqueue(&self, slot: Slot, events: impl IntoIterator<Item = SessionEvent>) {
        self.outboxes[slot.index()].lock().queue.extend(events);
    }

    /// Deliver queued events in order. A caller that finds another drainer running
    /// (another task, or an observer re-entering) leaves its events to that drainer.
    fn flush(&self, slot: Slot) {
        let outbox = &self.outboxes[slot.index()];
        {
            let mut out = outbox.lock();
            if out.draining {
                return;
            }
            out.draining = true;
        }
        loop {
            let next = {
                let mut out = outbox.lock();
                let next = out.queue.pop_front();
                if next.is_none() {
                    out.draining = false;
                }
                next
            };
            match next {
                Some(event) => self.observer.on_event(event),
                None => return,
            }
        }
    }

    pub fn snapshot(&self, slot: Slot) -> SessionSnapshot {
        self.session(slot).lock().snapshot(slot)
    }

    pub fn state(&self, slot: Slot) -> SessionState {
        self.session(slot).lock().state
    }

    pub fn model(&self, slot: Slot) -> Option<String> {
        self.session(slot).lock().model.clone()
    }

    /// Select the model for a slot. A different model resets the slot (in-flight round
    /// dropped, history cleared); `None` leaves the slot unconfigured.
    pub fn set_model(&self, slot: Slot, model: Option<String>) {
        let model = model.filter(|m| !m.trim().is_empty());
        {
            let mut session = self.session(slot).lock();
            if session.model == model {
                return;
            }
            session.reset();
            session.model = model.clone();
            self.enqueue(slot, [state_changed(slot, SessionState::Idle)]);
        }
        info!(slot = %slot, model = ?model, "session model changed");
        self.flush(slot);
    }

    /// Per-slot system prompt; takes precedence over the shared one.
    pub fn set_system_prompt(&self, slot: Slot, prompt: Option<String>) {
        self.session(slot).lock().system_prompt = prompt.filter(|p| !p.is_empty());
    }

    pub fn set_shared_system_prompt(&self, prompt: Option<String>) {
        *self.shared_system_prompt.lock() = prompt.filter(|p| !p.is_empty());
    }

    /// Send a user message to one slot and drive the round to its end.
    ///
    /// `Err` only for caller mistakes (no model selected, round already in flight);
    /// transport failures come back as [`SessionOutcome::Errored`].
    pub async fn send(
        &self,
        slot: Slot,
        content: impl Into<MessageContent>,
    ) -> Result<SessionOutcome> {
        let message = ChatMessage::with_content(MessageRole::User, content.into());
        self.send_message(slot, message).await
    }

    /// Send one user message to every configured slot concurrently.
    pub async fn send_unified(&self, content: impl Into<MessageContent>) -> UnifiedOutcome {
        let message = ChatMessage::with_content(MessageRole::User, content.into());
        let configured = |slot: Slot| self.session(slot).lock().model.is_some();

        let primary: OptionFuture<_> = configured(Slot::Primary)
            .then(|| self.send_message(Slot::Primary, message.clone()))
            .into();
        let comparison: OptionFuture<_> = configured(Slot::Comparison)
            .then(|| self.send_message(Slot::Comparison, message.clone()))
            .into();
        let (primary, comparison) = futures::join!(primary, comparison);
        UnifiedOutcome {
            primary,
            comparison,
        }
    }

    async fn send_message(&self, slot: Slot, message: ChatMessage) -> Result<SessionOutcome> {
        let shared_prompt = self.shared_system_prompt.lock().clone();
        let cancel = CancelHandle::new();

        let (request, generation) = {
            let mut session = self.session(slot).lock();
            let model = session.model.clone().ok_or_else(|| {
                Error::configuration_with_context(
                    "no model selected",
                    ErrorContext::new()
                        .with_field_path(format!("slot.{}", slot))
                        .with_source("orchestrator"),
                )
            })?;
            if session.state.is_in_flight() {
                return Err(Error::validation_with_context(
                    "a message is already in flight for this session",
                    ErrorContext::new()
                        .with_field_path(format!("slot.{}", slot))
                        .with_source("orchestrator"),
                ));
            }

            session.messages.push(SessionMessage::new(message));

            let mut outbound = Vec::with_capacity(session.messages.len() + 1);
            if let Some(prompt) = session.system_prompt.clone().or(shared_prompt) {
                outbound.push(ChatMessage::system(prompt));
            }
            outbound.extend(session.messages.iter().map(|m| m.message.clone()));

            session.state = SessionState::Sending;
            session.pending_text.clear();
            session.last_error = None;
            session.cancel = Some(cancel.clone());
            self.enqueue(slot, [state_changed(slot, SessionState::Sending)]);
            (ChatStreamRequest::new(model, outbound), session.generation)
        };
        self.flush(slot);
        debug!(slot = %slot, model = %request.model, messages = request.messages.len(), "round started");

        let round = Round {
            slot,
            generation,
            cancel,
        };
        Ok(self.drive(&round, request).await)
    }

    async fn drive(&self, round: &Round, request: ChatStreamRequest) -> SessionOutcome {
        let mut recorder = MetricsRecorder::start();

        let opened = tokio::select! {
            biased;
            _ = round.cancel.cancelled() => return self.interrupted(round),
            opened = self.transport.stream_chat(request, round.cancel.clone()) => opened,
        };
        let mut stream = match opened {
            Ok(stream) => stream,
            Err(e) => return self.fail(round, e.to_string()),
        };

        let mut aggregator = ChunkAggregator::new();
        loop {
            let next = tokio::select! {
                biased;
                _ = round.cancel.cancelled() => return self.interrupted(round),
                next = stream.next() => next,
            };
            let frame = match next {
                Some(Ok(frame)) => frame,
                Some(Err(e)) => return self.fail(round, e.to_string()),
                None => return self.fail(round, INCOMPLETE_STREAM.to_string()),
            };

            match aggregator.push(&frame) {
                FrameOutcome::Terminated => return self.complete(round, aggregator, &recorder),
                FrameOutcome::IgnoredAfterTerminal => continue,
                FrameOutcome::NoContent => {
                    if !self.apply_chunk(round, None) {
                        return self.interrupted(round);
                    }
                }
                FrameOutcome::Appended => {
                    recorder.mark_first_token();
                    if !self.apply_chunk(round, Some(aggregator.text())) {
                        return self.interrupted(round);
                    }
                }
            }
        }
    }

    /// Run `f` on the session if `round` is still its live round.
    fn with_current<R>(
        &self,
        round: &Round,
        f: impl FnOnce(&mut StreamSession) -> R,
    ) -> Option<R> {
        let mut session = self.session(round.slot).lock();
        if session.generation != round.generation || round.cancel.is_cancelled() {
            return None;
        }
        Some(f(&mut session))
    }

    /// Move to `streaming` on the first frame and publish the accumulated text.
    fn apply_chunk(&self, round: &Round, text: Option<&str>) -> bool {
        let slot = round.slot;
        let applied = self.with_current(round, |session| {
            if session.state == SessionState::Sending {
                self.enqueue(slot, [state_changed(slot, SessionState::Streaming)]);
            }
            session.state = SessionState::Streaming;
            if let Some(text) = text {
                session.pending_text.clear();
                session.pending_text.push_str(text);
                self.enqueue(
                    slot,
                    [SessionEvent::PartialText {
                        slot,
                        text: text.to_string(),
                    }],
                );
            }
        });
        self.flush(slot);
        applied.is_some()
    }

    fn complete(
        &self,
        round: &Round,
        aggregator: ChunkAggregator,
        recorder: &MetricsRecorder,
    ) -> SessionOutcome {
        let metrics = recorder.finish(&aggregator);
        let reply = ChatMessage::assistant(aggregator.into_text());
        let slot = round.slot;
        let appended = self.with_current(round, |session| {
            session
                .messages
                .push(SessionMessage::with_metrics(reply.clone(), metrics.clone()));
            session.pending_text.clear();
            session.cancel = None;
            session.state = SessionState::Idle;
            self.enqueue(
                slot,
                [
                    SessionEvent::MessageCompleted {
                        slot,
                        message: reply.clone(),
                        metrics: metrics.clone(),
                    },
                    state_changed(slot, SessionState::Completed),
                    state_changed(slot, SessionState::Idle),
                ],
            );
        });
        if appended.is_none() {
            return self.interrupted(round);
        }
        self.flush(slot);

        debug!(
            slot = %round.slot,
            total_ms = metrics.total_time_ms,
            ttft_ms = ?metrics.time_to_first_token_ms,
            tokens = ?metrics.total_tokens,
            "round completed"
        );
        SessionOutcome::Completed(metrics)
    }

    fn fail(&self, round: &Round, message: String) -> SessionOutcome {
        let slot = round.slot;
        let applied = self.with_current(round, |session| {
            session.state = SessionState::Errored;
            session.pending_text.clear();
            session.cancel = None;
            session.last_error = Some(message.clone());
            self.enqueue(
                slot,
                [
                    state_changed(slot, SessionState::Errored),
                    SessionEvent::Errored {
                        slot,
                        message: message.clone(),
                    },
                ],
            );
        });
        if applied.is_none() {
            return self.interrupted(round);
        }
        warn!(slot = %slot, error = %message, "round failed");
        self.flush(slot);
        SessionOutcome::Errored(message)
    }

    /// Outcome of a round that lost its session: reset underneath it, or cancelled.
    fn interrupted(&self, round: &Round) -> SessionOutcome {
        let generation = self.session(round.slot).lock().generation;
        if generation != round.generation {
            debug!(slot = %round.slot, "round superseded by session reset");
            SessionOutcome::Superseded
        } else {
            SessionOutcome::Cancelled
        }
    }

    /// Cancel the slot's in-flight round. Returns `false` (and does nothing) when idle.
    pub fn cancel(&self, slot: Slot) -> bool {
        {
            let mut session = self.session(slot).lock();
            if !session.state.is_in_flight() {
                return false;
            }
            if let Some(handle) = session.cancel.take() {
                handle.cancel();
            }
            session.state = SessionState::Cancelled;
            session.pending_text.clear();
            self.enqueue(
                slot,
                [
                    state_changed(slot, SessionState::Cancelled),
                    SessionEvent::Cancelled {
                        slot,
                        notice: CANCELLED_NOTICE.to_string(),
                    },
                ],
            );
        }
        info!(slot = %slot, "round cancelled");
        self.flush(slot);
        true
    }

    /// Drop the slot's history (and any in-flight round), keeping its model.
    pub fn clear(&self, slot: Slot) {
        {
            let mut session = self.session(slot).lock();
            session.reset();
            self.enqueue(slot, [state_changed(slot, SessionState::Idle)]);
        }
        self.flush(slot);
    }

    pub fn clear_all(&self) {
        for slot in Slot::ALL {
            self.clear(slot);
        }
    }

    /// Cancel every in-flight round.
    pub fn shutdown(&self) {
        for slot in Slot::ALL {
            self.cancel(slot);
        }
    }
}

impl Drop for Orchestrator {
    fn drop(&mut self) {
        for session in &self.sessions {
            if let Some(handle) = session.lock().cancel.take() {
                handle.cancel();
            }
        }
    }
}

fn state_changed(slot: Slot, state: SessionState) -> SessionEvent {
    SessionEvent::StateChanged { slot, state }
}

/// Builder for [`Orchestrator`].
pub struct OrchestratorBuilder {
    transport: Option<Arc<dyn ChatTransport>>,
    observer: Arc<dyn SessionObserver>,
    shared_system_prompt: Option<String>,
    primary_model: Option<String>,
    comparison_model: Option<String>,
}

impl OrchestratorBuilder {
    pub fn new() -> Self {
        Self {
            transport: None,
            observer: noop_observer(),
            shared_system_prompt: None,
            primary_model: None,
            comparison_model: None,
        }
    }

    pub fn transport(mut self, transport: Arc<dyn ChatTransport>) -> Self {
        self.transport = Some(transport);
        self
    }

    /// Inject the presentation observer. Default drops every event.
    pub fn observer(mut self, observer: Arc<dyn SessionObserver>) -> Self {
        self.observer = observer;
        self
    }

    pub fn shared_system_prompt(mut self, prompt: impl Into<String>) -> Self {
        self.shared_system_prompt = Some(prompt.into());
        self
    }

    pub fn primary_model(mut self, model: impl Into<String>) -> Self {
        self.primary_model = Some(model.into());
        self
    }

    pub fn comparison_model(mut self, model: impl Into<String>) -> Self {
        self.comparison_model = Some(model.into());
        self
    }

    pub fn build(self) -> Result<Orchestrator> {
        let transport = self.transport.ok_or_else(|| {
            Error::configuration_with_context(
                "a chat transport is required",
                ErrorContext::new()
                    .with_field_path("transport")
                    .with_source("orchestrator_builder"),
            )
        })?;
        Ok(Orchestrator {
            transport,
            observer: self.observer,
            shared_system_prompt: Mutex::new(self.shared_system_prompt),
            sessions: [
                Mutex::new(StreamSession::with_model(self.primary_model)),
                Mutex::new(StreamSession::with_model(self.comparison_model)),
            ],
            outboxes: Default::default(),
        })
    }
}

impl Default for OrchestratorBuilder {
    fn default() -> Self {
        Self::new()
    }
}
