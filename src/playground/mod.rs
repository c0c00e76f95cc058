//! 对比测试模块：并行驱动主模型与对比模型两个流式会话。
//!
//! # Playground
//!
//! Drives up to two independent streaming chat sessions (primary and comparison),
//! publishing partial text, completion metrics and errors to a [`SessionObserver`].
//!
//! | Component | Description |
//! |-----------|-------------|
//! | [`Orchestrator`] | Owns both sessions; send, cancel, reset |
//! | [`StreamSession`] | State, history and pending text of one slot |
//! | [`MessageMetrics`] | TTFT, total time, tokens, derived tokens/second |
//! | [`CancelHandle`] | Per-round cancellation token |
//! | [`SessionObserver`] | Presentation callback |
//!
//! ```rust,no_run
//! use ai_traffic_rust::playground::{Orchestrator, Slot};
//! use ai_traffic_rust::transport::HttpChatTransport;
//! use std::sync::Arc;
//!
//! #[tokio::main]
//! async fn main() -> ai_traffic_rust::Result<()> {
//!     let orch = Orchestrator::builder()
//!         .transport(Arc::new(HttpChatTransport::from_env()?))
//!         .primary_model("gpt-4o-mini")
//!         .comparison_model("llama-3.1-8b")
//!         .build()?;
//!
//!     let outcome = orch.send_unified("Explain backpressure in one sentence.").await;
//!     println!("{:?}", outcome.get(Slot::Primary));
//!     Ok(())
//! }
//! ```

pub mod cancel;
pub mod metrics;
pub mod observer;
pub mod orchestrator;
pub mod session;

pub use cancel::CancelHandle;
pub use metrics::{MessageMetrics, MetricsRecorder};
pub use observer::{noop_observer, NoopObserver, SessionObserver};
pub use orchestrator::{
    Orchestrator, OrchestratorBuilder, SessionOutcome, UnifiedOutcome, CANCELLED_NOTICE,
    INCOMPLETE_STREAM,
};
pub use session::{SessionMessage, SessionSnapshot, SessionState, Slot, StreamSession};
