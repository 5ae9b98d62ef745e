//! # Orchestration
//!
//! Sequences one transfer run: read the job configuration, fetch in batches,
//! clean, write each destination, report.
//!
//! ## Core Components
//!
//! - **PipelineContext**: settings, client, rate limiter and retry executor for a run
//! - **PipelineStateMachine**: guarded lifecycle transitions with history
//! - **TransferOrchestrator**: drives a run and always returns a [`RunReport`]

pub mod context;
pub mod orchestrator;
pub mod state;

pub use context::PipelineContext;
pub use orchestrator::{RunReport, TransferOrchestrator};
pub use state::{PipelineState, PipelineStateMachine};
