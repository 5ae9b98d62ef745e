#![allow(clippy::doc_markdown)] // Allow technical terms like A1 notation in docs
#![allow(clippy::missing_errors_doc)] // Allow public functions without # Errors sections
#![allow(clippy::must_use_candidate)] // Allow methods without must_use when context is clear

//! # Sheet Transfer
//!
//! Batch data transfer between spreadsheet-like remote tables.
//!
//! ## Overview
//!
//! A configuration table lists jobs, one per row: a source table and range to
//! read, and a destination table and range to write. A run fetches every job
//! concurrently in fixed-size batches, tags each fetched row with the job's
//! provenance, cleans the aggregate and replaces each destination's contents
//! in chunks. All calls to the remote service share one rate limiter and go
//! through bounded retry with capped exponential backoff.
//!
//! ## Module Organization
//!
//! - [`client`] - The remote table capability and an in-memory implementation
//! - [`config`] - Layered configuration (defaults, TOML files, environment)
//! - [`resilience`] - Rate limiting and retry
//! - [`transfer`] - Jobs, batch fetching, cleaning, chunked writes, status log
//! - [`orchestration`] - Run context, state machine and orchestrator
//! - [`range`] - A1 range parsing
//! - [`error`] - Structured error handling
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use sheet_transfer::client::InMemoryTableClient;
//! use sheet_transfer::config::ConfigManager;
//! use sheet_transfer::orchestration::{PipelineContext, TransferOrchestrator};
//! use std::sync::Arc;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! sheet_transfer::logging::init_structured_logging();
//!
//! let manager = ConfigManager::load()?;
//! let client = Arc::new(InMemoryTableClient::new());
//! let context = PipelineContext::from_manager(&manager, client);
//!
//! let report = TransferOrchestrator::new(context).run().await;
//! println!("{} rows written", report.statistics.rows_written);
//! report.into_result()?;
//! # Ok(())
//! # }
//! ```
//!
//! ## Testing
//!
//! ```bash
//! cargo test --lib    # Unit tests
//! cargo test          # Unit and end-to-end tests
//! ```

pub mod client;
pub mod config;
pub mod constants;
pub mod error;
pub mod logging;
pub mod orchestration;
pub mod range;
pub mod resilience;
pub mod transfer;
pub mod types;

pub use client::{InMemoryTableClient, RemoteResult, RemoteTableClient};
pub use config::{ConfigManager, DestinationPolicy, TransferConfig};
pub use error::{RemoteError, RemoteErrorKind, TransferError, TransferResult};
pub use orchestration::{
    PipelineContext, PipelineState, PipelineStateMachine, RunReport, TransferOrchestrator,
};
pub use range::SheetRange;
pub use resilience::{BackoffPolicy, RateLimiter, RetryExecutor};
pub use transfer::{Destination, Job, JobPlan, RunStatistics};
pub use types::{CellValue, Row};
