//! # Batch Transfer
//!
//! The building blocks of a transfer run: jobs parsed from configuration,
//! concurrent batch fetching, cleaning, chunked destination writes and the
//! best-effort status log.

pub mod batch_fetcher;
pub mod chunked_writer;
pub mod cleaner;
pub mod dataset;
pub mod job;
pub mod stats;
pub mod status;

pub use batch_fetcher::{BatchFetcher, BatchOutcome, FetchSettings, JobFailure, JobOutcome};
pub use chunked_writer::{plan_chunks, ChunkMode, ChunkedWriter, WriteSummary};
pub use cleaner::{clean, DataCleaner};
pub use dataset::{AggregateDataset, JobRows};
pub use job::{plan_batches, Destination, Job, JobId, JobPlan, SkippedRow};
pub use stats::RunStatistics;
pub use status::StatusReporter;
