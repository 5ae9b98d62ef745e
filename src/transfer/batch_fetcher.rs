//! # Batch Fetcher
//!
//! Fans jobs out in fixed-size batches. Every job of a batch runs as its own
//! task; the batch is joined completely before the next one starts, which
//! caps in-flight fetches at the batch size.
//!
//! A job that fails is isolated: it is counted, reported to its own
//! destination's status log, and contributes no rows. Siblings and later
//! batches are unaffected.
//!
//! Task results are keyed by the job's position in the batch, so the
//! aggregate lists rows in configuration order regardless of which fetch
//! finished first.

use super::cleaner::pad_to_width;
use super::dataset::{AggregateDataset, JobRows};
use super::job::{plan_batches, Job, JobId};
use super::status::StatusReporter;
use crate::client::RemoteTableClient;
use crate::error::TransferError;
use crate::logging::log_job_operation;
use crate::resilience::RetryExecutor;
use crate::types::{is_blank_row, CellValue, Row};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::task::JoinSet;
use tracing::{debug, info, warn};

/// Per-job fetch parameters
#[derive(Debug, Clone)]
pub struct FetchSettings {
    pub max_attempts: u32,
    pub provenance_template: String,
    pub pad_rows: bool,
}

impl Default for FetchSettings {
    fn default() -> Self {
        Self {
            max_attempts: crate::constants::DEFAULT_MAX_ATTEMPTS,
            provenance_template: "{table_id}".to_string(),
            pad_rows: true,
        }
    }
}

/// What a single job produced
#[derive(Debug)]
pub enum JobOutcome {
    Fetched(JobRows),
    /// The source range held no non-blank rows
    Empty,
    Failed(TransferError),
}

/// A job that contributed nothing because its fetch failed
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JobFailure {
    pub job_index: usize,
    pub job_id: JobId,
    pub error: String,
}

/// Results of one batch, or of all batches merged
#[derive(Debug, Default)]
pub struct BatchOutcome {
    pub dataset: AggregateDataset,
    /// Jobs whose fetch succeeded, empty ones included
    pub jobs_processed: usize,
    pub jobs_skipped_empty: usize,
    pub failures: Vec<JobFailure>,
}

impl BatchOutcome {
    pub fn error_count(&self) -> usize {
        self.failures.len()
    }

    pub fn into_parts(self) -> (AggregateDataset, usize) {
        let errors = self.failures.len();
        (self.dataset, errors)
    }

    fn absorb(&mut self, other: BatchOutcome) {
        self.dataset.extend(other.dataset);
        self.jobs_processed += other.jobs_processed;
        self.jobs_skipped_empty += other.jobs_skipped_empty;
        self.failures.extend(other.failures);
    }

    fn record(&mut self, job: &Job, outcome: JobOutcome) {
        match outcome {
            JobOutcome::Fetched(rows) => {
                self.jobs_processed += 1;
                self.dataset.push(rows);
            }
            JobOutcome::Empty => {
                self.jobs_processed += 1;
                self.jobs_skipped_empty += 1;
            }
            JobOutcome::Failed(error) => self.failures.push(JobFailure {
                job_index: job.index,
                job_id: job.id(),
                error: error.to_string(),
            }),
        }
    }
}

#[derive(Clone)]
pub struct BatchFetcher {
    client: Arc<dyn RemoteTableClient>,
    executor: Arc<RetryExecutor>,
    reporter: StatusReporter,
    settings: FetchSettings,
}

impl std::fmt::Debug for BatchFetcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BatchFetcher")
            .field("settings", &self.settings)
            .finish_non_exhaustive()
    }
}

impl BatchFetcher {
    pub fn new(
        client: Arc<dyn RemoteTableClient>,
        executor: Arc<RetryExecutor>,
        reporter: StatusReporter,
        settings: FetchSettings,
    ) -> Self {
        Self {
            client,
            executor,
            reporter,
            settings,
        }
    }

    /// Fetch every job, `batch_size` at a time
    pub async fn run_batches(&self, jobs: &[Job], batch_size: usize) -> BatchOutcome {
        self.run_batches_with(jobs, batch_size, |_, _| {}).await
    }

    /// Like [`run_batches`](Self::run_batches), calling `on_batch` with each
    /// batch's index and outcome once the batch has fully settled
    pub async fn run_batches_with<F>(
        &self,
        jobs: &[Job],
        batch_size: usize,
        mut on_batch: F,
    ) -> BatchOutcome
    where
        F: FnMut(usize, &BatchOutcome),
    {
        let mut total = BatchOutcome::default();

        for (batch_index, batch) in plan_batches(jobs, batch_size).enumerate() {
            info!(
                batch = batch_index,
                jobs = batch.len(),
                "📦 Starting batch"
            );

            let outcome = self.run_batch(batch).await;

            info!(
                batch = batch_index,
                rows = outcome.dataset.len(),
                processed = outcome.jobs_processed,
                errors = outcome.error_count(),
                "✅ Batch settled"
            );
            on_batch(batch_index, &outcome);
            total.absorb(outcome);
        }

        total
    }

    /// Fetch one batch concurrently and wait for all of it
    pub async fn run_batch(&self, batch: &[Job]) -> BatchOutcome {
        let mut tasks = JoinSet::new();
        let mut positions = HashMap::with_capacity(batch.len());

        for (position, job) in batch.iter().enumerate() {
            let client = self.client.clone();
            let executor = self.executor.clone();
            let reporter = self.reporter.clone();
            let settings = self.settings.clone();
            let job = job.clone();

            let handle = tasks.spawn(async move {
                let outcome = fetch_job(client, executor, reporter, settings, &job).await;
                (position, outcome)
            });
            positions.insert(handle.id(), position);
        }

        let mut outcomes: Vec<Option<JobOutcome>> = (0..batch.len()).map(|_| None).collect();
        while let Some(joined) = tasks.join_next().await {
            match joined {
                Ok((position, outcome)) => outcomes[position] = Some(outcome),
                Err(join_error) => {
                    warn!(error = %join_error, "💥 Job task did not complete");
                    if let Some(&position) = positions.get(&join_error.id()) {
                        outcomes[position] = Some(JobOutcome::Failed(TransferError::TaskJoin(
                            join_error.to_string(),
                        )));
                    }
                }
            }
        }

        let mut result = BatchOutcome::default();
        for (job, outcome) in batch.iter().zip(outcomes) {
            let outcome = outcome.unwrap_or_else(|| {
                JobOutcome::Failed(TransferError::TaskJoin("job task vanished".to_string()))
            });
            result.record(job, outcome);
        }
        result
    }
}

async fn fetch_job(
    client: Arc<dyn RemoteTableClient>,
    executor: Arc<RetryExecutor>,
    reporter: StatusReporter,
    settings: FetchSettings,
    job: &Job,
) -> JobOutcome {
    let job_id = job.id();
    let operation = format!("get {job_id}");

    let fetched = executor
        .execute(&operation, settings.max_attempts, || {
            client.get(&job.source_id, &job.source_range)
        })
        .await;

    match fetched {
        Ok(rows) => {
            let tag = job.provenance_tag(&settings.provenance_template);
            let rows = tag_rows(rows, &tag, settings.pad_rows);
            if rows.is_empty() {
                debug!(job = %job_id, "Source range is empty, skipping");
                log_job_operation("fetch", &job_id, "skipped_empty", 0, None);
                return JobOutcome::Empty;
            }

            log_job_operation("fetch", &job_id, "fetched", rows.len(), None);
            JobOutcome::Fetched(JobRows {
                job_index: job.index,
                job_id,
                destination: job.destination.clone(),
                rows,
            })
        }
        Err(error) => {
            log_job_operation("fetch", &job_id, "failed", 0, Some(&error.to_string()));
            reporter.report_job_failure(job, &error).await;
            JobOutcome::Failed(error)
        }
    }
}

/// Drop blank rows, optionally square them up, then append the provenance cell
pub fn tag_rows(rows: Vec<Row>, tag: &CellValue, pad: bool) -> Vec<Row> {
    let mut rows: Vec<Row> = rows.into_iter().filter(|r| !is_blank_row(r)).collect();
    if pad {
        pad_to_width(&mut rows);
    }
    for row in &mut rows {
        row.push(tag.clone());
    }
    rows
}
