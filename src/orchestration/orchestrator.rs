//! # Transfer Orchestrator
//!
//! Drives one run through its states:
//!
//! ```text
//! Init → Configuring → Fetching → Cleaning → Writing → Reporting → Done
//!            │  └──────(no jobs)──────────────────────────────────↗
//!            └────────────┴──────────┴──────────┴──→ Failed
//! ```
//!
//! Job-level fetch failures are counted and never stop the run. Failures to
//! read the configuration table or to clear/write a destination are fatal:
//! the run moves to `Failed` and makes one best-effort attempt to record a
//! `FINAL ERROR` status row at the last known destination.
//!
//! Statistics are reported whatever the outcome.

use super::context::PipelineContext;
use super::state::{PipelineState, PipelineStateMachine};
use crate::config::DestinationPolicy;
use crate::error::{TransferError, TransferResult};
use crate::logging::log_error;
use crate::transfer::{BatchOutcome, Destination, JobPlan, RunStatistics};
use crate::types::Row;
use std::collections::HashSet;
use tokio::time::Instant;
use tracing::{debug, info, info_span, warn, Instrument};
use uuid::Uuid;

/// Outcome of a run
#[derive(Debug)]
pub struct RunReport {
    pub run_id: Uuid,
    pub final_state: PipelineState,
    pub state_history: Vec<PipelineState>,
    pub statistics: RunStatistics,
    /// Destinations fully written during the run
    pub destinations_written: Vec<Destination>,
    /// The fatal error, when the run ended in `Failed`
    pub error: Option<TransferError>,
}

impl RunReport {
    pub fn succeeded(&self) -> bool {
        self.final_state == PipelineState::Done && self.error.is_none()
    }

    /// Surface the fatal error to the caller, or the statistics on success
    pub fn into_result(self) -> TransferResult<RunStatistics> {
        match self.error {
            Some(error) => Err(error),
            None => Ok(self.statistics),
        }
    }
}

/// Mutable bookkeeping for a single run
struct RunState {
    machine: PipelineStateMachine,
    statistics: RunStatistics,
    last_destination: Option<Destination>,
    written: Vec<Destination>,
    started: Instant,
}

#[derive(Debug, Clone)]
pub struct TransferOrchestrator {
    context: PipelineContext,
}

impl TransferOrchestrator {
    pub fn new(context: PipelineContext) -> Self {
        Self { context }
    }

    pub fn context(&self) -> &PipelineContext {
        &self.context
    }

    /// Execute one complete run
    pub async fn run(&self) -> RunReport {
        let run_id = Uuid::new_v4();
        let span = info_span!("transfer_run", run_id = %run_id);

        async move {
            let mut run = RunState {
                machine: PipelineStateMachine::new(),
                statistics: RunStatistics::default(),
                last_destination: None,
                written: Vec::new(),
                started: Instant::now(),
            };

            info!("🚀 Transfer run starting");
            let result = self.execute(&mut run).await;
            run.statistics.elapsed = run.started.elapsed();

            let error = match result {
                Ok(()) => None,
                Err(error) => {
                    self.handle_failure(&mut run, &error).await;
                    Some(error)
                }
            };

            let statistics = &run.statistics;
            info!(
                state = %run.machine.current(),
                jobs_total = statistics.jobs_total,
                jobs_processed = statistics.jobs_processed,
                errors = statistics.error_count,
                rows_fetched = statistics.rows_fetched,
                rows_written = statistics.rows_written,
                elapsed_ms = statistics.elapsed.as_millis() as u64,
                "🏁 Transfer run finished"
            );

            RunReport {
                run_id,
                final_state: run.machine.current(),
                state_history: run.machine.history().to_vec(),
                statistics: run.statistics,
                destinations_written: run.written,
                error,
            }
        }
        .instrument(span)
        .await
    }

    async fn execute(&self, run: &mut RunState) -> TransferResult<()> {
        // The client capability is bound to the context already
        run.machine.transition(PipelineState::Configuring)?;
        let plan = self.load_jobs().await?;
        run.statistics.jobs_total = plan.jobs.len();
        run.statistics.skipped_config_rows = plan.skipped.len();
        run.last_destination = plan.last_destination().cloned();

        if plan.jobs.is_empty() {
            info!("No jobs configured, nothing to transfer");
            run.machine.transition(PipelineState::Done)?;
            return Ok(());
        }

        run.machine.transition(PipelineState::Fetching)?;
        let outcome = self.fetch(&plan, &mut run.statistics).await;

        run.machine.transition(PipelineState::Cleaning)?;
        let targets = self.route(&plan, outcome);

        run.machine.transition(PipelineState::Writing)?;
        let writer = self.context.chunked_writer();
        for (destination, rows) in targets {
            run.last_destination = Some(destination.clone());
            let summary = writer
                .write(&destination.table_id, &destination.range, &rows)
                .await?;
            run.statistics.record_written(summary.rows_written);
            run.written.push(destination);
        }

        run.machine.transition(PipelineState::Reporting)?;
        run.statistics.elapsed = run.started.elapsed();
        let reporter = self.context.status_reporter();
        for destination in &run.written {
            reporter.report_done(destination, &run.statistics).await;
        }

        run.machine.transition(PipelineState::Done)?;
        Ok(())
    }

    async fn load_jobs(&self) -> TransferResult<JobPlan> {
        let config = self.context.config();
        let source = &config.source;
        let client = self.context.client();
        let operation = format!("get job configuration {}/{}", source.table_id, source.range);

        let rows = self
            .context
            .executor()
            .execute(&operation, config.retry.max_attempts, || {
                client.get(&source.table_id, &source.range)
            })
            .await?;

        let plan = JobPlan::from_rows(&rows);
        info!(
            jobs = plan.jobs.len(),
            skipped_rows = plan.skipped.len(),
            "📋 Job configuration loaded"
        );
        Ok(plan)
    }

    async fn fetch(&self, plan: &JobPlan, statistics: &mut RunStatistics) -> BatchOutcome {
        let batch_size = self.context.config().pipeline.batch_size;
        self.context
            .batch_fetcher()
            .run_batches_with(&plan.jobs, batch_size, |batch_index, batch| {
                statistics.record_batch(
                    batch.jobs_processed,
                    batch.jobs_skipped_empty,
                    batch.error_count(),
                    batch.dataset.len(),
                );
                debug!(
                    batch = batch_index,
                    processed = statistics.jobs_processed,
                    errors = statistics.error_count,
                    "📊 Statistics updated"
                );
            })
            .await
    }

    /// Pair each destination to write with its cleaned rows.
    ///
    /// A destination none of whose jobs fetched successfully is left
    /// untouched, so a total source outage never wipes it.
    fn route(&self, plan: &JobPlan, outcome: BatchOutcome) -> Vec<(Destination, Vec<Row>)> {
        let cleaner = self.context.cleaner();
        let failed: HashSet<usize> = outcome.failures.iter().map(|f| f.job_index).collect();
        let any_success = |destination: Option<&Destination>| {
            plan.jobs.iter().any(|job| {
                !failed.contains(&job.index)
                    && destination.map_or(true, |d| &job.destination == d)
            })
        };

        match self.context.config().pipeline.destination_policy {
            DestinationPolicy::LastRow => {
                let Some(destination) = plan.last_destination() else {
                    return Vec::new();
                };
                if !any_success(None) {
                    warn!(destination = %destination, "⚠️ Every job failed, leaving destination untouched");
                    return Vec::new();
                }
                vec![(destination.clone(), cleaner.clean(outcome.dataset.into_rows()))]
            }
            DestinationPolicy::PerDestination => {
                let mut partitions = outcome.dataset.partition_by_destination();
                plan.destinations()
                    .into_iter()
                    .filter_map(|destination| {
                        if !any_success(Some(destination)) {
                            warn!(destination = %destination, "⚠️ Every job for destination failed, leaving it untouched");
                            return None;
                        }
                        let rows = partitions
                            .iter_mut()
                            .find(|(d, _)| d == destination)
                            .map(|(_, rows)| std::mem::take(rows))
                            .unwrap_or_default();
                        Some((destination.clone(), cleaner.clean(rows)))
                    })
                    .collect()
            }
        }
    }

    async fn handle_failure(&self, run: &mut RunState, error: &TransferError) {
        let state = run.machine.current();
        log_error(
            "orchestrator",
            &state.to_string(),
            &error.to_string(),
            run.last_destination.as_ref().map(|d| d.to_string()).as_deref(),
        );

        if !run.machine.fail() {
            warn!(state = %state, "Run failed in a state that cannot move to failed");
        }

        match &run.last_destination {
            Some(destination) => {
                self.context
                    .status_reporter()
                    .report_final_error(destination, error)
                    .await;
            }
            None => warn!("No known destination for the final error report"),
        }
    }
}
