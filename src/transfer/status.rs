//! Best-effort status log.
//!
//! Appends `[timestamp, message]` rows to a well-known log range inside a
//! destination table. A status write never fails the run: errors are logged
//! at `warn` and dropped.

use super::job::{Destination, Job};
use super::stats::RunStatistics;
use crate::client::RemoteTableClient;
use crate::constants::status;
use crate::error::TransferError;
use crate::resilience::RetryExecutor;
use crate::types::{CellValue, Row};
use chrono::Utc;
use std::sync::Arc;
use tracing::{debug, warn};

#[derive(Clone)]
pub struct StatusReporter {
    client: Arc<dyn RemoteTableClient>,
    executor: Arc<RetryExecutor>,
    /// `None` disables status logging
    log_range: Option<String>,
    max_attempts: u32,
}

impl std::fmt::Debug for StatusReporter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StatusReporter")
            .field("log_range", &self.log_range)
            .field("max_attempts", &self.max_attempts)
            .finish_non_exhaustive()
    }
}

impl StatusReporter {
    pub fn new(
        client: Arc<dyn RemoteTableClient>,
        executor: Arc<RetryExecutor>,
        log_range: Option<String>,
        max_attempts: u32,
    ) -> Self {
        Self {
            client,
            executor,
            log_range,
            max_attempts,
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.log_range.is_some()
    }

    /// Append one status row. Returns whether the write landed.
    pub async fn append_status(&self, table_id: &str, message: &str) -> bool {
        let Some(range) = self.log_range.as_deref() else {
            return false;
        };

        let rows: Vec<Row> = vec![vec![
            CellValue::Text(Utc::now().to_rfc3339()),
            CellValue::Text(message.to_string()),
        ]];
        let operation = format!("append status {table_id}/{range}");

        match self
            .executor
            .execute(&operation, self.max_attempts, || {
                self.client.append(table_id, range, &rows)
            })
            .await
        {
            Ok(()) => {
                debug!(table_id = %table_id, message = %message, "📝 Status row written");
                true
            }
            Err(error) => {
                warn!(
                    table_id = %table_id,
                    message = %message,
                    error = %error,
                    "⚠️ Status write failed, continuing"
                );
                false
            }
        }
    }

    /// Record a job's fetch failure in its own destination's log
    pub async fn report_job_failure(&self, job: &Job, error: &TransferError) -> bool {
        let message = format!(
            "{}: fetching {} failed: {}",
            status::JOB_ERROR,
            job.id(),
            error
        );
        self.append_status(&job.destination.table_id, &message).await
    }

    pub async fn report_done(&self, destination: &Destination, stats: &RunStatistics) -> bool {
        let message = format!(
            "{}: {} rows written, {}/{} jobs processed, {} errors, {:.1}s",
            status::DONE,
            stats.rows_written,
            stats.jobs_processed,
            stats.jobs_total,
            stats.error_count,
            stats.elapsed.as_secs_f64()
        );
        self.append_status(&destination.table_id, &message).await
    }

    pub async fn report_final_error(&self, destination: &Destination, error: &TransferError) -> bool {
        let message = format!("{}: {}", status::FINAL_ERROR, error);
        self.append_status(&destination.table_id, &message).await
    }
}
