//! Jobs and their configuration rows.
//!
//! Each configuration row `[source_id, source_range, dest_id, dest_range, ...]`
//! becomes one [`Job`]. Extra trailing columns are ignored.

use crate::error::{TransferError, TransferResult};
use crate::range::SheetRange;
use crate::types::{is_blank_row, CellValue, Row};
use serde::{Deserialize, Serialize};
use std::fmt;
use tracing::warn;

/// Where a job's rows are written
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Destination {
    pub table_id: String,
    pub range: String,
}

impl Destination {
    pub fn new(table_id: impl Into<String>, range: impl Into<String>) -> Self {
        Self {
            table_id: table_id.into(),
            range: range.into(),
        }
    }
}

impl fmt::Display for Destination {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.table_id, self.range)
    }
}

/// Job identity: the source it reads from
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct JobId {
    pub source_id: String,
    pub source_range: String,
}

impl fmt::Display for JobId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.source_id, self.source_range)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Job {
    /// Position in configuration order
    pub index: usize,
    pub source_id: String,
    pub source_range: String,
    pub destination: Destination,
}

impl Job {
    pub fn new(
        index: usize,
        source_id: impl Into<String>,
        source_range: impl Into<String>,
        destination: Destination,
    ) -> Self {
        Self {
            index,
            source_id: source_id.into(),
            source_range: source_range.into(),
            destination,
        }
    }

    pub fn id(&self) -> JobId {
        JobId {
            source_id: self.source_id.clone(),
            source_range: self.source_range.clone(),
        }
    }

    /// Render the provenance cell for this job from a template containing
    /// `{table_id}` and/or `{range}` placeholders
    pub fn provenance_tag(&self, template: &str) -> CellValue {
        CellValue::Text(
            template
                .replace("{table_id}", &self.source_id)
                .replace("{range}", &self.source_range),
        )
    }
}

/// A configuration row that could not become a job
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SkippedRow {
    /// Zero-based offset within the configuration range
    pub row: usize,
    pub reason: String,
}

/// Jobs parsed from the configuration table, in configuration order
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct JobPlan {
    pub jobs: Vec<Job>,
    pub skipped: Vec<SkippedRow>,
}

impl JobPlan {
    /// Parse configuration rows. Blank rows are ignored silently; incomplete
    /// rows and rows with unparsable ranges are skipped with a warning.
    pub fn from_rows(rows: &[Row]) -> Self {
        let mut plan = JobPlan::default();

        for (offset, row) in rows.iter().enumerate() {
            if is_blank_row(row) {
                continue;
            }
            match parse_job_row(plan.jobs.len(), offset, row) {
                Ok(job) => plan.jobs.push(job),
                Err(error) => {
                    warn!(row = offset, error = %error, "⚠️ Skipping job configuration row");
                    plan.skipped.push(SkippedRow {
                        row: offset,
                        reason: error.to_string(),
                    });
                }
            }
        }

        plan
    }

    /// Destination of the last configured job
    pub fn last_destination(&self) -> Option<&Destination> {
        self.jobs.last().map(|job| &job.destination)
    }

    /// Distinct destinations in first-seen order
    pub fn destinations(&self) -> Vec<&Destination> {
        let mut seen: Vec<&Destination> = Vec::new();
        for job in &self.jobs {
            if !seen.contains(&&job.destination) {
                seen.push(&job.destination);
            }
        }
        seen
    }
}

/// Consecutive groups of at most `batch_size` jobs
pub fn plan_batches(jobs: &[Job], batch_size: usize) -> std::slice::Chunks<'_, Job> {
    jobs.chunks(batch_size.max(1))
}

/// Parse one configuration row found at `offset` into the job at `index`
fn parse_job_row(index: usize, offset: usize, row: &Row) -> TransferResult<Job> {
    const COLUMNS: [&str; 4] = ["source id", "source range", "destination id", "destination range"];

    let mut fields = [String::new(), String::new(), String::new(), String::new()];
    for (position, name) in COLUMNS.iter().enumerate() {
        let value = row
            .get(position)
            .map(|cell| cell.to_string().trim().to_string())
            .unwrap_or_default();
        if value.is_empty() {
            return Err(TransferError::InvalidJobRow {
                row: offset,
                reason: format!("missing {name}"),
            });
        }
        fields[position] = value;
    }
    let [source_id, source_range, dest_id, dest_range] = fields;

    for range in [&source_range, &dest_range] {
        SheetRange::parse(range)?;
    }

    Ok(Job::new(
        index,
        source_id,
        source_range,
        Destination::new(dest_id, dest_range),
    ))
}
