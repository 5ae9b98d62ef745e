//! Aggregated fetch results.
//!
//! Rows are kept grouped by the job that produced them so they can later be
//! routed per destination. Segment order is batch order, then listed job
//! order within a batch.

use super::job::{Destination, JobId};
use crate::types::Row;

/// Rows contributed by one job, already tagged with its provenance
#[derive(Debug, Clone, PartialEq)]
pub struct JobRows {
    pub job_index: usize,
    pub job_id: JobId,
    pub destination: Destination,
    pub rows: Vec<Row>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct AggregateDataset {
    segments: Vec<JobRows>,
}

impl AggregateDataset {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, segment: JobRows) {
        self.segments.push(segment);
    }

    /// Append every segment of `other`, keeping its order
    pub fn extend(&mut self, other: AggregateDataset) {
        self.segments.extend(other.segments);
    }

    pub fn segments(&self) -> &[JobRows] {
        &self.segments
    }

    /// Total row count across all jobs
    pub fn len(&self) -> usize {
        self.segments.iter().map(|s| s.rows.len()).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn rows(&self) -> impl Iterator<Item = &Row> {
        self.segments.iter().flat_map(|s| s.rows.iter())
    }

    /// Concatenate all rows in aggregate order
    pub fn into_rows(self) -> Vec<Row> {
        self.segments.into_iter().flat_map(|s| s.rows).collect()
    }

    /// Split rows by destination, destinations in first-seen order,
    /// rows within a destination in aggregate order
    pub fn partition_by_destination(self) -> Vec<(Destination, Vec<Row>)> {
        let mut partitions: Vec<(Destination, Vec<Row>)> = Vec::new();
        for segment in self.segments {
            match partitions
                .iter_mut()
                .find(|(destination, _)| *destination == segment.destination)
            {
                Some((_, rows)) => rows.extend(segment.rows),
                None => partitions.push((segment.destination, segment.rows)),
            }
        }
        partitions
    }
}
