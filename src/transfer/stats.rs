use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Counters for a single pipeline run. Only ever increase.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunStatistics {
    pub jobs_total: usize,
    /// Jobs whose fetch succeeded, including those that returned no rows
    pub jobs_processed: usize,
    pub jobs_skipped_empty: usize,
    pub error_count: usize,
    pub rows_fetched: usize,
    pub rows_written: usize,
    pub batches_completed: usize,
    pub skipped_config_rows: usize,
    pub elapsed: Duration,
}

impl RunStatistics {
    pub fn record_batch(
        &mut self,
        jobs_processed: usize,
        jobs_skipped_empty: usize,
        errors: usize,
        rows_fetched: usize,
    ) {
        self.batches_completed += 1;
        self.jobs_processed += jobs_processed;
        self.jobs_skipped_empty += jobs_skipped_empty;
        self.error_count += errors;
        self.rows_fetched += rows_fetched;
    }

    pub fn record_written(&mut self, rows: usize) {
        self.rows_written += rows;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_batches_accumulate() {
        let mut stats = RunStatistics::default();
        stats.record_batch(9, 1, 1, 120);
        stats.record_batch(5, 0, 0, 40);
        stats.record_written(150);

        assert_eq!(stats.batches_completed, 2);
        assert_eq!(stats.jobs_processed, 14);
        assert_eq!(stats.jobs_skipped_empty, 1);
        assert_eq!(stats.error_count, 1);
        assert_eq!(stats.rows_fetched, 160);
        assert_eq!(stats.rows_written, 150);
    }
}
