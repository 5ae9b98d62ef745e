use super::recording_client::RecordingClient;
use sheet_transfer::config::TransferConfig;
use sheet_transfer::orchestration::{PipelineContext, RunReport, TransferOrchestrator};
use sheet_transfer::types::{row, CellValue, Row};
use std::sync::Arc;

pub const JOB_TABLE: &str = "job-config";
pub const JOB_RANGE_ANCHOR: &str = "Config!A2";
pub const SOURCE_RANGE: &str = "Data!A1:C";
pub const DEST_RANGE: &str = "Out!A2:D";
pub const LOG_RANGE: &str = "Logs!A:B";

/// Fast settings: no pacing, no chunk pause, millisecond backoff
pub fn test_config() -> TransferConfig {
    let mut config = TransferConfig::default();
    config.source.table_id = JOB_TABLE.to_string();
    config.rate_limit.min_interval_ms = 0;
    config.pipeline.chunk_pause_ms = 0;
    config.retry.base_delay_ms = 1;
    config.retry.max_delay_ms = 4;
    config
}

/// Builds the tables a run reads from
#[derive(Debug, Default)]
pub struct ScenarioBuilder {
    jobs: Vec<Row>,
    sources: Vec<(String, Vec<Row>)>,
}

impl ScenarioBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// A job reading `source` and writing to `dest`, with the source's rows
    pub fn job(mut self, source: &str, dest: &str, rows: Vec<Row>) -> Self {
        self.jobs.push(row([source, SOURCE_RANGE, dest, DEST_RANGE]));
        self.sources.push((source.to_string(), rows));
        self
    }

    /// A job whose source table is never created
    pub fn missing_job(mut self, source: &str, dest: &str) -> Self {
        self.jobs.push(row([source, SOURCE_RANGE, dest, DEST_RANGE]));
        self
    }

    pub fn raw_job_row(mut self, cells: Row) -> Self {
        self.jobs.push(cells);
        self
    }

    pub fn install(self, client: &RecordingClient) {
        client.inner.create_table(JOB_TABLE);
        client
            .inner
            .seed(JOB_TABLE, JOB_RANGE_ANCHOR, &self.jobs)
            .expect("seed job table");
        for (source, rows) in self.sources {
            client.inner.create_table(&source);
            client
                .inner
                .seed(&source, "Data!A1", &rows)
                .expect("seed source table");
        }
    }
}

/// `n` rows of `[prefix-i, i]`
pub fn numbered_rows(prefix: &str, n: usize) -> Vec<Row> {
    (0..n)
        .map(|i| vec![CellValue::from(format!("{prefix}-{i}")), CellValue::from(i as i64)])
        .collect()
}

pub async fn run(client: Arc<RecordingClient>, config: TransferConfig) -> RunReport {
    TransferOrchestrator::new(PipelineContext::new(config, client))
        .run()
        .await
}

/// Status messages written to a destination's log, oldest first
pub fn status_messages(client: &RecordingClient, table_id: &str) -> Vec<String> {
    client
        .inner
        .read(table_id, LOG_RANGE)
        .unwrap_or_default()
        .iter()
        .filter_map(|r| r.get(1).and_then(CellValue::as_text).map(str::to_string))
        .collect()
}
