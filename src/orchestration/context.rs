//! Explicit run context.
//!
//! Everything a run shares (settings, the client, the rate limiter and the
//! retry executor) hangs off one [`PipelineContext`] instead of process-wide
//! statics, so independent pipelines can coexist in one process.

use crate::client::RemoteTableClient;
use crate::config::{ConfigManager, TransferConfig};
use crate::resilience::{RateLimiter, RetryExecutor};
use crate::transfer::{BatchFetcher, ChunkedWriter, DataCleaner, FetchSettings, StatusReporter};
use std::sync::Arc;

#[derive(Clone)]
pub struct PipelineContext {
    config: Arc<TransferConfig>,
    client: Arc<dyn RemoteTableClient>,
    limiter: Arc<RateLimiter>,
    executor: Arc<RetryExecutor>,
}

impl std::fmt::Debug for PipelineContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PipelineContext")
            .field("config", &self.config)
            .field("executor", &self.executor)
            .finish_non_exhaustive()
    }
}

impl PipelineContext {
    pub fn new(config: TransferConfig, client: Arc<dyn RemoteTableClient>) -> Self {
        let limiter = Arc::new(RateLimiter::new(config.rate_limit.min_interval()));
        let executor = Arc::new(RetryExecutor::from_config(&config, limiter.clone()));
        Self {
            config: Arc::new(config),
            client,
            limiter,
            executor,
        }
    }

    pub fn from_manager(manager: &ConfigManager, client: Arc<dyn RemoteTableClient>) -> Self {
        Self::new(manager.config().clone(), client)
    }

    /// Swap in a custom executor, e.g. one with a different retry predicate.
    /// The executor's own rate limiter becomes the context's limiter.
    pub fn with_executor(mut self, executor: RetryExecutor) -> Self {
        self.limiter = executor.rate_limiter().clone();
        self.executor = Arc::new(executor);
        self
    }

    pub fn config(&self) -> &TransferConfig {
        &self.config
    }

    pub fn client(&self) -> &Arc<dyn RemoteTableClient> {
        &self.client
    }

    pub fn rate_limiter(&self) -> &Arc<RateLimiter> {
        &self.limiter
    }

    pub fn executor(&self) -> &Arc<RetryExecutor> {
        &self.executor
    }

    pub fn status_reporter(&self) -> StatusReporter {
        let log_range = self
            .config
            .status_log
            .enabled
            .then(|| self.config.status_log.range.clone());
        StatusReporter::new(
            self.client.clone(),
            self.executor.clone(),
            log_range,
            self.config.retry.status_max_attempts,
        )
    }

    pub fn batch_fetcher(&self) -> BatchFetcher {
        BatchFetcher::new(
            self.client.clone(),
            self.executor.clone(),
            self.status_reporter(),
            FetchSettings {
                max_attempts: self.config.retry.max_attempts,
                provenance_template: self.config.source.provenance_template.clone(),
                pad_rows: self.config.cleaning.pad_rows,
            },
        )
    }

    pub fn chunked_writer(&self) -> ChunkedWriter {
        ChunkedWriter::new(
            self.client.clone(),
            self.executor.clone(),
            self.config.retry.max_attempts,
            self.config.pipeline.chunk_size,
            self.config.pipeline.chunk_pause(),
        )
    }

    pub fn cleaner(&self) -> DataCleaner {
        DataCleaner::new(self.config.cleaning.sentinel)
    }
}
