//! # Chunked Writer
//!
//! Replaces a destination range's contents with a row set of any size.
//!
//! The range is cleared exactly once, then rows go out in slices of at most
//! `chunk_size`: the first slice with `update` (overwrite at the anchor), the
//! rest with `append`. A pause separates consecutive chunk writes.
//!
//! A chunk that exhausts its retries stops the write immediately. Chunks
//! already written stay in place; nothing is rolled back.

use crate::client::RemoteTableClient;
use crate::error::TransferResult;
use crate::logging::log_chunk_operation;
use crate::resilience::RetryExecutor;
use crate::types::Row;
use std::ops::Range;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::sleep;
use tracing::{debug, info};

/// How a chunk is sent
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChunkMode {
    Update,
    Append,
}

/// Row index ranges for each chunk, in write order
pub fn plan_chunks(len: usize, chunk_size: usize) -> Vec<Range<usize>> {
    let chunk_size = chunk_size.max(1);
    (0..len)
        .step_by(chunk_size)
        .map(|start| start..(start + chunk_size).min(len))
        .collect()
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct WriteSummary {
    pub rows_written: usize,
    pub chunks_written: usize,
}

#[derive(Clone)]
pub struct ChunkedWriter {
    client: Arc<dyn RemoteTableClient>,
    executor: Arc<RetryExecutor>,
    max_attempts: u32,
    chunk_size: usize,
    chunk_pause: Duration,
}

impl std::fmt::Debug for ChunkedWriter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ChunkedWriter")
            .field("max_attempts", &self.max_attempts)
            .field("chunk_size", &self.chunk_size)
            .field("chunk_pause", &self.chunk_pause)
            .finish_non_exhaustive()
    }
}

impl ChunkedWriter {
    pub fn new(
        client: Arc<dyn RemoteTableClient>,
        executor: Arc<RetryExecutor>,
        max_attempts: u32,
        chunk_size: usize,
        chunk_pause: Duration,
    ) -> Self {
        Self {
            client,
            executor,
            max_attempts,
            chunk_size: chunk_size.max(1),
            chunk_pause,
        }
    }

    pub fn chunk_size(&self) -> usize {
        self.chunk_size
    }

    /// Clear `range` in `table_id`, then write `rows` into it.
    ///
    /// An empty row set only clears.
    pub async fn write(
        &self,
        table_id: &str,
        range: &str,
        rows: &[Row],
    ) -> TransferResult<WriteSummary> {
        let clear_op = format!("clear {table_id}/{range}");
        self.executor
            .execute(&clear_op, self.max_attempts, || {
                self.client.clear(table_id, range)
            })
            .await?;
        debug!(table_id = %table_id, range = %range, "🧹 Destination cleared");

        if rows.is_empty() {
            info!(table_id = %table_id, range = %range, "Nothing to write after clear");
            return Ok(WriteSummary::default());
        }

        let plan = plan_chunks(rows.len(), self.chunk_size);
        let total_chunks = plan.len();
        let mut summary = WriteSummary::default();

        for (index, bounds) in plan.into_iter().enumerate() {
            if index > 0 && !self.chunk_pause.is_zero() {
                sleep(self.chunk_pause).await;
            }

            let chunk = &rows[bounds.clone()];
            let mode = if index == 0 {
                ChunkMode::Update
            } else {
                ChunkMode::Append
            };
            let operation = format!(
                "{} chunk {}/{} {table_id}/{range}",
                match mode {
                    ChunkMode::Update => "update",
                    ChunkMode::Append => "append",
                },
                index + 1,
                total_chunks
            );

            self.executor
                .execute(&operation, self.max_attempts, || match mode {
                    ChunkMode::Update => self.client.update(table_id, range, chunk),
                    ChunkMode::Append => self.client.append(table_id, range, chunk),
                })
                .await?;

            summary.rows_written += chunk.len();
            summary.chunks_written += 1;
            log_chunk_operation(
                table_id,
                range,
                index + 1,
                total_chunks,
                bounds.start,
                chunk.len(),
            );
        }

        info!(
            table_id = %table_id,
            range = %range,
            rows = summary.rows_written,
            chunks = summary.chunks_written,
            "💾 Destination written"
        );
        Ok(summary)
    }
}
