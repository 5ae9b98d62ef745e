//! Shared defaults and status markers.

/// Jobs launched concurrently per batch
pub const DEFAULT_BATCH_SIZE: usize = 10;

/// Maximum rows per destination write
pub const DEFAULT_CHUNK_SIZE: usize = 3000;

/// Pause between consecutive chunk writes
pub const DEFAULT_CHUNK_PAUSE_MS: u64 = 1000;

/// Minimum spacing between any two outbound API calls
pub const DEFAULT_RATE_LIMIT_MS: u64 = 100;

pub const DEFAULT_MAX_ATTEMPTS: u32 = 3;
pub const DEFAULT_BACKOFF_BASE_MS: u64 = 1000;
pub const DEFAULT_BACKOFF_CAP_MS: u64 = 10_000;

/// Job rows start below the header row
pub const DEFAULT_JOB_TABLE_RANGE: &str = "Config!A2:D";

/// Two-column `[timestamp, message]` log inside each destination table
pub const DEFAULT_STATUS_LOG_RANGE: &str = "Logs!A:B";

/// Status markers written to the destination log
pub mod status {
    pub const DONE: &str = "Done";
    pub const FINAL_ERROR: &str = "FINAL ERROR";
    pub const JOB_ERROR: &str = "ERROR";
}
