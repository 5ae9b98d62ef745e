//! # Transfer Configuration
//!
//! Runtime parameters consumed read-only by the pipeline: where the job table
//! lives, batch and chunk sizing, rate limiting, retry policy, status logging
//! and cleaning behavior.
//!
//! ## Sources
//!
//! Layered by [`ConfigManager`] using the `config` crate, later sources winning:
//!
//! 1. Built-in defaults ([`TransferConfig::default`])
//! 2. `config/sheet-transfer.{toml,yaml,json}` (or an explicit file)
//! 3. `config/sheet-transfer.<environment>.{toml,yaml,json}`
//! 4. `SHEET_TRANSFER__<SECTION>__<KEY>` environment variables
//!
//! ## Usage
//!
//! ```rust,no_run
//! use sheet_transfer::config::ConfigManager;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let manager = ConfigManager::load()?;
//! let batch_size = manager.config().pipeline.batch_size;
//! let pause = manager.config().pipeline.chunk_pause();
//! # Ok(())
//! # }
//! ```

pub mod error;
pub mod loader;

use crate::constants;
use crate::range::SheetRange;
use serde::{Deserialize, Serialize};
use std::time::Duration;

pub use error::{ConfigResult, ConfigurationError};
pub use loader::ConfigManager;

/// Root configuration structure
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct TransferConfig {
    /// Location of the job configuration table
    pub source: SourceConfig,

    /// Batch, chunk and destination settings
    pub pipeline: PipelineConfig,

    /// Minimum spacing between outbound API calls
    pub rate_limit: RateLimitConfig,

    /// Backoff and retry configuration
    pub retry: RetryConfig,

    /// Per-destination status log
    pub status_log: StatusLogConfig,

    /// Row normalization
    pub cleaning: CleaningConfig,
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct SourceConfig {
    /// Table holding one row per job
    pub table_id: String,
    /// Range of the job rows, header excluded
    pub range: String,
    /// Provenance cell format; `{table_id}` and `{range}` are substituted
    pub provenance_template: String,
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct PipelineConfig {
    pub batch_size: usize,
    pub chunk_size: usize,
    pub chunk_pause_ms: u64,
    pub destination_policy: DestinationPolicy,
}

impl PipelineConfig {
    /// Pause applied between successful chunk writes
    pub fn chunk_pause(&self) -> Duration {
        Duration::from_millis(self.chunk_pause_ms)
    }
}

/// How fetched rows are routed to destinations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DestinationPolicy {
    /// Rows are grouped by each job's own destination, written in first-seen order.
    PerDestination,
    /// All rows go to the destination named on the last configuration row.
    LastRow,
}

impl Default for DestinationPolicy {
    fn default() -> Self {
        Self::PerDestination
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct RateLimitConfig {
    pub min_interval_ms: u64,
}

impl RateLimitConfig {
    pub fn min_interval(&self) -> Duration {
        Duration::from_millis(self.min_interval_ms)
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct RetryConfig {
    pub max_attempts: u32,
    pub base_delay_ms: u64,
    pub max_delay_ms: u64,
    /// When false every remote error is retried regardless of its kind
    pub respect_permanent_errors: bool,
    /// Attempts allowed for best-effort status writes
    pub status_max_attempts: u32,
}

impl RetryConfig {
    pub fn base_delay(&self) -> Duration {
        Duration::from_millis(self.base_delay_ms)
    }

    pub fn max_delay(&self) -> Duration {
        Duration::from_millis(self.max_delay_ms)
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct StatusLogConfig {
    pub enabled: bool,
    /// Two-column range inside each destination table
    pub range: String,
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct CleaningConfig {
    /// Numeric value substituted for empty cells
    pub sentinel: f64,
    /// Pad each job's rows to its widest row before tagging
    pub pad_rows: bool,
}

impl Default for TransferConfig {
    fn default() -> Self {
        Self {
            source: SourceConfig::default(),
            pipeline: PipelineConfig::default(),
            rate_limit: RateLimitConfig::default(),
            retry: RetryConfig::default(),
            status_log: StatusLogConfig::default(),
            cleaning: CleaningConfig::default(),
        }
    }
}

impl Default for SourceConfig {
    fn default() -> Self {
        Self {
            table_id: String::new(),
            range: constants::DEFAULT_JOB_TABLE_RANGE.to_string(),
            provenance_template: "{table_id}".to_string(),
        }
    }
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            batch_size: constants::DEFAULT_BATCH_SIZE,
            chunk_size: constants::DEFAULT_CHUNK_SIZE,
            chunk_pause_ms: constants::DEFAULT_CHUNK_PAUSE_MS,
            destination_policy: DestinationPolicy::default(),
        }
    }
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            min_interval_ms: constants::DEFAULT_RATE_LIMIT_MS,
        }
    }
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: constants::DEFAULT_MAX_ATTEMPTS,
            base_delay_ms: constants::DEFAULT_BACKOFF_BASE_MS,
            max_delay_ms: constants::DEFAULT_BACKOFF_CAP_MS,
            respect_permanent_errors: true,
            status_max_attempts: 1,
        }
    }
}

impl Default for StatusLogConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            range: constants::DEFAULT_STATUS_LOG_RANGE.to_string(),
        }
    }
}

impl Default for CleaningConfig {
    fn default() -> Self {
        Self {
            sentinel: 0.0,
            pad_rows: true,
        }
    }
}

impl TransferConfig {
    /// Validate the configuration, returning the first problem found
    pub fn validate(&self) -> ConfigResult<()> {
        if self.source.table_id.trim().is_empty() {
            return Err(ConfigurationError::missing_required_field(
                "source.table_id",
                "job configuration table",
            ));
        }
        Self::validate_range("source.range", &self.source.range)?;

        if self.pipeline.batch_size == 0 {
            return Err(ConfigurationError::invalid_value(
                "pipeline.batch_size",
                "0",
                "batch size must be greater than 0",
            ));
        }
        if self.pipeline.chunk_size == 0 {
            return Err(ConfigurationError::invalid_value(
                "pipeline.chunk_size",
                "0",
                "chunk size must be greater than 0",
            ));
        }

        if self.retry.max_attempts == 0 {
            return Err(ConfigurationError::invalid_value(
                "retry.max_attempts",
                "0",
                "at least one attempt is required",
            ));
        }
        if self.retry.status_max_attempts == 0 {
            return Err(ConfigurationError::invalid_value(
                "retry.status_max_attempts",
                "0",
                "at least one attempt is required",
            ));
        }
        if self.retry.max_delay_ms < self.retry.base_delay_ms {
            return Err(ConfigurationError::invalid_value(
                "retry.max_delay_ms",
                self.retry.max_delay_ms.to_string(),
                format!(
                    "backoff cap must not be below base delay ({}ms)",
                    self.retry.base_delay_ms
                ),
            ));
        }

        if self.status_log.enabled {
            Self::validate_range("status_log.range", &self.status_log.range)?;
        }

        if !self.cleaning.sentinel.is_finite() {
            return Err(ConfigurationError::invalid_value(
                "cleaning.sentinel",
                self.cleaning.sentinel.to_string(),
                "sentinel must be a finite number",
            ));
        }

        Ok(())
    }

    fn validate_range(field: &str, range: &str) -> ConfigResult<()> {
        SheetRange::parse(range)
            .map(|_| ())
            .map_err(|e| ConfigurationError::invalid_value(field, range, e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn valid_config() -> TransferConfig {
        TransferConfig {
            source: SourceConfig {
                table_id: "config-table".to_string(),
                ..SourceConfig::default()
            },
            ..TransferConfig::default()
        }
    }

    #[test]
    fn test_defaults_match_documented_values() {
        let config = TransferConfig::default();
        assert_eq!(config.pipeline.batch_size, 10);
        assert_eq!(config.pipeline.chunk_size, 3000);
        assert_eq!(config.retry.max_attempts, 3);
        assert_eq!(config.retry.base_delay(), Duration::from_millis(1000));
        assert_eq!(config.retry.max_delay(), Duration::from_millis(10_000));
        assert_eq!(
            config.pipeline.destination_policy,
            DestinationPolicy::PerDestination
        );
    }

    #[test]
    fn test_valid_config_passes() {
        assert!(valid_config().validate().is_ok());
    }

    #[test]
    fn test_missing_table_id_rejected() {
        let err = TransferConfig::default().validate().unwrap_err();
        assert!(matches!(
            err,
            ConfigurationError::MissingRequiredField { .. }
        ));
    }

    #[test]
    fn test_zero_sizes_rejected() {
        let mut config = valid_config();
        config.pipeline.batch_size = 0;
        assert!(config.validate().is_err());

        let mut config = valid_config();
        config.pipeline.chunk_size = 0;
        assert!(config.validate().is_err());

        let mut config = valid_config();
        config.retry.max_attempts = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_backoff_cap_below_base_rejected() {
        let mut config = valid_config();
        config.retry.base_delay_ms = 5000;
        config.retry.max_delay_ms = 1000;
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("retry.max_delay_ms"));
    }

    #[test]
    fn test_malformed_status_range_rejected_only_when_enabled() {
        let mut config = valid_config();
        config.status_log.range = "Logs!".to_string();
        assert!(config.validate().is_err());

        config.status_log.enabled = false;
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_destination_policy_serde_names() {
        let policy: DestinationPolicy = serde_json::from_str("\"last_row\"").unwrap();
        assert_eq!(policy, DestinationPolicy::LastRow);
        assert_eq!(
            serde_json::to_string(&DestinationPolicy::PerDestination).unwrap(),
            "\"per_destination\""
        );
    }
}
