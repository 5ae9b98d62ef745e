//! # Structured Logging Module
//!
//! Environment-aware structured logging for transfer runs. Console output by
//! default, JSON lines when `TRANSFER_LOG_FORMAT=json`. Writing log files is
//! left to the host application.

use chrono::Utc;
use std::sync::OnceLock;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::config::ConfigManager;
use crate::transfer::JobId;

static LOGGER_INITIALIZED: OnceLock<()> = OnceLock::new();

/// Initialize structured logging with environment-specific configuration
pub fn init_structured_logging() {
    LOGGER_INITIALIZED.get_or_init(|| {
        let environment = get_environment();
        let log_level = get_log_level(&environment);
        let json = std::env::var("TRANSFER_LOG_FORMAT")
            .map(|format| format.eq_ignore_ascii_case("json"))
            .unwrap_or(false);

        let filter =
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(log_level));

        let console_layer = (!json).then(|| {
            fmt::layer()
                .with_target(true)
                .with_thread_ids(true)
                .with_level(true)
                .with_ansi(true)
        });
        let json_layer = json.then(|| {
            fmt::layer()
                .json()
                .with_target(true)
                .with_thread_ids(true)
                .with_level(true)
        });

        let subscriber = tracing_subscriber::registry()
            .with(filter)
            .with(console_layer)
            .with(json_layer);

        // A global subscriber may already be installed by the host
        if subscriber.try_init().is_err() {
            tracing::debug!("Global tracing subscriber already initialized - continuing with existing subscriber");
        }

        tracing::info!(
            environment = %environment,
            json = json,
            "🔧 STRUCTURED LOGGING: Initialized"
        );
    });
}

/// Current environment, resolved the same way configuration loading resolves it
fn get_environment() -> String {
    ConfigManager::detect_environment()
}

/// Get log level based on environment
fn get_log_level(environment: &str) -> String {
    match environment {
        "test" => "debug".to_string(),
        "development" => "debug".to_string(),
        "production" => "info".to_string(),
        _ => "debug".to_string(),
    }
}

/// Log structured data for a single job
pub fn log_job_operation(
    operation: &str,
    job: &JobId,
    status: &str,
    rows: usize,
    details: Option<&str>,
) {
    tracing::info!(
        operation = %operation,
        source_id = %job.source_id,
        source_range = %job.source_range,
        status = %status,
        rows = rows,
        details = details,
        timestamp = %Utc::now().to_rfc3339(),
        "📋 JOB_OPERATION"
    );
}

/// Log structured data for one destination chunk write
pub fn log_chunk_operation(
    table_id: &str,
    range: &str,
    chunk: usize,
    total_chunks: usize,
    first_row: usize,
    rows: usize,
) {
    tracing::info!(
        table_id = %table_id,
        range = %range,
        chunk = chunk,
        total_chunks = total_chunks,
        first_row = first_row,
        rows = rows,
        timestamp = %Utc::now().to_rfc3339(),
        "🧩 CHUNK_WRITTEN"
    );
}

/// Log error with full context
pub fn log_error(component: &str, operation: &str, error: &str, context: Option<&str>) {
    tracing::error!(
        component = %component,
        operation = %operation,
        error = %error,
        context = context,
        timestamp = %Utc::now().to_rfc3339(),
        "❌ ERROR"
    );
}
