//! # Resilience Module
//!
//! Call pacing and retry for every request the pipeline sends to the remote
//! table service.
//!
//! ## Architecture
//!
//! - **Rate Limiter**: one shared instance spaces out all outbound calls
//! - **Retry Executor**: bounded attempts with capped exponential backoff,
//!   throttling before each attempt
//! - **Classification**: a predicate decides which remote errors are worth retrying
//!
//! ## Usage
//!
//! ```rust,no_run
//! use sheet_transfer::resilience::{BackoffPolicy, RateLimiter, RetryExecutor};
//! use sheet_transfer::error::RemoteError;
//! use std::sync::Arc;
//! use std::time::Duration;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let limiter = Arc::new(RateLimiter::new(Duration::from_millis(100)));
//! let executor = RetryExecutor::new(limiter, BackoffPolicy::default());
//!
//! let row_count = executor
//!     .execute("get Data!A:D", 3, || async { Ok::<usize, RemoteError>(42) })
//!     .await?;
//! assert_eq!(row_count, 42);
//! # Ok(())
//! # }
//! ```

pub mod rate_limiter;
pub mod retry;

pub use rate_limiter::RateLimiter;
pub use retry::{BackoffPolicy, RetryExecutor, RetryPredicate};
