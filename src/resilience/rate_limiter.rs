//! # Rate Limiter
//!
//! Enforces a minimum spacing between outbound API calls. One limiter is
//! shared by every job of a pipeline run, so the spacing holds across
//! concurrently running jobs, not per job.

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;
use tokio::sync::Mutex;
use tokio::time::{sleep, Instant};
use tracing::trace;

#[derive(Debug)]
pub struct RateLimiter {
    min_interval: Duration,

    /// When the previous throttle returned. The lock is held across the wait,
    /// so callers are released one at a time in arrival order.
    last_call: Mutex<Option<Instant>>,

    throttle_count: AtomicU64,
}

impl RateLimiter {
    pub fn new(min_interval: Duration) -> Self {
        Self {
            min_interval,
            last_call: Mutex::new(None),
            throttle_count: AtomicU64::new(0),
        }
    }

    /// A limiter that never waits
    pub fn unlimited() -> Self {
        Self::new(Duration::ZERO)
    }

    /// Wait until at least `min_interval` has passed since the previous call returned
    pub async fn throttle(&self) {
        let mut last_call = self.last_call.lock().await;

        if let Some(previous) = *last_call {
            let elapsed = previous.elapsed();
            if elapsed < self.min_interval {
                let wait = self.min_interval - elapsed;
                trace!(wait_ms = wait.as_millis() as u64, "⏳ Rate limiter delaying call");
                sleep(wait).await;
            }
        }

        *last_call = Some(Instant::now());
        self.throttle_count.fetch_add(1, Ordering::Relaxed);
    }

    pub fn min_interval(&self) -> Duration {
        self.min_interval
    }

    /// Number of completed throttle calls
    pub fn throttle_count(&self) -> u64 {
        self.throttle_count.load(Ordering::Relaxed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    #[tokio::test(start_paused = true)]
    async fn test_first_call_is_immediate() {
        let limiter = RateLimiter::new(Duration::from_millis(500));
        let start = Instant::now();
        limiter.throttle().await;
        assert_eq!(start.elapsed(), Duration::ZERO);
        assert_eq!(limiter.throttle_count(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_sequential_calls_are_spaced() {
        let limiter = RateLimiter::new(Duration::from_millis(100));
        let start = Instant::now();
        for _ in 0..3 {
            limiter.throttle().await;
        }
        assert!(start.elapsed() >= Duration::from_millis(200));
        assert_eq!(limiter.throttle_count(), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn test_no_wait_when_interval_already_elapsed() {
        let limiter = RateLimiter::new(Duration::from_millis(100));
        limiter.throttle().await;
        sleep(Duration::from_millis(250)).await;

        let before = Instant::now();
        limiter.throttle().await;
        assert_eq!(before.elapsed(), Duration::ZERO);
    }

    #[tokio::test(start_paused = true)]
    async fn test_concurrent_callers_share_spacing() {
        let limiter = Arc::new(RateLimiter::new(Duration::from_millis(100)));
        let handles = (0..5).map(|_| {
            let limiter = limiter.clone();
            tokio::spawn(async move {
                limiter.throttle().await;
                Instant::now()
            })
        });

        let mut released: Vec<Instant> = futures::future::join_all(handles)
            .await
            .into_iter()
            .map(Result::unwrap)
            .collect();
        released.sort();

        for pair in released.windows(2) {
            assert!(pair[1] - pair[0] >= Duration::from_millis(100));
        }
        assert_eq!(limiter.throttle_count(), 5);
    }
}
