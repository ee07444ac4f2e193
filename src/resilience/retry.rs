//! Retry with exponential backoff.
//!
//! One policy drives every retried capability, from both blocking and async call
//! sites. Attempts are numbered from 0; the k-th failed attempt is followed by a
//! wait of `unit * 2^k` before the loop moves on, and the loop never runs more
//! than `max_attempts` attempts. All attempt failures are treated alike.

use crate::transport::TransportError;
use crate::{Error, Result};
use std::future::Future;
use std::time::Duration;
use tracing::{debug, warn};

pub const DEFAULT_MAX_ATTEMPTS: u32 = 8;
pub const DEFAULT_BACKOFF_UNIT: Duration = Duration::from_secs(1);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    max_attempts: u32,
    unit: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_ATTEMPTS, DEFAULT_BACKOFF_UNIT)
    }
}

impl RetryPolicy {
    /// `max_attempts` is clamped to at least one attempt.
    pub fn new(max_attempts: u32, unit: Duration) -> Self {
        Self {
            max_attempts: max_attempts.max(1),
            unit,
        }
    }

    pub fn max_attempts(&self) -> u32 {
        self.max_attempts
    }

    pub fn unit(&self) -> Duration {
        self.unit
    }

    /// Backoff after the failed attempt with 0-based index `attempt`.
    pub fn delay_for(&self, attempt: u32) -> Duration {
        let factor = 1u32.checked_shl(attempt).unwrap_or(u32::MAX);
        self.unit.saturating_mul(factor)
    }

    /// The full wait schedule of an invocation whose every attempt fails.
    pub fn schedule(&self) -> impl Iterator<Item = Duration> + '_ {
        (0..self.max_attempts).map(move |attempt| self.delay_for(attempt))
    }

    pub fn total_backoff(&self) -> Duration {
        self.schedule()
            .fold(Duration::ZERO, |acc, d| acc.saturating_add(d))
    }

    /// Run `attempt` until it succeeds, sleeping the calling thread between failures.
    pub fn execute_blocking<T, F>(&self, capability: &str, mut attempt: F) -> Result<T>
    where
        F: FnMut(u32) -> std::result::Result<T, TransportError>,
    {
        let mut last_error = None;
        for index in 0..self.max_attempts {
            match attempt(index) {
                Ok(value) => {
                    debug!(capability, attempts = index + 1, "capability attempt succeeded");
                    return Ok(value);
                }
                Err(err) => {
                    let delay = self.on_failure(capability, index, &err);
                    last_error = Some(err);
                    std::thread::sleep(delay);
                }
            }
        }
        Err(self.exhausted(capability, last_error))
    }

    /// Run `attempt` until it succeeds, suspending cooperatively between failures.
    ///
    /// The backoff is a timer await, so concurrently scheduled invocations keep
    /// making progress while this one waits. Dropping the returned future cancels
    /// the loop at its current suspension point.
    pub async fn execute<T, F, Fut>(&self, capability: &str, mut attempt: F) -> Result<T>
    where
        F: FnMut(u32) -> Fut,
        Fut: Future<Output = std::result::Result<T, TransportError>>,
    {
        let mut last_error = None;
        for index in 0..self.max_attempts {
            match attempt(index).await {
                Ok(value) => {
                    debug!(capability, attempts = index + 1, "capability attempt succeeded");
                    return Ok(value);
                }
                Err(err) => {
                    let delay = self.on_failure(capability, index, &err);
                    last_error = Some(err);
                    tokio::time::sleep(delay).await;
                }
            }
        }
        Err(self.exhausted(capability, last_error))
    }

    fn on_failure(&self, capability: &str, attempt: u32, err: &TransportError) -> Duration {
        let delay = self.delay_for(attempt);
        warn!(
            capability,
            attempt,
            max_attempts = self.max_attempts,
            delay_ms = delay.as_millis() as u64,
            error = %err,
            "capability attempt failed, retrying after backoff"
        );
        delay
    }

    fn exhausted(&self, capability: &str, last_error: Option<TransportError>) -> Error {
        warn!(
            capability,
            attempts = self.max_attempts,
            "capability failed after hitting max retries"
        );
        Error::RetriesExhausted {
            capability: capability.to_string(),
            attempts: self.max_attempts,
            last_error: last_error
                .map(|e| e.to_string())
                .unwrap_or_else(|| "no attempt was made".to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};

    fn failure() -> TransportError {
        TransportError::Other("connection refused".into())
    }

    #[test]
    fn test_delay_schedule_doubles() {
        let policy = RetryPolicy::default();
        let delays: Vec<u64> = policy.schedule().map(|d| d.as_secs()).collect();
        assert_eq!(delays, vec![1, 2, 4, 8, 16, 32, 64, 128]);
        assert_eq!(policy.total_backoff(), Duration::from_secs(255));
    }

    #[test]
    fn test_delay_saturates_instead_of_overflowing() {
        let policy = RetryPolicy::new(64, Duration::from_secs(1));
        assert_eq!(policy.delay_for(40), Duration::from_secs(u32::MAX as u64));
    }

    #[test]
    fn test_zero_attempts_is_clamped() {
        assert_eq!(RetryPolicy::new(0, Duration::ZERO).max_attempts(), 1);
    }

    #[test]
    fn test_blocking_exhausts_after_exact_attempt_count() {
        let policy = RetryPolicy::new(5, Duration::ZERO);
        let calls = AtomicU32::new(0);
        let err = policy
            .execute_blocking::<(), _>("multi/test", |_| {
                calls.fetch_add(1, Ordering::SeqCst);
                Err(failure())
            })
            .unwrap_err();
        assert_eq!(calls.load(Ordering::SeqCst), 5);
        match err {
            Error::RetriesExhausted {
                capability,
                attempts,
                last_error,
            } => {
                assert_eq!(capability, "multi/test");
                assert_eq!(attempts, 5);
                assert!(last_error.contains("connection refused"));
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_blocking_first_success_short_circuits() {
        let policy = RetryPolicy::new(8, Duration::from_millis(1));
        let mut seen = Vec::new();
        let value = policy
            .execute_blocking("multi/test", |attempt| {
                seen.push(attempt);
                if attempt == 3 {
                    Ok("done")
                } else {
                    Err(failure())
                }
            })
            .unwrap();
        assert_eq!(value, "done");
        assert_eq!(seen, vec![0, 1, 2, 3]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_async_waits_follow_schedule() {
        let policy = RetryPolicy::default();
        let start = tokio::time::Instant::now();
        let mut stamps = Vec::new();
        let err = policy
            .execute::<(), _, _>("multi/test", |_| {
                stamps.push(start.elapsed());
                async { Err(failure()) }
            })
            .await
            .unwrap_err();
        assert!(err.is_retries_exhausted());
        assert_eq!(stamps.len(), 8);

        // attempt k starts after 1 + 2 + ... + 2^(k-1) = 2^k - 1 units
        for (k, stamp) in stamps.iter().enumerate() {
            assert_eq!(stamp.as_secs(), (1u64 << k) - 1);
        }
        assert_eq!(start.elapsed(), Duration::from_secs(255));
    }

    #[tokio::test(start_paused = true)]
    async fn test_async_success_at_index_three_stops_waiting() {
        let policy = RetryPolicy::default();
        let start = tokio::time::Instant::now();
        let calls = AtomicU32::new(0);
        let value = policy
            .execute("multi/test", |attempt| {
                calls.fetch_add(1, Ordering::SeqCst);
                async move {
                    if attempt == 3 {
                        Ok(attempt)
                    } else {
                        Err(failure())
                    }
                }
            })
            .await
            .unwrap();
        assert_eq!(value, 3);
        assert_eq!(calls.load(Ordering::SeqCst), 4);
        assert_eq!(start.elapsed(), Duration::from_secs(1 + 2 + 4));
    }

    #[tokio::test(start_paused = true)]
    async fn test_async_backoff_does_not_block_other_work() {
        let policy = RetryPolicy::new(2, Duration::from_secs(10));
        let ticker = tokio::spawn(async {
            let mut ticks = 0u32;
            for _ in 0..5 {
                tokio::time::sleep(Duration::from_secs(1)).await;
                ticks += 1;
            }
            ticks
        });
        let _ = policy
            .execute::<(), _, _>("multi/test", |_| async { Err(failure()) })
            .await;
        assert_eq!(ticker.await.unwrap(), 5);
    }
}
