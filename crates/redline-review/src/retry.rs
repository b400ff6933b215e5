use std::fmt::Display;
use std::future::Future;
use std::time::Duration;

/// Retry plan for one logical operation: a total attempt budget and an
/// exponential backoff schedule between attempts.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub initial_delay: Duration,
    pub max_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        RetryPolicy {
            max_attempts: 3,
            initial_delay: Duration::from_secs(1),
            max_delay: Duration::from_secs(10),
        }
    }
}

impl RetryPolicy {
    /// Delay after the given 1-based attempt: initial * 2^(attempt-1),
    /// capped at `max_delay`.
    fn delay_after(&self, attempt: u32) -> Duration {
        let factor = 1u32
            .checked_shl(attempt.saturating_sub(1))
            .unwrap_or(u32::MAX);
        self.initial_delay.saturating_mul(factor).min(self.max_delay)
    }

    /// Run `op` until it succeeds or the attempt budget is spent. Every
    /// error is retried; the last one is returned unchanged.
    pub async fn run<T, E, F, Fut>(&self, mut op: F) -> Result<T, E>
    where
        E: Display,
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, E>>,
    {
        // A zero budget still means one attempt; there is no useful
        // zero-attempt result.
        let attempts = self.max_attempts.max(1);
        let mut attempt = 1;
        loop {
            match op().await {
                Ok(value) => return Ok(value),
                Err(e) if attempt < attempts => {
                    let delay = self.delay_after(attempt);
                    tracing::warn!(
                        attempt,
                        delay_ms = delay.as_millis() as u64,
                        error = %e,
                        "attempt failed, backing off"
                    );
                    tokio::time::sleep(delay).await;
                    attempt += 1;
                }
                Err(e) => return Err(e),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};

    #[test]
    fn schedule_doubles_and_caps() {
        let policy = RetryPolicy::default();
        assert_eq!(policy.delay_after(1), Duration::from_secs(1));
        assert_eq!(policy.delay_after(2), Duration::from_secs(2));
        assert_eq!(policy.delay_after(3), Duration::from_secs(4));
        assert_eq!(policy.delay_after(4), Duration::from_secs(8));
        assert_eq!(policy.delay_after(5), Duration::from_secs(10));
        assert_eq!(policy.delay_after(40), Duration::from_secs(10));
    }

    #[tokio::test(start_paused = true)]
    async fn exhausts_attempts_and_returns_last_error() {
        let calls = AtomicU32::new(0);
        let calls = &calls;
        let start = tokio::time::Instant::now();

        let result: Result<(), String> = RetryPolicy::default()
            .run(|| async move {
                let n = calls.fetch_add(1, Ordering::SeqCst) + 1;
                Err(format!("boom {n}"))
            })
            .await;

        assert_eq!(result.unwrap_err(), "boom 3");
        assert_eq!(calls.load(Ordering::SeqCst), 3);
        // 1s after the first failure, 2s after the second.
        assert_eq!(start.elapsed(), Duration::from_secs(3));
    }

    #[tokio::test(start_paused = true)]
    async fn recovers_after_transient_failures() {
        let calls = AtomicU32::new(0);
        let calls = &calls;

        let result: Result<u32, String> = RetryPolicy::default()
            .run(|| async move {
                let n = calls.fetch_add(1, Ordering::SeqCst) + 1;
                if n < 3 {
                    Err("transient".to_string())
                } else {
                    Ok(n)
                }
            })
            .await;

        assert_eq!(result.unwrap(), 3);
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn first_success_sleeps_nothing() {
        let start = tokio::time::Instant::now();
        let result: Result<u32, String> = RetryPolicy::default().run(|| async { Ok(7) }).await;
        assert_eq!(result.unwrap(), 7);
        assert_eq!(start.elapsed(), Duration::from_secs(0));
    }

    #[tokio::test(start_paused = true)]
    async fn zero_attempt_budget_still_runs_once() {
        let policy = RetryPolicy {
            max_attempts: 0,
            ..RetryPolicy::default()
        };
        let calls = AtomicU32::new(0);
        let calls = &calls;

        let result: Result<(), String> = policy
            .run(|| async move {
                calls.fetch_add(1, Ordering::SeqCst);
                Err("boom".to_string())
            })
            .await;

        assert!(result.is_err());
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }
}
