//! Bounded retries with a fixed delay between attempts.

use std::fmt::Display;
use std::future::Future;
use std::time::Duration;
use tokio_retry::strategy::FixedInterval;
use tokio_retry::Retry;
use tracing::warn;

/// How often, and how patiently, a failing call is repeated.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    max_attempts: usize,
    delay: Duration,
}

impl RetryPolicy {
    /// A policy of `max_attempts` total attempts (at least one) with `delay` between them.
    pub fn new(max_attempts: usize, delay: Duration) -> Self {
        Self {
            max_attempts: max_attempts.max(1),
            delay,
        }
    }

    pub fn max_attempts(&self) -> usize {
        self.max_attempts
    }

    fn strategy(&self) -> impl Iterator<Item = Duration> {
        FixedInterval::new(self.delay).take(self.max_attempts - 1)
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::new(3, Duration::from_secs(1))
    }
}

/// Run `operation` until it succeeds or the policy's attempts are used up.
///
/// Every failed attempt except the last is logged at `warn`; the last
/// failure is returned to the caller untouched.
pub async fn with_retry<F, Fut, T, E>(policy: &RetryPolicy, mut operation: F) -> Result<T, E>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, E>>,
    E: Display,
{
    let max_attempts = policy.max_attempts;
    let mut attempt = 0;

    Retry::start(policy.strategy(), || {
        attempt += 1;
        let current = attempt;
        let call = operation();
        async move {
            let result = call.await;
            if let Err(e) = &result {
                if current < max_attempts {
                    warn!("API call failed (attempt {}/{}): {}", current, max_attempts, e);
                }
            }
            result
        }
    })
    .await
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use tokio::time::Instant;

    #[tokio::test(start_paused = true)]
    async fn succeeds_on_third_attempt_after_two_delays() {
        let calls = AtomicUsize::new(0);
        let started = Instant::now();

        let result: Result<&str, String> = with_retry(&RetryPolicy::default(), || {
            let n = calls.fetch_add(1, Ordering::SeqCst) + 1;
            async move {
                if n < 3 {
                    Err(format!("connection refused #{}", n))
                } else {
                    Ok("generated")
                }
            }
        })
        .await;

        assert_eq!(result, Ok("generated"));
        assert_eq!(calls.load(Ordering::SeqCst), 3);
        assert_eq!(started.elapsed(), Duration::from_secs(2));
    }

    #[tokio::test(start_paused = true)]
    async fn exhausted_attempts_return_last_error() {
        let calls = AtomicUsize::new(0);
        let started = Instant::now();
        let policy = RetryPolicy::new(3, Duration::from_millis(250));

        let result: Result<(), String> = with_retry(&policy, || {
            let n = calls.fetch_add(1, Ordering::SeqCst) + 1;
            async move { Err(format!("503 on attempt {}", n)) }
        })
        .await;

        assert_eq!(result, Err("503 on attempt 3".to_string()));
        assert_eq!(calls.load(Ordering::SeqCst), 3);
        assert_eq!(started.elapsed(), Duration::from_millis(500));
    }

    #[tokio::test(start_paused = true)]
    async fn first_success_does_not_sleep() {
        let started = Instant::now();
        let result: Result<u8, String> =
            with_retry(&RetryPolicy::default(), || async { Ok(7) }).await;

        assert_eq!(result, Ok(7));
        assert_eq!(started.elapsed(), Duration::ZERO);
    }

    #[test]
    fn zero_attempts_means_one() {
        let policy = RetryPolicy::new(0, Duration::from_secs(1));
        assert_eq!(policy.max_attempts(), 1);
        assert_eq!(policy.strategy().count(), 0);
    }
}
