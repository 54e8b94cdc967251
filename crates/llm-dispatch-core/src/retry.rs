//! Bounded retries for model and tool calls
//!
//! A call is attempted once and then retried up to `max_retries` times with a
//! fixed delay in between. Callers decide what an exhausted call falls back to.

use std::future::Future;
use std::time::Duration;

/// Fixed-count, fixed-delay retry policy
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Retries after the first attempt
    pub max_retries: u32,
    /// Pause between attempts
    pub delay: Duration,
}

impl RetryPolicy {
    pub fn new(max_retries: u32, delay: Duration) -> Self {
        Self { max_retries, delay }
    }

    /// Total number of attempts including the first one
    pub fn max_attempts(&self) -> u32 {
        self.max_retries.saturating_add(1)
    }
}

/// Run `op` until it succeeds or the policy is exhausted
///
/// `op` receives the 1-based attempt number. `on_error` is called for every
/// failed attempt. The last error is returned when every attempt failed.
pub async fn retry_async<T, E, F, Fut, L>(policy: &RetryPolicy, mut op: F, mut on_error: L) -> Result<T, E>
where
    F: FnMut(u32) -> Fut,
    Fut: Future<Output = Result<T, E>>,
    L: FnMut(u32, &E),
{
    let attempts = policy.max_attempts();
    let mut attempt = 1;
    loop {
        match op(attempt).await {
            Ok(value) => return Ok(value),
            Err(e) => {
                on_error(attempt, &e);
                if attempt >= attempts {
                    return Err(e);
                }
            }
        }
        if !policy.delay.is_zero() {
            tokio::time::sleep(policy.delay).await;
        }
        attempt += 1;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};

    #[tokio::test]
    async fn test_succeeds_first_try() {
        let calls = AtomicU32::new(0);
        let result: Result<u32, String> = retry_async(
            &RetryPolicy::new(3, Duration::ZERO),
            |attempt| {
                calls.fetch_add(1, Ordering::SeqCst);
                async move { Ok(attempt) }
            },
            |_, _| {},
        )
        .await;

        assert_eq!(result, Ok(1));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_recovers_after_failures() {
        let result: Result<u32, String> = retry_async(
            &RetryPolicy::new(3, Duration::ZERO),
            |attempt| async move {
                if attempt < 3 {
                    Err(format!("attempt {} failed", attempt))
                } else {
                    Ok(attempt)
                }
            },
            |_, _| {},
        )
        .await;

        assert_eq!(result, Ok(3));
    }

    #[tokio::test]
    async fn test_exhaustion_returns_last_error() {
        let mut failures = Vec::new();
        let result: Result<(), String> = retry_async(
            &RetryPolicy::new(2, Duration::from_millis(1)),
            |attempt| async move { Err(format!("boom {}", attempt)) },
            |attempt, _| failures.push(attempt),
        )
        .await;

        assert_eq!(result, Err("boom 3".to_string()));
        assert_eq!(failures, vec![1, 2, 3]);
    }

    #[tokio::test]
    async fn test_no_retries() {
        let calls = AtomicU32::new(0);
        let result: Result<(), &str> = retry_async(
            &RetryPolicy::new(0, Duration::ZERO),
            |_| {
                calls.fetch_add(1, Ordering::SeqCst);
                async { Err("nope") }
            },
            |_, _| {},
        )
        .await;

        assert!(result.is_err());
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }
}
