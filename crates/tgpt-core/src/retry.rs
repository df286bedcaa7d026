//! Bounded fixed-delay retry.

use std::{future::Future, time::Duration};

use tokio::time::sleep;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Total attempts, including the first. `0` is treated as `1`.
    pub max_attempts: u32,
    /// Sleep between consecutive attempts.
    pub delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            delay: Duration::from_secs(2),
        }
    }
}

/// Run `op` until it succeeds, fails with an error `is_retryable` rejects, or
/// the policy's attempt budget is spent. Returns the last error on failure.
///
/// `op` receives the 1-based attempt number.
pub async fn retry<T, E, Op, Fut>(
    policy: RetryPolicy,
    is_retryable: impl Fn(&E) -> bool,
    mut op: Op,
) -> std::result::Result<T, E>
where
    Op: FnMut(u32) -> Fut,
    Fut: Future<Output = std::result::Result<T, E>>,
    E: std::fmt::Display,
{
    let max_attempts = policy.max_attempts.max(1);
    let mut attempt = 1u32;
    loop {
        match op(attempt).await {
            Ok(v) => return Ok(v),
            Err(e) => {
                let retryable = is_retryable(&e);
                tracing::warn!(
                    attempt,
                    max_attempts,
                    retryable,
                    error = %e,
                    "attempt failed"
                );
                if !retryable || attempt >= max_attempts {
                    return Err(e);
                }
                attempt += 1;
                if !policy.delay.is_zero() {
                    sleep(policy.delay).await;
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};

    fn fast(max_attempts: u32) -> RetryPolicy {
        RetryPolicy {
            max_attempts,
            delay: Duration::ZERO,
        }
    }

    #[tokio::test]
    async fn returns_first_success() {
        let calls = AtomicU32::new(0);
        let out: Result<u32, String> = retry(fast(3), |_| true, |n| {
            calls.fetch_add(1, Ordering::SeqCst);
            async move { Ok(n) }
        })
        .await;
        assert_eq!(out, Ok(1));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn retries_until_success() {
        let out: Result<u32, String> = retry(fast(3), |_| true, |n| async move {
            if n < 3 {
                Err(format!("boom {n}"))
            } else {
                Ok(n)
            }
        })
        .await;
        assert_eq!(out, Ok(3));
    }

    #[tokio::test]
    async fn stops_at_attempt_bound_with_last_error() {
        let calls = AtomicU32::new(0);
        let out: Result<(), String> = retry(fast(3), |_| true, |n| {
            calls.fetch_add(1, Ordering::SeqCst);
            async move { Err(format!("boom {n}")) }
        })
        .await;
        assert_eq!(out, Err("boom 3".to_string()));
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn non_retryable_error_stops_immediately() {
        let calls = AtomicU32::new(0);
        let out: Result<(), String> = retry(fast(5), |e: &String| e != "fatal", |_| {
            calls.fetch_add(1, Ordering::SeqCst);
            async { Err("fatal".to_string()) }
        })
        .await;
        assert!(out.is_err());
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn zero_attempts_still_runs_once() {
        let calls = AtomicU32::new(0);
        let _: Result<(), String> = retry(fast(0), |_| true, |_| {
            calls.fetch_add(1, Ordering::SeqCst);
            async { Err("x".to_string()) }
        })
        .await;
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn sleeps_between_attempts() {
        let policy = RetryPolicy {
            max_attempts: 2,
            delay: Duration::from_millis(30),
        };
        let started = std::time::Instant::now();
        let _: Result<(), String> = retry(policy, |_| true, |_| async { Err("x".to_string()) }).await;
        assert!(started.elapsed() >= Duration::from_millis(30));
    }
}
