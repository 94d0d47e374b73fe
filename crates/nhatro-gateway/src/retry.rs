//! # Retry with Backoff
//!
//! Wraps one gateway call in a timeout, retries transient failures on an
//! exponential schedule, and stops as soon as the token is cancelled.
//!
//! ```text
//!   attempt 1 ──✗ transient──► sleep 200ms ──► attempt 2 ──✗──► sleep 400ms ──► attempt 3
//!       │                          │                                 │
//!       └─ ✗ permanent → Err       └─ cancelled → Err(Cancelled)     └─ ✗ → RetriesExhausted
//! ```

use backoff::backoff::Backoff;
use backoff::ExponentialBackoff;
use std::future::Future;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::config::RetryPolicy;
use crate::error::{GatewayError, GatewayResult};

fn schedule(policy: &RetryPolicy) -> ExponentialBackoff {
    let mut backoff = ExponentialBackoff {
        initial_interval: policy.initial_backoff(),
        max_interval: policy.max_backoff(),
        multiplier: policy.multiplier,
        randomization_factor: policy.randomization_factor,
        max_elapsed_time: None,
        ..Default::default()
    };
    backoff.reset();
    backoff
}

/// Runs `call` until it succeeds, fails permanently, exhausts
/// `policy.max_attempts`, or `cancel` fires.
pub async fn with_retry<T, F, Fut>(
    operation: &str,
    policy: &RetryPolicy,
    timeout: Duration,
    cancel: &CancellationToken,
    mut call: F,
) -> GatewayResult<T>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = GatewayResult<T>>,
{
    let mut backoff = schedule(policy);
    let mut attempt = 0u32;

    loop {
        attempt += 1;

        let outcome = tokio::select! {
            biased;
            _ = cancel.cancelled() => return Err(GatewayError::Cancelled),
            result = tokio::time::timeout(timeout, call()) => match result {
                Ok(result) => result,
                Err(_) => Err(GatewayError::Timeout {
                    service: operation.to_string(),
                    millis: timeout.as_millis() as u64,
                }),
            },
        };

        let error = match outcome {
            Ok(value) => {
                if attempt > 1 {
                    info!(operation, attempt, "Succeeded after retry");
                }
                return Ok(value);
            }
            Err(e) => e,
        };

        if !error.is_retryable() {
            return Err(error);
        }
        if attempt >= policy.max_attempts {
            warn!(operation, attempts = attempt, error = %error, "Giving up");
            return Err(GatewayError::RetriesExhausted {
                operation: operation.to_string(),
                attempts: attempt,
                last_error: error.to_string(),
            });
        }

        let delay = backoff.next_backoff().unwrap_or_else(|| policy.max_backoff());
        debug!(operation, attempt, ?delay, error = %error, "Retrying");

        tokio::select! {
            biased;
            _ = cancel.cancelled() => return Err(GatewayError::Cancelled),
            _ = tokio::time::sleep(delay) => {}
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::sync::Arc;

    fn flaky(failures: u32, counter: Arc<AtomicU32>) -> impl FnMut() -> std::pin::Pin<Box<dyn Future<Output = GatewayResult<u32>> + Send>> {
        move || {
            let counter = counter.clone();
            Box::pin(async move {
                let n = counter.fetch_add(1, Ordering::SeqCst) + 1;
                if n <= failures {
                    Err(GatewayError::unavailable("zalo", "reset"))
                } else {
                    Ok(n)
                }
            })
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_recovers_from_transient_failures() {
        let counter = Arc::new(AtomicU32::new(0));
        let token = CancellationToken::new();
        let result = with_retry(
            "zalo.send",
            &RetryPolicy::default(),
            Duration::from_secs(1),
            &token,
            flaky(2, counter.clone()),
        )
        .await;

        assert_eq!(result, Ok(3));
        assert_eq!(counter.load(Ordering::SeqCst), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn test_gives_up_after_max_attempts() {
        let counter = Arc::new(AtomicU32::new(0));
        let token = CancellationToken::new();
        let result = with_retry(
            "zalo.send",
            &RetryPolicy::default(),
            Duration::from_secs(1),
            &token,
            flaky(10, counter.clone()),
        )
        .await;

        assert!(matches!(result, Err(GatewayError::RetriesExhausted { attempts: 3, .. })));
        assert_eq!(counter.load(Ordering::SeqCst), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn test_permanent_error_is_not_retried() {
        let counter = Arc::new(AtomicU32::new(0));
        let token = CancellationToken::new();
        let calls = counter.clone();
        let result: GatewayResult<()> = with_retry(
            "zalo.send",
            &RetryPolicy::default(),
            Duration::from_secs(1),
            &token,
            move || {
                calls.fetch_add(1, Ordering::SeqCst);
                async { Err(GatewayError::InvalidRecipient("abc".into())) }
            },
        )
        .await;

        assert!(matches!(result, Err(GatewayError::InvalidRecipient(_))));
        assert_eq!(counter.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_slow_call_times_out() {
        let token = CancellationToken::new();
        let result: GatewayResult<()> = with_retry(
            "storage.put",
            &RetryPolicy::none(),
            Duration::from_millis(100),
            &token,
            || async {
                tokio::time::sleep(Duration::from_secs(5)).await;
                Ok(())
            },
        )
        .await;

        assert!(matches!(result, Err(GatewayError::RetriesExhausted { attempts: 1, .. })));
    }

    #[tokio::test(start_paused = true)]
    async fn test_cancel_stops_before_first_attempt() {
        let counter = Arc::new(AtomicU32::new(0));
        let token = CancellationToken::new();
        token.cancel();

        let result = with_retry(
            "zalo.send",
            &RetryPolicy::default(),
            Duration::from_secs(1),
            &token,
            flaky(0, counter.clone()),
        )
        .await;

        assert_eq!(result, Err(GatewayError::Cancelled));
        assert_eq!(counter.load(Ordering::SeqCst), 0);
    }
}
