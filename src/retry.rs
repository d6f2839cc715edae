use std::future::Future;
use std::time::Duration;

use crate::{ClientOptions, InvalidRetryCount};

/// Fixed-count, fixed-delay retry settings.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct RetryPolicy {
    /// Total number of attempts, including the first one.
    pub max_retries: usize,
    /// Wait between a failed attempt and the next one.
    pub delay: Duration,
}

impl RetryPolicy {
    pub fn new(max_retries: usize, delay: Duration) -> Self {
        Self { max_retries, delay }
    }

    pub fn from_options(options: &ClientOptions) -> Self {
        Self::new(
            options.max_retries,
            Duration::from_millis(options.retry_delay_ms),
        )
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::from_options(&ClientOptions::default())
    }
}

/// Runs `operation` until it succeeds or `policy.max_retries` attempts fail.
///
/// All errors are retried the same way. When every attempt fails, the error
/// from the last attempt is returned as-is. A policy with zero attempts fails
/// immediately with [`InvalidRetryCount`] without calling `operation`.
pub async fn retry_request<T, E, F, Fut>(mut operation: F, policy: RetryPolicy) -> Result<T, E>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, E>>,
    E: From<InvalidRetryCount>,
{
    if policy.max_retries == 0 {
        return Err(E::from(InvalidRetryCount));
    }

    let mut attempt = 1;
    loop {
        match operation().await {
            Ok(value) => return Ok(value),
            Err(err) if attempt >= policy.max_retries => return Err(err),
            Err(_) => {
                #[cfg(feature = "tracing")]
                tracing::debug!(
                    attempt,
                    max_retries = policy.max_retries,
                    delay_ms = policy.delay.as_millis() as u64,
                    "attempt failed, retrying"
                );

                tokio::time::sleep(policy.delay).await;
                attempt += 1;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    use tokio::time::Instant;

    use super::{retry_request, RetryPolicy};
    use crate::{ApiError, ErrorKind};

    fn failure(attempt: usize) -> ApiError {
        ApiError {
            kind: ErrorKind::Server,
            status: 500,
            message: format!("attempt {attempt}"),
            data: None,
        }
    }

    #[tokio::test(start_paused = true)]
    async fn succeeds_after_two_failures_with_two_waits() {
        let calls = AtomicUsize::new(0);
        let calls = &calls;
        let started = Instant::now();

        let result: Result<&str, ApiError> = retry_request(
            move || async move {
                let attempt = calls.fetch_add(1, Ordering::SeqCst) + 1;
                if attempt < 3 {
                    Err(failure(attempt))
                } else {
                    Ok("done")
                }
            },
            RetryPolicy::new(3, Duration::from_millis(10)),
        )
        .await;

        assert_eq!(result, Ok("done"));
        assert_eq!(calls.load(Ordering::SeqCst), 3);
        assert_eq!(started.elapsed(), Duration::from_millis(20));
    }

    #[tokio::test(start_paused = true)]
    async fn exhausted_returns_last_error() {
        let calls = AtomicUsize::new(0);
        let calls = &calls;

        let err = retry_request(
            move || async move {
                let attempt = calls.fetch_add(1, Ordering::SeqCst) + 1;
                Err::<(), _>(failure(attempt))
            },
            RetryPolicy::new(3, Duration::from_millis(10)),
        )
        .await
        .expect_err("must fail");

        assert_eq!(err.message, "attempt 3");
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn first_success_does_not_wait() {
        let started = Instant::now();
        let result: Result<u8, ApiError> =
            retry_request(|| async { Ok(7) }, RetryPolicy::new(3, Duration::from_secs(5))).await;

        assert_eq!(result, Ok(7));
        assert_eq!(started.elapsed(), Duration::ZERO);
    }

    #[tokio::test]
    async fn zero_attempts_fail_fast_without_calling_operation() {
        let calls = AtomicUsize::new(0);
        let calls = &calls;

        let err = retry_request(
            move || async move {
                calls.fetch_add(1, Ordering::SeqCst);
                Ok::<(), ApiError>(())
            },
            RetryPolicy::new(0, Duration::from_millis(10)),
        )
        .await
        .expect_err("zero attempts is invalid");

        assert_eq!(err.kind, ErrorKind::InvalidRetryCount);
        assert_eq!(calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn works_with_foreign_error_types() {
        let result: anyhow::Result<()> = retry_request(
            || async { Err(anyhow::anyhow!("boom")) },
            RetryPolicy::new(1, Duration::ZERO),
        )
        .await;

        assert_eq!(result.expect_err("must fail").to_string(), "boom");
    }
}
