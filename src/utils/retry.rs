use std::time::Duration;

use tokio::time::sleep;

// ============================================================================
// Retry with Exponential Backoff
// ============================================================================
//
// Commands either fully apply or not at all, so a caller can always repeat
// one after a transient persistence failure. This helper is that caller-side
// loop; errors decide for themselves whether a repeat can help.
//
// ============================================================================

#[derive(Clone, Debug)]
pub struct RetryConfig {
    pub max_attempts: u32,
    pub initial_delay: Duration,
    pub max_delay: Duration,
    pub multiplier: f64,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            initial_delay: Duration::from_millis(100),
            max_delay: Duration::from_secs(10),
            multiplier: 2.0,
        }
    }
}

/// Classifies whether repeating the failed operation can succeed.
pub trait IsTransient {
    fn is_transient(&self) -> bool;
}

#[derive(Debug)]
pub enum RetryResult<T, E> {
    Success(T),
    /// Still failing transiently after the attempt budget ran out.
    Exhausted(E),
    /// A rejection that retrying cannot change.
    Permanent(E),
}

/// Run `operation` until it succeeds, fails permanently, or exhausts the
/// attempt budget. Only transient errors are retried.
pub async fn retry_on_transient<F, Fut, T, E>(
    config: RetryConfig,
    mut operation: F,
) -> RetryResult<T, E>
where
    F: FnMut(u32) -> Fut,
    Fut: std::future::Future<Output = Result<T, E>>,
    E: std::fmt::Display + IsTransient,
{
    let mut attempt = 0;
    let mut delay = config.initial_delay;

    loop {
        attempt += 1;

        match operation(attempt).await {
            Ok(result) => {
                if attempt > 1 {
                    tracing::info!(attempt = attempt, "Operation succeeded after retry");
                }
                return RetryResult::Success(result);
            }
            Err(error) if !error.is_transient() => {
                return RetryResult::Permanent(error);
            }
            Err(error) => {
                if attempt >= config.max_attempts {
                    tracing::error!(
                        attempt = attempt,
                        error = %error,
                        "Operation still failing transiently, giving up"
                    );
                    return RetryResult::Exhausted(error);
                }

                tracing::warn!(
                    attempt = attempt,
                    error = %error,
                    delay_ms = delay.as_millis(),
                    "Transient failure, retrying after delay"
                );
                sleep(delay).await;

                delay = Duration::from_millis(
                    ((delay.as_millis() as f64) * config.multiplier) as u64,
                )
                .min(config.max_delay);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::sync::Arc;

    #[derive(Debug)]
    struct TestError {
        transient: bool,
    }

    impl std::fmt::Display for TestError {
        fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
            write!(f, "test error (transient: {})", self.transient)
        }
    }

    impl IsTransient for TestError {
        fn is_transient(&self) -> bool {
            self.transient
        }
    }

    fn quick_config() -> RetryConfig {
        RetryConfig {
            max_attempts: 3,
            initial_delay: Duration::from_millis(5),
            max_delay: Duration::from_millis(20),
            multiplier: 2.0,
        }
    }

    #[tokio::test]
    async fn test_transient_failure_retries_to_success() {
        let counter = Arc::new(AtomicU32::new(0));
        let counter_clone = counter.clone();

        let result = retry_on_transient(quick_config(), |_attempt| {
            let counter = counter_clone.clone();
            async move {
                if counter.fetch_add(1, Ordering::SeqCst) < 2 {
                    Err(TestError { transient: true })
                } else {
                    Ok("done")
                }
            }
        })
        .await;

        assert!(matches!(result, RetryResult::Success("done")));
        assert_eq!(counter.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_permanent_failure_is_not_retried() {
        let counter = Arc::new(AtomicU32::new(0));
        let counter_clone = counter.clone();

        let result = retry_on_transient(quick_config(), |_attempt| {
            let counter = counter_clone.clone();
            async move {
                counter.fetch_add(1, Ordering::SeqCst);
                Err::<(), _>(TestError { transient: false })
            }
        })
        .await;

        assert!(matches!(result, RetryResult::Permanent(_)));
        assert_eq!(counter.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_attempt_budget_is_exhausted() {
        let result = retry_on_transient(quick_config(), |_attempt| async {
            Err::<(), _>(TestError { transient: true })
        })
        .await;

        assert!(matches!(result, RetryResult::Exhausted(_)));
    }
}
