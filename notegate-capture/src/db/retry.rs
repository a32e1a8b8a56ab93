//! Retry logic for transient database lock errors.
//!
//! WAL permits one writer at a time; the webhook handler, the sweeper and
//! concurrent deliveries can still collide on that writer. Short exponential
//! backoff absorbs the contention window instead of failing the message.

use notegate_common::Result;
use std::time::{Duration, Instant};

/// Retry a database operation with exponential backoff until `max_wait_ms`
/// elapses.
///
/// Only "database is locked" errors are retried; anything else returns
/// immediately. Backoff starts at 10ms and doubles up to 1000ms.
pub async fn retry_on_lock<F, Fut, T>(
    operation_name: &str,
    max_wait_ms: u64,
    mut operation: F,
) -> Result<T>
where
    F: FnMut() -> Fut,
    Fut: std::future::Future<Output = Result<T>>,
{
    let start_time = Instant::now();
    let max_duration = Duration::from_millis(max_wait_ms);
    let mut attempt = 0u32;
    let mut backoff_ms = 10u64;

    loop {
        attempt += 1;

        match operation().await {
            Ok(result) => {
                if attempt > 1 {
                    tracing::debug!(
                        operation = operation_name,
                        attempt,
                        elapsed_ms = start_time.elapsed().as_millis() as u64,
                        "Database operation succeeded after retry"
                    );
                }
                return Ok(result);
            }
            Err(err) => {
                let is_lock_error = err.to_string().contains("database is locked");

                if !is_lock_error || start_time.elapsed() >= max_duration {
                    if is_lock_error {
                        tracing::error!(
                            operation = operation_name,
                            attempt,
                            "Database still locked after {}ms, giving up",
                            max_wait_ms
                        );
                    }
                    return Err(err);
                }

                tracing::warn!(
                    operation = operation_name,
                    attempt,
                    backoff_ms,
                    "Database locked, retrying"
                );
                tokio::time::sleep(Duration::from_millis(backoff_ms)).await;
                backoff_ms = (backoff_ms * 2).min(1000);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use notegate_common::Error;
    use std::sync::atomic::{AtomicU32, Ordering};

    #[tokio::test]
    async fn succeeds_first_try_without_sleeping() {
        let result = retry_on_lock("test op", 100, || async { Ok::<_, Error>(7) }).await;
        assert_eq!(result.unwrap(), 7);
    }

    #[tokio::test]
    async fn retries_lock_errors_until_success() {
        let attempts = AtomicU32::new(0);
        let result = retry_on_lock("test op", 5000, || {
            let n = attempts.fetch_add(1, Ordering::SeqCst);
            async move {
                if n < 2 {
                    Err(Error::Internal("database is locked".to_string()))
                } else {
                    Ok(42)
                }
            }
        })
        .await;
        assert_eq!(result.unwrap(), 42);
        assert_eq!(attempts.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn non_lock_errors_return_immediately() {
        let attempts = AtomicU32::new(0);
        let result: Result<()> = retry_on_lock("test op", 5000, || {
            attempts.fetch_add(1, Ordering::SeqCst);
            async { Err(Error::Internal("syntax error".to_string())) }
        })
        .await;
        assert!(result.is_err());
        assert_eq!(attempts.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn gives_up_when_budget_is_spent() {
        let result: Result<()> = retry_on_lock("test op", 30, || async {
            Err(Error::Internal("database is locked".to_string()))
        })
        .await;
        assert!(result.is_err());
    }
}
