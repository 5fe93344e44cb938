//! Bounded retry for opening pages.

use std::future::Future;
use std::time::Duration;

use crate::error::ScraperError;

/// Runs `operation` up to `attempts` times, sleeping `delay` between tries.
///
/// Every failure is retried: a browser that failed to launch or a page that
/// failed to load can succeed on a fresh attempt. `operation` receives the
/// 1-based attempt number. When the budget is spent the last error is folded
/// into [`ScraperError::PageOpenFailed`]. An `attempts` of zero is treated as
/// one.
pub(crate) async fn retry_open<T, F, Fut>(
    attempts: u32,
    delay: Duration,
    url: &str,
    mut operation: F,
) -> Result<T, ScraperError>
where
    F: FnMut(u32) -> Fut,
    Fut: Future<Output = Result<T, ScraperError>>,
{
    let attempts = attempts.max(1);
    let mut attempt = 1u32;

    loop {
        match operation(attempt).await {
            Ok(value) => return Ok(value),
            Err(err) if attempt >= attempts => {
                tracing::error!(url, attempts, error = %err, "page open failed");
                return Err(ScraperError::PageOpenFailed {
                    url: url.to_owned(),
                    attempts,
                    reason: err.to_string(),
                });
            }
            Err(err) => {
                tracing::warn!(
                    url,
                    attempt,
                    attempts,
                    delay_ms = u64::try_from(delay.as_millis()).unwrap_or(u64::MAX),
                    error = %err,
                    "page open failed; retrying"
                );
            }
        }

        tokio::time::sleep(delay).await;
        attempt += 1;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::sync::Arc;

    fn launch_failure() -> ScraperError {
        ScraperError::BrowserLaunch("no executable".to_owned())
    }

    #[tokio::test]
    async fn succeeds_on_first_try_without_retrying() {
        let call_count = Arc::new(AtomicU32::new(0));
        let cc = Arc::clone(&call_count);
        let result = retry_open(2, Duration::ZERO, "https://shop.test/", |_| {
            let cc = Arc::clone(&cc);
            async move {
                cc.fetch_add(1, Ordering::SeqCst);
                Ok::<u32, ScraperError>(7)
            }
        })
        .await;
        assert_eq!(result.unwrap(), 7);
        assert_eq!(call_count.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn second_attempt_can_succeed() {
        let result = retry_open(2, Duration::ZERO, "https://shop.test/", |attempt| async move {
            if attempt == 1 {
                Err(launch_failure())
            } else {
                Ok::<u32, ScraperError>(attempt)
            }
        })
        .await;
        assert_eq!(result.unwrap(), 2);
    }

    #[tokio::test]
    async fn exhausted_budget_reports_page_open_failed() {
        let call_count = Arc::new(AtomicU32::new(0));
        let cc = Arc::clone(&call_count);
        let result = retry_open(2, Duration::ZERO, "https://shop.test/item", |_| {
            let cc = Arc::clone(&cc);
            async move {
                cc.fetch_add(1, Ordering::SeqCst);
                Err::<u32, ScraperError>(launch_failure())
            }
        })
        .await;

        assert_eq!(call_count.load(Ordering::SeqCst), 2);
        match result {
            Err(ScraperError::PageOpenFailed {
                url,
                attempts,
                reason,
            }) => {
                assert_eq!(url, "https://shop.test/item");
                assert_eq!(attempts, 2);
                assert!(reason.contains("no executable"), "reason: {reason}");
            }
            other => panic!("expected PageOpenFailed, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn zero_attempts_still_tries_once() {
        let call_count = Arc::new(AtomicU32::new(0));
        let cc = Arc::clone(&call_count);
        let result = retry_open(0, Duration::ZERO, "https://shop.test/", |_| {
            let cc = Arc::clone(&cc);
            async move {
                cc.fetch_add(1, Ordering::SeqCst);
                Err::<u32, ScraperError>(launch_failure())
            }
        })
        .await;
        assert_eq!(call_count.load(Ordering::SeqCst), 1);
        assert!(matches!(
            result,
            Err(ScraperError::PageOpenFailed { attempts: 1, .. })
        ));
    }
}
