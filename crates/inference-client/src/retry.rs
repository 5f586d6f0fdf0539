//! Exponential backoff for the dashboard feed fetches.
//!
//! Base delay doubles after each failure (1s, 2s, 4s by default); once the
//! retry budget is spent the caller gets a MaxRetries error and must retry
//! manually.

use std::future::Future;
use std::time::Duration;
use tracing::warn;

use inference_common::{InferenceError, Result};

/// Delay before the (attempt+1)-th retry: base * 2^attempt.
pub fn backoff_delay(attempt: u32, base: Duration) -> Duration {
    base * 2u32.saturating_pow(attempt)
}

/// Run `op`, retrying up to `max_retries` times with exponential backoff.
pub async fn with_backoff<T, F, Fut>(max_retries: u32, base: Duration, mut op: F) -> Result<T>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T>>,
{
    let mut attempt = 0u32;
    loop {
        match op().await {
            Ok(value) => return Ok(value),
            Err(err) if attempt < max_retries => {
                let delay = backoff_delay(attempt, base);
                warn!(attempt, delay_ms = delay.as_millis() as u64, error = %err, "fetch failed, retrying");
                tokio::time::sleep(delay).await;
                attempt += 1;
            }
            Err(err) => {
                return Err(InferenceError::MaxRetries(err.to_string()));
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::sync::{Arc, Mutex};
    use tokio::time::Instant;

    #[test]
    fn test_backoff_doubles_from_one_second() {
        let base = Duration::from_secs(1);
        assert_eq!(backoff_delay(0, base), Duration::from_secs(1));
        assert_eq!(backoff_delay(1, base), Duration::from_secs(2));
        assert_eq!(backoff_delay(2, base), Duration::from_secs(4));
    }

    #[tokio::test(start_paused = true)]
    async fn test_three_failures_delay_1s_2s_4s_then_give_up() {
        let calls = Arc::new(AtomicU32::new(0));
        let delays = Arc::new(Mutex::new(Vec::new()));
        let start = Instant::now();

        let calls_inner = calls.clone();
        let delays_inner = delays.clone();
        let result: Result<()> = with_backoff(3, Duration::from_secs(1), move || {
            let calls = calls_inner.clone();
            let delays = delays_inner.clone();
            async move {
                calls.fetch_add(1, Ordering::SeqCst);
                delays.lock().unwrap().push(start.elapsed());
                Err(InferenceError::Backend("metrics feed down".to_string()))
            }
        })
        .await;

        assert!(matches!(result, Err(InferenceError::MaxRetries(_))));
        // Initial try plus three retries.
        assert_eq!(calls.load(Ordering::SeqCst), 4);

        let delays = delays.lock().unwrap();
        assert_eq!(delays[0], Duration::from_secs(0));
        assert_eq!(delays[1], Duration::from_secs(1));
        assert_eq!(delays[2], Duration::from_secs(3)); // +2s
        assert_eq!(delays[3], Duration::from_secs(7)); // +4s
    }

    #[tokio::test(start_paused = true)]
    async fn test_success_after_failure_stops_retrying() {
        let calls = Arc::new(AtomicU32::new(0));
        let calls_inner = calls.clone();
        let result = with_backoff(3, Duration::from_secs(1), move || {
            let calls = calls_inner.clone();
            async move {
                if calls.fetch_add(1, Ordering::SeqCst) == 0 {
                    Err(InferenceError::Backend("transient".to_string()))
                } else {
                    Ok(7u32)
                }
            }
        })
        .await;

        assert_eq!(result.unwrap(), 7);
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }
}
