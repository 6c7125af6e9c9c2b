//! Retry logic for model requests

use super::error::GenerationError;
use super::{Generation, GenerationOutcome};
use crate::config::RetryPolicy;
use rand::Rng;
use std::future::Future;
use std::time::Duration;
use tokio::time::sleep;

/// Run `operation` until it succeeds, fails permanently, or the attempt
/// budget is spent.
///
/// The operation receives the 1-based attempt number. Retryable failures
/// (network, timeout, 5xx, 429) are retried after an exponential backoff with
/// jitter; anything else returns immediately. When the budget runs out the
/// last failure is returned.
pub async fn execute_with_retry<F, Fut>(policy: &RetryPolicy, mut operation: F) -> GenerationOutcome
where
    F: FnMut(u32) -> Fut,
    Fut: Future<Output = Result<String, GenerationError>>,
{
    let max_attempts = policy.max_attempts.max(1);
    let mut attempt = 1;

    loop {
        let error = match operation(attempt).await {
            Ok(text) => {
                if attempt > 1 {
                    tracing::info!(attempt, "request succeeded after retry");
                }
                return Ok(Generation {
                    text,
                    attempts: attempt,
                });
            }
            Err(error) => error,
        };

        if !error.is_retryable() {
            tracing::warn!(attempt, error = %error, "non-retryable generation error");
            return Err(error);
        }

        if attempt >= max_attempts {
            tracing::error!(attempts = attempt, error = %error, "all retry attempts exhausted");
            return Err(error);
        }

        let delay = jittered(policy.backoff(attempt - 1));
        tracing::warn!(
            attempt,
            max_attempts,
            delay_secs = delay.as_secs_f64(),
            error = %error,
            "retrying after failure"
        );
        sleep(delay).await;
        attempt += 1;
    }
}

/// Add up to 50% random jitter
fn jittered(delay: Duration) -> Duration {
    let max_jitter_ms = (delay.as_millis() / 2) as u64;
    if max_jitter_ms == 0 {
        return delay;
    }
    let jitter_ms = {
        let mut rng = rand::thread_rng();
        rng.gen_range(0..=max_jitter_ms)
    };
    delay + Duration::from_millis(jitter_ms)
}
