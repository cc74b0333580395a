use std::fmt::Display;
use std::future::Future;
use std::time::Duration;
use tracing::warn;

/// Exponential wait between whole-call retries, clamped to `[min, max]`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Backoff {
    pub min: Duration,
    pub max: Duration,
}

impl Backoff {
    pub fn new(min: Duration, max: Duration) -> Self {
        Self { min, max: max.max(min) }
    }

    /// Wait after the `failed_attempt`-th failure (1-based): min, 2*min, 4*min, ... capped at max
    pub fn delay_for(&self, failed_attempt: u32) -> Duration {
        let exponent = failed_attempt.saturating_sub(1).min(31);
        self.min.saturating_mul(1u32 << exponent).min(self.max)
    }
}

/// Final error of a retried call plus how many attempts were made
#[derive(Debug)]
pub struct RetryExhausted<E> {
    pub attempts: u32,
    pub last: E,
}

/// Run `op` until it succeeds or `max_attempts` are used up.
/// Each attempt starts from scratch; nothing carries over between attempts.
pub async fn retry_with_backoff<T, E, F, Fut>(
    max_attempts: u32,
    backoff: Backoff,
    mut op: F,
) -> Result<T, RetryExhausted<E>>
where
    F: FnMut(u32) -> Fut,
    Fut: Future<Output = Result<T, E>>,
    E: Display,
{
    let max_attempts = max_attempts.max(1);
    let mut attempt = 1;

    loop {
        match op(attempt).await {
            Ok(value) => return Ok(value),
            Err(last) if attempt >= max_attempts => {
                return Err(RetryExhausted { attempts: attempt, last });
            }
            Err(e) => {
                let wait = backoff.delay_for(attempt);
                warn!(
                    "Attempt {}/{} failed: {}. Retrying in {}s",
                    attempt,
                    max_attempts,
                    e,
                    wait.as_secs_f64()
                );
                tokio::time::sleep(wait).await;
                attempt += 1;
            }
        }
    }
}
