//! Bounded retry with exponential backoff for collaborator calls.
//!
//! Applied only at external boundaries (catalog reads, order submission),
//! never inside pure logic.

use std::future::Future;
use std::time::Duration;

/// Run `op`, retrying up to `attempts` more times on failure with delays of
/// `base_delay * 1.5^n`. Returns the last error once the budget is spent.
pub async fn retry_with_backoff<T, E, F, Fut>(
    attempts: u32,
    base_delay: Duration,
    mut op: F,
) -> Result<T, E>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, E>>,
    E: std::fmt::Display,
{
    let mut attempt = 0u32;
    loop {
        match op().await {
            Ok(value) => return Ok(value),
            Err(err) => {
                attempt += 1;
                if attempt > attempts {
                    return Err(err);
                }
                let delay = backoff_delay(base_delay, attempt);
                tracing::warn!(error = %err, attempt, delay_ms = delay.as_millis() as u64, "Retrying after backoff");
                tokio::time::sleep(delay).await;
            }
        }
    }
}

fn backoff_delay(base: Duration, attempt: u32) -> Duration {
    base.mul_f64(1.5f64.powi(attempt.saturating_sub(1) as i32))
}
