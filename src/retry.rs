//! Bounded retry with a linearly increasing backoff.

use std::future::Future;
use std::time::Duration;

/// Run `op` up to `max_attempts` times, sleeping `base_delay * attempt`
/// between attempts. Only errors accepted by `is_retryable` earn another
/// attempt; anything else propagates immediately. The schedule is linear in
/// the attempt index, not exponential.
pub async fn fetch_with_retry<T, E, F, Fut, P>(
    max_attempts: u32,
    base_delay: Duration,
    is_retryable: P,
    mut op: F,
) -> Result<T, E>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, E>>,
    P: Fn(&E) -> bool,
{
    let mut attempt = 1;
    loop {
        match op().await {
            Ok(value) => return Ok(value),
            Err(err) if attempt < max_attempts && is_retryable(&err) => {
                tokio::time::sleep(base_delay * attempt).await;
                attempt += 1;
            }
            Err(err) => return Err(err),
        }
    }
}
