use crate::core::feed::{FetchError, Sleeper};
use std::future::Future;
use std::time::Duration;
use tracing::{debug, warn};

/// Outcome of a single request attempt.
pub enum Attempt<T> {
    Done(T),
    RateLimited,
}

/// Retries an async operation while the remote side reports rate limiting.
///
/// # Parameters
/// - `operation`: Closure returning a future for one attempt
/// - `max_attempts`: Total number of attempts, including the first
/// - `backoff`: Delay before each retry
/// - `sleeper`: Performs the delay
///
/// # Returns
/// The successful result, the first non rate-limit error, or
/// [`FetchError::RateLimited`] once every attempt was rejected.
pub async fn with_rate_limit_retry<F, Fut, T>(
    mut operation: F,
    max_attempts: u32,
    backoff: Duration,
    sleeper: &dyn Sleeper,
) -> Result<T, FetchError>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<Attempt<T>, FetchError>>,
{
    let max_attempts = max_attempts.max(1);
    let mut attempt = 1;
    loop {
        match operation().await? {
            Attempt::Done(val) => return Ok(val),
            Attempt::RateLimited => {
                if attempt >= max_attempts {
                    warn!("Rate limited on all {} attempts", max_attempts);
                    return Err(FetchError::RateLimited { attempts: attempt });
                }
                debug!(
                    "Attempt {}/{} rate limited. Retrying in {:?}...",
                    attempt, max_attempts, backoff
                );
                attempt += 1;
                sleeper.sleep(backoff).await;
            }
        }
    }
}
