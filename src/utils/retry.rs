use std::thread;
use std::time::Duration;

use tracing::warn;

/// Bounded retry with exponential backoff for transient file contention.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Retries after the first attempt
    pub retries: u32,
    pub initial_backoff: Duration,
}

impl RetryPolicy {
    pub fn new(retries: u32, initial_backoff: Duration) -> Self {
        Self { retries, initial_backoff }
    }

    fn backoff(&self, retry: u32) -> Duration {
        self.initial_backoff.saturating_mul(2u32.saturating_pow(retry))
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self { retries: 3, initial_backoff: Duration::from_millis(50) }
    }
}

/// Outcome of a retried operation that never succeeded.
#[derive(Debug)]
pub struct Exhausted<E> {
    pub last_error: E,
    pub attempts: u32,
    /// Whether the last failure was a transient one (retries ran out) or not
    pub transient: bool,
}

/// Run `op` until it succeeds, fails permanently, or the policy runs out
///
/// Only errors for which `is_transient` returns true are retried.
pub fn with_backoff<T, E>(
    policy: &RetryPolicy,
    is_transient: impl Fn(&E) -> bool,
    mut op: impl FnMut() -> Result<T, E>,
) -> Result<T, Exhausted<E>> {
    let mut attempts = 0;
    loop {
        attempts += 1;
        match op() {
            Ok(value) => return Ok(value),
            Err(e) if is_transient(&e) && attempts <= policy.retries => {
                let delay = policy.backoff(attempts - 1);
                warn!("store busy (attempt {attempts}), retrying in {delay:?}");
                thread::sleep(delay);
            }
            Err(e) => {
                let transient = is_transient(&e);
                return Err(Exhausted { last_error: e, attempts, transient });
            }
        }
    }
}
