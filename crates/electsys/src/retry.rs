//! Retry strategy for transport faults.
//!
//! The default policy waits a fixed second between attempts and never gives
//! up, which is what the portal tooling has always done. Callers that need a
//! bound can cap attempts, switch to exponential backoff, or attach a
//! [`CancelToken`] and flip it from another thread.

use std::fmt::Display;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use crate::types::ElectError;

/// Delay between transport retries.
pub const DEFAULT_RETRY_DELAY: Duration = Duration::from_secs(1);

/// Shortest wait any backoff yields, so a zero configuration cannot spin.
pub const MIN_RETRY_DELAY: Duration = Duration::from_millis(10);

/// How the wait between attempts evolves.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Backoff {
    /// Same delay after every fault.
    Fixed(Duration),
    /// `initial * factor^(n-1)` after the n-th fault, capped at `max`.
    /// A factor below 1 is treated as 1.
    Exponential {
        initial: Duration,
        factor: u32,
        max: Duration,
    },
}

impl Backoff {
    /// Delay to wait after the given number of consecutive failures, never
    /// shorter than [`MIN_RETRY_DELAY`].
    pub fn delay_after(&self, failures: u32) -> Duration {
        let delay = match *self {
            Backoff::Fixed(delay) => delay,
            Backoff::Exponential {
                initial,
                factor,
                max,
            } => {
                let exp = failures.saturating_sub(1);
                let mult = factor.max(1).checked_pow(exp).unwrap_or(u32::MAX);
                initial.checked_mul(mult).unwrap_or(max).min(max)
            }
        };
        delay.max(MIN_RETRY_DELAY)
    }
}

/// Shared flag that stops a retry loop at its next check.
#[derive(Debug, Clone, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

/// Constructible retry policy handed to the request executor.
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    /// Total attempts allowed, including the first. `None` retries forever.
    pub max_attempts: Option<u32>,
    pub backoff: Backoff,
    pub cancel: Option<CancelToken>,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::unbounded(DEFAULT_RETRY_DELAY)
    }
}

impl RetryPolicy {
    /// Retry forever with a fixed delay.
    pub fn unbounded(delay: Duration) -> Self {
        Self {
            max_attempts: None,
            backoff: Backoff::Fixed(delay),
            cancel: None,
        }
    }

    /// Give up after `max_attempts` total attempts.
    pub fn bounded(max_attempts: u32, delay: Duration) -> Self {
        Self {
            max_attempts: Some(max_attempts.max(1)),
            backoff: Backoff::Fixed(delay),
            cancel: None,
        }
    }

    pub fn with_backoff(mut self, backoff: Backoff) -> Self {
        self.backoff = backoff;
        self
    }

    pub fn with_cancel(mut self, token: CancelToken) -> Self {
        self.cancel = Some(token);
        self
    }

    fn cancelled(&self) -> bool {
        self.cancel.as_ref().is_some_and(|t| t.is_cancelled())
    }

    /// Run `op` until it succeeds, the attempt budget runs out, or the
    /// cancel token is set. `op` receives the 1-based attempt number.
    ///
    /// Every `Err` from `op` is treated as retryable; classify before
    /// returning if some failures should not be retried.
    pub fn run<T, E, F>(&self, mut op: F) -> Result<T, ElectError>
    where
        E: Display,
        F: FnMut(u32) -> Result<T, E>,
    {
        let mut attempt = 0u32;
        loop {
            if self.cancelled() {
                return Err(ElectError::Cancelled { attempts: attempt });
            }
            attempt = attempt.saturating_add(1);

            let err = match op(attempt) {
                Ok(value) => return Ok(value),
                Err(e) => e,
            };

            if self.max_attempts.is_some_and(|max| attempt >= max) {
                return Err(ElectError::RetriesExhausted {
                    attempts: attempt,
                    last_error: err.to_string(),
                });
            }

            let delay = self.backoff.delay_after(attempt);
            tracing::warn!(attempt, delay_ms = delay.as_millis() as u64, error = %err, "transport fault, retrying");
            std::thread::sleep(delay);
        }
    }
}
