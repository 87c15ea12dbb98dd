// crates/console-sso/src/retry.rs
// ============================================================================
// Module: Retry Policy
// Description: Fixed-delay retry with an attempt cap and retry predicate.
// Purpose: Share one retry strategy between reachability and element polling.
// Dependencies: std
// ============================================================================

//! ## Overview
//! [`RetryPolicy`] runs an operation until it succeeds, the predicate declares
//! the error terminal, or the attempt budget is spent. Delays go through a
//! [`Sleeper`] so tests can observe them without waiting.
//! Invariants:
//! - At most `max_attempts` invocations; exactly `attempts - 1` sleeps.
//! - The error returned is always the last one observed.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::sync::Mutex;
use std::time::Duration;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Attempts allowed while a console comes up.
pub const REACHABILITY_ATTEMPTS: u32 = 60;

/// Delay between reachability attempts.
pub const REACHABILITY_DELAY: Duration = Duration::from_secs(5);

// ============================================================================
// SECTION: Sleeper
// ============================================================================

/// Suspends the current thread between attempts.
pub trait Sleeper: Send + Sync {
    /// Sleeps for the given duration.
    fn sleep(&self, duration: Duration);
}

/// Sleeper backed by [`std::thread::sleep`].
#[derive(Debug, Default, Clone, Copy)]
pub struct ThreadSleeper;

impl Sleeper for ThreadSleeper {
    fn sleep(&self, duration: Duration) {
        std::thread::sleep(duration);
    }
}

/// Sleeper that records requested delays and returns immediately.
#[derive(Debug, Default)]
pub struct RecordingSleeper {
    /// Requested delays in call order.
    slept: Mutex<Vec<Duration>>,
}

impl RecordingSleeper {
    /// Returns every delay requested so far.
    #[must_use]
    pub fn slept(&self) -> Vec<Duration> {
        self.slept.lock().map(|slept| slept.clone()).unwrap_or_default()
    }
}

impl Sleeper for RecordingSleeper {
    fn sleep(&self, duration: Duration) {
        if let Ok(mut slept) = self.slept.lock() {
            slept.push(duration);
        }
    }
}

// ============================================================================
// SECTION: Policy
// ============================================================================

/// Failure returned once a retried operation gives up.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RetryFailure<E> {
    /// Invocations performed.
    pub attempts: u32,
    /// True when the budget ran out; false when the predicate stopped early.
    pub exhausted: bool,
    /// Last observed error.
    pub error: E,
}

/// Observation handed to the retry observer before each sleep.
#[derive(Debug)]
pub struct RetryNotice<'a, E> {
    /// Attempt that just failed (1-based).
    pub attempt: u32,
    /// Attempt budget.
    pub max_attempts: u32,
    /// Delay before the next attempt.
    pub delay: Duration,
    /// Error from the failed attempt.
    pub error: &'a E,
}

/// Fixed-delay retry strategy.
///
/// # Invariants
/// - `max_attempts >= 1`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Maximum invocations.
    max_attempts: u32,
    /// Delay between invocations.
    delay: Duration,
}

impl RetryPolicy {
    /// Creates a policy; a zero attempt budget is raised to one.
    #[must_use]
    pub const fn new(max_attempts: u32, delay: Duration) -> Self {
        let max_attempts = if max_attempts == 0 { 1 } else { max_attempts };
        Self {
            max_attempts,
            delay,
        }
    }

    /// Policy used while waiting for a console to become reachable.
    #[must_use]
    pub const fn reachability() -> Self {
        Self::new(REACHABILITY_ATTEMPTS, REACHABILITY_DELAY)
    }

    /// Returns the attempt budget.
    #[must_use]
    pub const fn max_attempts(&self) -> u32 {
        self.max_attempts
    }

    /// Returns the delay between attempts.
    #[must_use]
    pub const fn delay(&self) -> Duration {
        self.delay
    }

    /// Runs `operation` under this policy.
    ///
    /// `operation` receives the 1-based attempt number. `should_retry` decides
    /// whether an error is transient; `on_retry` observes each scheduled retry.
    ///
    /// # Errors
    ///
    /// Returns [`RetryFailure`] carrying the last error when the predicate
    /// rejects an error or the budget is exhausted.
    pub fn execute<T, E>(
        &self,
        sleeper: &dyn Sleeper,
        mut operation: impl FnMut(u32) -> Result<T, E>,
        should_retry: impl Fn(&E) -> bool,
        mut on_retry: impl FnMut(RetryNotice<'_, E>),
    ) -> Result<T, RetryFailure<E>> {
        let mut attempt = 1;
        loop {
            let error = match operation(attempt) {
                Ok(value) => return Ok(value),
                Err(error) => error,
            };
            if !should_retry(&error) {
                return Err(RetryFailure {
                    attempts: attempt,
                    exhausted: false,
                    error,
                });
            }
            if attempt >= self.max_attempts {
                return Err(RetryFailure {
                    attempts: attempt,
                    exhausted: true,
                    error,
                });
            }
            on_retry(RetryNotice {
                attempt,
                max_attempts: self.max_attempts,
                delay: self.delay,
                error: &error,
            });
            sleeper.sleep(self.delay);
            attempt += 1;
        }
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::reachability()
    }
}
