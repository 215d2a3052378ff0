//! Clock port for obtaining the current time and suspending on timers.

use std::future::Future;
use std::pin::Pin;
use std::time::Duration;

use chrono::{DateTime, Utc};

/// Boxed future returned by [`Clock::sleep`] to keep the trait dyn-compatible.
pub type SleepFuture<'a> = Pin<Box<dyn Future<Output = ()> + Send + 'a>>;

/// Provides the current time and timer-based suspension.
///
/// Every delay in the orchestration layer (call pacing, retry backoff,
/// listing bursts) goes through this port, so tests can substitute a
/// simulated clock and run without wall-clock waits.
pub trait Clock: Send + Sync {
    /// Returns the current UTC time.
    fn now(&self) -> DateTime<Utc>;

    /// Suspends the caller for at least `duration`.
    fn sleep(&self, duration: Duration) -> SleepFuture<'_>;
}
