//! Single-slot gate spacing generation calls.

use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use tokio::sync::Mutex;
use tracing::debug;

use crate::ports::clock::Clock;

/// Guarantees a minimum interval between granted turns.
///
/// Construct one per process and share it (by `Arc`) with every call site
/// that talks to the generation endpoint. Turns are never denied, only
/// delayed. Waiters queue on an async mutex, so concurrent callers are
/// granted one at a time and none observes a stale timestamp.
pub struct RateLimiter {
    clock: Arc<dyn Clock>,
    min_interval: Duration,
    last_grant: Mutex<Option<DateTime<Utc>>>,
}

impl RateLimiter {
    /// Creates a limiter with no previous grant.
    #[must_use]
    pub fn new(clock: Arc<dyn Clock>, min_interval: Duration) -> Self {
        Self { clock, min_interval, last_grant: Mutex::new(None) }
    }

    /// Minimum spacing between grants.
    #[must_use]
    pub fn min_interval(&self) -> Duration {
        self.min_interval
    }

    /// Suspends until `min_interval` has passed since the previous grant,
    /// then records and returns the grant time.
    pub async fn wait_turn(&self) -> DateTime<Utc> {
        let mut last = self.last_grant.lock().await;
        if let Some(previous) = *last {
            let elapsed = (self.clock.now() - previous).to_std().unwrap_or(Duration::ZERO);
            if elapsed < self.min_interval {
                let wait = self.min_interval - elapsed;
                debug!(wait_ms = wait.as_millis(), "pacing generation call");
                self.clock.sleep(wait).await;
            }
        }
        let granted = self.clock.now();
        *last = Some(granted);
        granted
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::simulated::SimulatedClock;

    #[tokio::test]
    async fn first_turn_is_immediate() {
        let clock = Arc::new(SimulatedClock::default());
        let limiter = RateLimiter::new(clock.clone(), Duration::from_millis(1000));

        let start = clock.now();
        let granted = limiter.wait_turn().await;

        assert_eq!(granted, start);
        assert!(clock.sleeps().is_empty());
    }

    #[tokio::test]
    async fn back_to_back_turns_are_spaced() {
        let clock = Arc::new(SimulatedClock::default());
        let limiter = RateLimiter::new(clock.clone(), Duration::from_millis(1000));

        let first = limiter.wait_turn().await;
        let second = limiter.wait_turn().await;

        assert!((second - first).num_milliseconds() >= 1000);
        assert_eq!(clock.sleeps(), vec![Duration::from_millis(1000)]);
    }

    #[tokio::test]
    async fn waits_only_for_the_remaining_interval() {
        let clock = Arc::new(SimulatedClock::default());
        let limiter = RateLimiter::new(clock.clone(), Duration::from_millis(1000));

        limiter.wait_turn().await;
        clock.advance(Duration::from_millis(700));
        limiter.wait_turn().await;
        clock.advance(Duration::from_millis(1500));
        limiter.wait_turn().await;

        assert_eq!(clock.sleeps(), vec![Duration::from_millis(300)]);
    }

    #[tokio::test]
    async fn concurrent_callers_are_serialized() {
        let clock = Arc::new(SimulatedClock::default());
        let limiter = RateLimiter::new(clock.clone(), Duration::from_millis(1000));

        let (a, b, c) = tokio::join!(limiter.wait_turn(), limiter.wait_turn(), limiter.wait_turn());
        let mut grants = vec![a, b, c];
        grants.sort();

        assert!((grants[1] - grants[0]).num_milliseconds() >= 1000);
        assert!((grants[2] - grants[1]).num_milliseconds() >= 1000);
    }
}
