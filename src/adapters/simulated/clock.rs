//! Virtual-time clock.

use std::sync::Mutex;
use std::time::Duration;

use chrono::{DateTime, TimeZone, Utc};

use crate::ports::clock::{Clock, SleepFuture};

/// Clock whose time only moves when someone sleeps on it.
///
/// `sleep` returns immediately after advancing the virtual time, and every
/// requested duration is kept so tests can assert on backoff schedules.
/// Replay sessions use it so recorded waits cost nothing.
pub struct SimulatedClock {
    state: Mutex<SimulatedState>,
}

struct SimulatedState {
    now: DateTime<Utc>,
    sleeps: Vec<Duration>,
}

impl SimulatedClock {
    /// Creates a clock starting at `start`.
    #[must_use]
    pub fn starting_at(start: DateTime<Utc>) -> Self {
        Self { state: Mutex::new(SimulatedState { now: start, sleeps: Vec::new() }) }
    }

    /// Returns every duration passed to `sleep`, in call order.
    ///
    /// # Panics
    ///
    /// Panics if the internal lock is poisoned.
    #[must_use]
    pub fn sleeps(&self) -> Vec<Duration> {
        self.state.lock().expect("clock lock poisoned").sleeps.clone()
    }

    /// Sum of all requested sleeps.
    #[must_use]
    pub fn total_slept(&self) -> Duration {
        self.sleeps().iter().sum()
    }

    /// Moves virtual time forward without recording a sleep.
    ///
    /// # Panics
    ///
    /// Panics if the internal lock is poisoned.
    pub fn advance(&self, duration: Duration) {
        let mut state = self.state.lock().expect("clock lock poisoned");
        state.now += to_chrono(duration);
    }
}

impl Default for SimulatedClock {
    fn default() -> Self {
        let epoch = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).single().unwrap_or_default();
        Self::starting_at(epoch)
    }
}

impl Clock for SimulatedClock {
    fn now(&self) -> DateTime<Utc> {
        self.state.lock().expect("clock lock poisoned").now
    }

    fn sleep(&self, duration: Duration) -> SleepFuture<'_> {
        {
            let mut state = self.state.lock().expect("clock lock poisoned");
            state.now += to_chrono(duration);
            state.sleeps.push(duration);
        }
        Box::pin(tokio::task::yield_now())
    }
}

fn to_chrono(duration: Duration) -> chrono::Duration {
    chrono::Duration::from_std(duration).unwrap_or(chrono::Duration::MAX)
}
