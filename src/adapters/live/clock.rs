//! Live clock using the system clock and tokio timers.

use std::time::Duration;

use chrono::{DateTime, Utc};

use crate::ports::clock::{Clock, SleepFuture};

/// Live clock that returns the real current time and sleeps on real timers.
pub struct LiveClock;

impl Clock for LiveClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }

    fn sleep(&self, duration: Duration) -> SleepFuture<'_> {
        Box::pin(tokio::time::sleep(duration))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn returns_current_time() {
        let clock = LiveClock;
        let before = Utc::now();
        let now = clock.now();
        let after = Utc::now();

        assert!(now >= before);
        assert!(now <= after);
    }

    #[tokio::test]
    async fn sleep_waits_at_least_the_requested_duration() {
        let clock = LiveClock;
        let before = clock.now();
        clock.sleep(Duration::from_millis(20)).await;
        let elapsed = clock.now() - before;

        assert!(elapsed.num_milliseconds() >= 20);
    }
}
