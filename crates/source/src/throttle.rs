//! Fixed-rate request throttle.
//!
//! One token per period, no burst allowance, shared by every task holding a
//! reference. Waiters queue on a fair mutex so tokens are handed out in the
//! order tasks started waiting.

use std::time::Duration;
use tokio::sync::Mutex;
use tokio::time::{Instant, Interval, MissedTickBehavior, interval_at};

/// Default period between outbound requests (ten per second).
pub const DEFAULT_PERIOD: Duration = Duration::from_millis(100);

/// Hands out one token per fixed period.
///
/// The first token becomes available one period after construction. Missed
/// ticks are not accumulated: after an idle stretch the next token is
/// available immediately, and the one after that a full period later.
///
/// A zero period disables throttling entirely.
#[derive(Debug)]
pub struct Throttle {
    period: Duration,
    start: Instant,
    // Created lazily so a throttle can be built outside of a runtime.
    ticks: Mutex<Option<Interval>>,
}

impl Throttle {
    pub fn new(period: Duration) -> Self {
        Self {
            period,
            start: Instant::now() + period,
            ticks: Mutex::new(None),
        }
    }

    /// A throttle that never waits.
    pub fn unlimited() -> Self {
        Self::new(Duration::ZERO)
    }

    pub fn period(&self) -> Duration {
        self.period
    }

    /// Wait until the next token is available, and consume it.
    pub async fn wait(&self) {
        if self.period.is_zero() {
            return;
        }
        let mut guard = self.ticks.lock().await;
        let ticks = guard.get_or_insert_with(|| {
            let mut ticks = interval_at(self.start, self.period);
            ticks.set_missed_tick_behavior(MissedTickBehavior::Delay);
            ticks
        });
        ticks.tick().await;
    }
}
impl Default for Throttle {
    fn default() -> Self {
        Self::new(DEFAULT_PERIOD)
    }
}
