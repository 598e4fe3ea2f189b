//! Monotonic clock abstraction so the mode-switch hysteresis in
//! `VerticalManager` (spec.md section 4.D) can be exercised in tests
//! without sleeping real wall-clock seconds.

use std::cell::Cell;
use std::time::{Duration, Instant};

pub trait Clock {
    fn now(&self) -> Duration;
}

pub struct SystemClock {
    start: Instant,
}

impl Default for SystemClock {
    fn default() -> Self {
        Self {
            start: Instant::now(),
        }
    }
}

impl Clock for SystemClock {
    fn now(&self) -> Duration {
        self.start.elapsed()
    }
}

/// A clock a test can advance by hand, to simulate "61 seconds elapsed"
/// without an actual sleep (see spec.md section 8, scenario S4).
#[derive(Default)]
pub struct FakeClock {
    elapsed: Cell<Duration>,
}

impl FakeClock {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn advance(&self, by: Duration) {
        self.elapsed.set(self.elapsed.get() + by);
    }
}

impl Clock for FakeClock {
    fn now(&self) -> Duration {
        self.elapsed.get()
    }
}
