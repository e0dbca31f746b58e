//! Time source for `DELAY` and `PLLWAIT`
//!
//! The executor only ever sleeps through this trait, so tests and dry runs
//! can substitute a virtual clock.

use std::time::Duration;

/// Blocking sleep used between actions and PLL polls.
pub trait Clock {
    /// Suspend for at least `duration`.
    fn sleep(&mut self, duration: Duration);
}

impl<C: Clock + ?Sized> Clock for &mut C {
    fn sleep(&mut self, duration: Duration) {
        (**self).sleep(duration);
    }
}

/// Wall-clock sleep via [`std::thread::sleep`].
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn sleep(&mut self, duration: Duration) {
        if !duration.is_zero() {
            std::thread::sleep(duration);
        }
    }
}

/// Virtual clock that advances instantly.
///
/// Records every sleep so callers can check how long a load would have taken.
#[derive(Debug, Clone, Default)]
pub struct ManualClock {
    now: Duration,
    sleeps: Vec<Duration>,
}

impl ManualClock {
    /// Clock at time zero.
    pub fn new() -> Self {
        Self::default()
    }

    /// Total virtual time elapsed.
    pub const fn elapsed(&self) -> Duration {
        self.now
    }

    /// Every sleep requested, in order.
    pub fn sleeps(&self) -> &[Duration] {
        &self.sleeps
    }
}

impl Clock for ManualClock {
    fn sleep(&mut self, duration: Duration) {
        self.now += duration;
        self.sleeps.push(duration);
    }
}
