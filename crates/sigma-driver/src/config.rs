//! Loader configuration
//!
//! The firmware format leaves two things to the target: the time unit of a
//! `DELAY` length and how `PLLWAIT` decides the PLL has locked. Neither has
//! a silent default. Callers either pass them explicitly or pick a named
//! preset that states what it assumes.

use sigma_chip::regs::adau17x1;
use std::fmt;
use std::str::FromStr;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

/// Unit of the `DELAY` length field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DelayUnit {
    /// One tick is one microsecond
    Microseconds,
    /// One tick is one millisecond
    Milliseconds,
}

impl DelayUnit {
    /// Wall time for `ticks` units.
    pub const fn duration(self, ticks: u32) -> Duration {
        match self {
            Self::Microseconds => Duration::from_micros(ticks as u64),
            Self::Milliseconds => Duration::from_millis(ticks as u64),
        }
    }
}

impl fmt::Display for DelayUnit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Microseconds => write!(f, "us"),
            Self::Milliseconds => write!(f, "ms"),
        }
    }
}

impl FromStr for DelayUnit {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "us" | "usec" | "micros" | "microseconds" => Ok(Self::Microseconds),
            "ms" | "msec" | "millis" | "milliseconds" => Ok(Self::Milliseconds),
            other => Err(format!("unknown delay unit '{other}' (expected us or ms)")),
        }
    }
}

/// How a `PLLWAIT` action polls for lock.
///
/// The record's address field names the register to read; this describes
/// how much to read, which bit means "locked", and the poll budget.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PllPoll {
    /// Bytes read per poll
    pub status_len: usize,

    /// Byte within the status read holding the lock bit
    pub lock_byte: usize,

    /// Lock bit mask within `lock_byte`
    pub lock_mask: u8,

    /// Sleep between consecutive polls
    pub interval: Duration,

    /// Maximum number of status reads
    pub max_attempts: u32,
}

impl PllPoll {
    /// ADAU17x1 PLL control register: lock is bit 1 of byte 5.
    ///
    /// Polls every millisecond for up to 100 attempts.
    pub const fn adau17x1() -> Self {
        Self {
            status_len: adau17x1::PLL_CONTROL_LEN,
            lock_byte: adau17x1::PLL_STATUS_BYTE,
            lock_mask: adau17x1::pll_status::LOCK,
            interval: Duration::from_millis(1),
            max_attempts: 100,
        }
    }

    /// Same register layout with a different poll budget.
    #[must_use]
    pub const fn with_budget(mut self, interval: Duration, max_attempts: u32) -> Self {
        self.interval = interval;
        self.max_attempts = max_attempts;
        self
    }

    /// Whether a status read reports lock.
    pub fn is_locked(&self, status: &[u8]) -> bool {
        status
            .get(self.lock_byte)
            .is_some_and(|b| b & self.lock_mask != 0)
    }

    /// Whether these settings can ever report lock.
    ///
    /// The executor rejects a `PLLWAIT` before the first read when this is
    /// false, instead of polling into a timeout.
    pub const fn is_valid(&self) -> bool {
        self.lock_byte < self.status_len && self.lock_mask != 0 && self.max_attempts > 0
    }

    /// Longest time a `PLLWAIT` can sleep before giving up.
    pub fn budget(&self) -> Duration {
        self.interval * self.max_attempts.saturating_sub(1)
    }
}

/// Shared flag a caller can set to stop a load at the next action boundary.
#[derive(Debug, Clone, Default)]
pub struct CancelFlag(Arc<AtomicBool>);

impl CancelFlag {
    /// New, unset flag.
    pub fn new() -> Self {
        Self::default()
    }

    /// Request cancellation.
    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    /// Whether cancellation was requested.
    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

/// Runtime configuration for one firmware load.
#[derive(Debug, Clone)]
pub struct LoaderConfig {
    /// Unit of `DELAY` lengths
    pub delay_unit: DelayUnit,

    /// `PLLWAIT` behaviour
    pub pll: PllPoll,

    /// Checked before every action
    pub cancel: Option<CancelFlag>,
}

impl LoaderConfig {
    /// Configuration with an explicit delay unit and ADAU17x1 PLL polling.
    pub const fn new(delay_unit: DelayUnit) -> Self {
        Self {
            delay_unit,
            pll: PllPoll::adau17x1(),
            cancel: None,
        }
    }

    /// Matches the Linux SigmaDSP loader, which passes `DELAY` lengths to `udelay()`.
    pub const fn linux_compatible() -> Self {
        Self::new(DelayUnit::Microseconds)
    }

    /// Replace the PLL poll settings.
    #[must_use]
    pub fn with_pll(mut self, pll: PllPoll) -> Self {
        self.pll = pll;
        self
    }

    /// Attach a cancellation flag.
    #[must_use]
    pub fn with_cancel(mut self, cancel: CancelFlag) -> Self {
        self.cancel = Some(cancel);
        self
    }

    pub(crate) fn is_cancelled(&self) -> bool {
        self.cancel.as_ref().is_some_and(CancelFlag::is_cancelled)
    }
}
