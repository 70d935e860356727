//! Plain data shared by the timer and its configuration: the period
//! programmed into the OS timer.
//!
//! A [`Period`] is handed to the kernel unchanged. Validation (for instance
//! a nanosecond part outside `0..1_000_000_000`) is left to `timer_settime`,
//! which reports it as `EINVAL`.
use std::fmt;
use std::time::Duration;

use nix::libc;
use nix::sys::time::TimeSpec;

/// Nanoseconds in one second, the upper bound (exclusive) of a valid nanosecond part.
pub const NANOS_PER_SEC: i64 = 1_000_000_000;

/// Initial delay and recurring interval of the timer, as (seconds, nanoseconds).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Period {
    seconds: i64,
    nanoseconds: i64,
}

impl Period {
    /// Zero period: programming it disarms the timer.
    pub const ZERO: Period = Period {
        seconds: 0,
        nanoseconds: 0,
    };

    /// Build a period from raw parts. Out-of-range parts are accepted here
    /// and rejected by the OS when armed.
    pub const fn new(seconds: i64, nanoseconds: i64) -> Self {
        Self {
            seconds,
            nanoseconds,
        }
    }

    pub const fn from_millis(millis: u64) -> Self {
        Self::new(
            (millis / 1_000) as i64,
            ((millis % 1_000) * 1_000_000) as i64,
        )
    }

    pub const fn seconds(&self) -> i64 {
        self.seconds
    }

    pub const fn nanoseconds(&self) -> i64 {
        self.nanoseconds
    }

    /// `true` when both parts are zero, i.e. arming with it stops the timer.
    pub const fn is_zero(&self) -> bool {
        self.seconds == 0 && self.nanoseconds == 0
    }

    pub(crate) fn to_timespec(self) -> TimeSpec {
        TimeSpec::new(
            self.seconds as libc::time_t,
            self.nanoseconds as libc::c_long,
        )
    }
}

impl From<Duration> for Period {
    fn from(duration: Duration) -> Self {
        // Saturate instead of wrapping: i64::MAX seconds is still "never" in practice.
        let seconds = i64::try_from(duration.as_secs()).unwrap_or(i64::MAX);
        Self::new(seconds, i64::from(duration.subsec_nanos()))
    }
}

impl fmt::Display for Period {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}s+{}ns", self.seconds, self.nanoseconds)
    }
}
