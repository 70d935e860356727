//! Construction-time settings of an [`IntervalTimer`](crate::timer::IntervalTimer):
//! which signal carries expirations and which clock drives the timer.
use std::fmt;

use nix::libc::{self, c_int};
use nix::sys::signal::Signal;
use nix::time::ClockId;

/// Signal used when none is configured: `SIGRTMIN`, reserved for applications.
pub const DEFAULT_SIGNAL: TimerSignal = TimerSignal::Realtime(0);
/// Clock used when none is configured. Not affected by wall-clock adjustments.
pub const DEFAULT_CLOCK: ClockId = ClockId::CLOCK_MONOTONIC;

/// Signal that delivers expirations.
///
/// Realtime signals are resolved against `SIGRTMIN` at runtime, since the C
/// library may reserve the first few for itself.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TimerSignal {
    /// `SIGRTMIN + offset`.
    Realtime(u8),
    /// Any standard signal. Its previous handler is replaced process-wide.
    Standard(Signal),
}

impl TimerSignal {
    /// Raw signal number passed to `sigaction` and `sigevent`.
    pub fn number(self) -> c_int {
        match self {
            TimerSignal::Realtime(offset) => libc::SIGRTMIN() + c_int::from(offset),
            TimerSignal::Standard(signal) => signal as c_int,
        }
    }
}

impl From<Signal> for TimerSignal {
    fn from(signal: Signal) -> Self {
        TimerSignal::Standard(signal)
    }
}

impl fmt::Display for TimerSignal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TimerSignal::Realtime(0) => f.write_str("SIGRTMIN"),
            TimerSignal::Realtime(offset) => write!(f, "SIGRTMIN+{offset}"),
            TimerSignal::Standard(signal) => write!(f, "{signal}"),
        }
    }
}

/// Settings applied once, when the OS timer is created.
///
/// The handler installed for `signal` is process-wide: every timer sharing a
/// signal shares the same dispatch routine, and each expiration is routed by
/// the per-timer payload it carries.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimerConfig {
    signal: TimerSignal,
    clock: ClockId,
}

impl TimerConfig {
    pub const fn new(signal: TimerSignal, clock: ClockId) -> Self {
        Self { signal, clock }
    }

    /// Replace the notification signal. Accepts a [`Signal`] directly.
    pub fn with_signal(mut self, signal: impl Into<TimerSignal>) -> Self {
        self.signal = signal.into();
        self
    }

    /// Replace the clock source.
    pub const fn with_clock(mut self, clock: ClockId) -> Self {
        self.clock = clock;
        self
    }

    pub const fn signal(&self) -> TimerSignal {
        self.signal
    }

    pub const fn clock(&self) -> ClockId {
        self.clock
    }
}

impl Default for TimerConfig {
    fn default() -> Self {
        Self::new(DEFAULT_SIGNAL, DEFAULT_CLOCK)
    }
}
