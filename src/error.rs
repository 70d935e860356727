//! Errors surfaced by the interval timer.
//! Each variant maps to one OS call that can fail during setup or arming;
//! failures inside the signal handler are never reported.
use nix::errno::Errno;
use nix::time::ClockId;
use thiserror::Error;

use crate::config::TimerSignal;
use crate::core::Period;

#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
/// Failures while setting up, arming, or using an interval timer.
pub enum TimerError {
    /// `sigaction` refused the dispatch handler (e.g. `SIGKILL`/`SIGSTOP`).
    #[error("failed to install handler for {signal}: {source}")]
    HandlerRegistration { signal: TimerSignal, source: Errno },

    /// Every elapsed counter of the process is owned by a live timer.
    #[error("no free elapsed counter: {capacity} timers already live")]
    CountersExhausted { capacity: usize },

    /// `timer_create` failed (unknown clock, resource limit...).
    #[error("failed to create timer on clock {clock:?}: {source}")]
    TimerCreation { clock: ClockId, source: Errno },

    /// `timer_settime` rejected the period. The previous schedule may or may
    /// not still be active.
    #[error("failed to apply period {period}: {source}")]
    ScheduleUpdate { period: Period, source: Errno },

    /// The instance was built with [`IntervalTimer::new_or_inert`](crate::timer::IntervalTimer::new_or_inert)
    /// and owns no OS timer.
    #[error("timer is inert: no OS timer was created")]
    Inert,
}
