//! Periodic OS timer that counts its own expirations.
//!
//! [`IntervalTimer`] owns one POSIX timer (`timer_create`) and one counter.
//! Every expiration raises the configured signal; the process-wide handler
//! adds `overrun + 1` to the counter of the timer that fired. Consumers poll
//! [`IntervalTimer::elapsed_count`].
//!
//! Lifecycle:
//! * construction installs the handler and creates the timer, disarmed;
//! * [`IntervalTimer::set_interval`] arms, re-arms, or (with [`Period::ZERO`]) disarms it in place;
//! * drop disarms and deletes the timer exactly once, then releases the counter.
use core::fmt;

use nix::sys::timer::{Expiration, Timer, TimerSetTimeFlags};
use tracing::{debug, error, warn};

use crate::config::TimerConfig;
use crate::core::Period;
use crate::error::TimerError;
use crate::infra::counter::{TimerCounter, COUNTERS, COUNTER_CAPACITY};
use crate::infra::signal::{install_handler, timer_event};

/// Interval timer counting elapsed periods, overruns included.
///
/// The counter is a slot of a static table, leased for the timer's lifetime.
/// Expirations carry the slot's token, not an address, so one delivered
/// after the timer is gone is dropped instead of touching freed memory.
pub struct IntervalTimer {
    /// `None` only for inert instances built by [`IntervalTimer::new_or_inert`].
    timer: Option<Timer>,
    /// Declared after `timer`: released only once the OS timer is deleted.
    counter: Option<TimerCounter>,
    config: TimerConfig,
}

// SAFETY: a `timer_t` is a process-wide id usable from any thread, and the
// only state reachable through `&self` is an atomic slot and plain config.
unsafe impl Send for IntervalTimer {}
unsafe impl Sync for IntervalTimer {}

impl IntervalTimer {
    /// Create a disarmed timer with [`TimerConfig::default`].
    pub fn new() -> Result<Self, TimerError> {
        Self::with_config(TimerConfig::default())
    }

    /// Install the dispatch handler for `config.signal()` and create a
    /// disarmed timer on `config.clock()`.
    pub fn with_config(config: TimerConfig) -> Result<Self, TimerError> {
        let counter = COUNTERS.lease().ok_or_else(|| {
            error!(capacity = COUNTER_CAPACITY, "no free elapsed counter");
            TimerError::CountersExhausted {
                capacity: COUNTER_CAPACITY,
            }
        })?;
        // On error the lease drops here, retiring its token.
        let timer = create_os_timer(&config, &counter)?;
        debug!(signal = %config.signal(), clock = ?config.clock(), "interval timer created");
        Ok(Self {
            timer: Some(timer),
            counter: Some(counter),
            config,
        })
    }

    /// Same as [`IntervalTimer::with_config`], but a setup failure yields an
    /// inert timer instead of an error: it never fires, its count stays at
    /// zero, and [`IntervalTimer::set_interval`] returns [`TimerError::Inert`].
    ///
    /// The failure is only reported as `tracing` events. Without a subscriber
    /// (see `diagnostics::install_stderr_subscriber` behind the
    /// `stderr-diagnostics` feature) nothing reaches stderr; check
    /// [`IntervalTimer::is_inert`] when the outcome matters.
    pub fn new_or_inert(config: TimerConfig) -> Self {
        match Self::with_config(config) {
            Ok(timer) => timer,
            Err(err) => {
                warn!(error = %err, "interval timer left inert");
                Self {
                    timer: None,
                    counter: None,
                    config,
                }
            }
        }
    }

    /// Program both the initial delay and the recurring interval to `period`.
    ///
    /// Replaces any schedule in place. [`Period::ZERO`] disarms the timer.
    /// On [`TimerError::ScheduleUpdate`] the previous schedule is not
    /// guaranteed to survive.
    pub fn set_interval(&mut self, period: Period) -> Result<(), TimerError> {
        let timer = self.timer.as_mut().ok_or(TimerError::Inert)?;
        let spec = period.to_timespec();
        timer
            .set(Expiration::Interval(spec), TimerSetTimeFlags::empty())
            .map_err(|source| {
                error!(%period, %source, "timer_settime failed");
                TimerError::ScheduleUpdate { period, source }
            })?;
        if period.is_zero() {
            debug!("interval timer disarmed");
        } else {
            debug!(%period, "interval timer armed");
        }
        Ok(())
    }

    /// Stop further expirations. Already delivered ones stay counted.
    pub fn disarm(&mut self) -> Result<(), TimerError> {
        self.set_interval(Period::ZERO)
    }

    /// Periods elapsed since creation, overruns included. Never decreases.
    pub fn elapsed_count(&self) -> u64 {
        self.counter.as_ref().map_or(0, TimerCounter::load)
    }

    /// `true` when no OS timer backs this instance.
    pub fn is_inert(&self) -> bool {
        self.timer.is_none()
    }

    pub fn config(&self) -> &TimerConfig {
        &self.config
    }
}

impl fmt::Debug for IntervalTimer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("IntervalTimer")
            .field("inert", &self.is_inert())
            .field("elapsed", &self.elapsed_count())
            .field("config", &self.config)
            .finish()
    }
}

impl Drop for IntervalTimer {
    fn drop(&mut self) {
        let Some(mut timer) = self.timer.take() else {
            return;
        };
        // Stop the schedule first so no new expiration is queued while deleting.
        if let Err(source) = timer.set(
            Expiration::Interval(Period::ZERO.to_timespec()),
            TimerSetTimeFlags::empty(),
        ) {
            warn!(%source, "failed to disarm interval timer before deletion");
        }
        // timer_delete, then retire the token so late deliveries are dropped.
        drop(timer);
        self.counter.take();
        debug!("interval timer deleted");
    }
}

/// Register the handler, then create the OS timer carrying the counter token.
fn create_os_timer(config: &TimerConfig, counter: &TimerCounter) -> Result<Timer, TimerError> {
    let signal = config.signal();
    install_handler(signal.number()).map_err(|source| {
        error!(%signal, %source, "failed to install timer signal handler");
        TimerError::HandlerRegistration { signal, source }
    })?;

    let clock = config.clock();
    let event = timer_event(signal.number(), counter.token());
    Timer::new(clock, event).map_err(|source| {
        error!(?clock, %source, "timer_create failed");
        TimerError::TimerCreation { clock, source }
    })
}

#[cfg(test)]
mod tests;
