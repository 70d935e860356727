//! Construction, failure, and teardown paths of `IntervalTimer`.
//! Timing behavior lives in the integration tests.
use super::*;
use crate::config::TimerSignal;
use core::ptr;
use core::sync::atomic::{AtomicBool, Ordering};
use nix::errno::Errno;
use nix::libc::{self, c_int};
use nix::sys::signal::Signal;
use nix::time::ClockId;

/// No such clock: makes `timer_create` fail with `EINVAL`.
const BOGUS_CLOCK: ClockId = ClockId::from_raw(4_096);

#[test]
/// A fresh timer is disarmed and has counted nothing.
fn test_new_timer_starts_at_zero() {
    let timer = IntervalTimer::new().unwrap();
    assert!(!timer.is_inert());
    assert_eq!(timer.elapsed_count(), 0);
    assert_eq!(*timer.config(), TimerConfig::default());
}

#[test]
/// Arming and disarming a live timer succeed.
fn test_arm_then_disarm() {
    let mut timer = IntervalTimer::new().unwrap();
    timer.set_interval(Period::new(10, 0)).unwrap();
    timer.set_interval(Period::from_millis(500)).unwrap();
    timer.disarm().unwrap();
    assert_eq!(timer.elapsed_count(), 0);
}

#[test]
/// `SIGKILL` cannot be caught, so handler registration fails.
fn test_handler_registration_failure() {
    let config = TimerConfig::default().with_signal(Signal::SIGKILL);
    let err = IntervalTimer::with_config(config).err().unwrap();
    assert_eq!(
        err,
        TimerError::HandlerRegistration {
            signal: TimerSignal::Standard(Signal::SIGKILL),
            source: Errno::EINVAL,
        }
    );
}

#[test]
/// An unknown clock makes timer creation fail.
fn test_timer_creation_failure() {
    let config = TimerConfig::default().with_clock(BOGUS_CLOCK);
    let err = IntervalTimer::with_config(config).err().unwrap();
    assert!(matches!(
        err,
        TimerError::TimerCreation { clock, .. } if clock == BOGUS_CLOCK
    ));
}

#[test]
/// Degraded construction: inert, zero count, arming refused, drop is safe.
fn test_inert_timer() {
    let config = TimerConfig::default().with_clock(BOGUS_CLOCK);
    let mut timer = IntervalTimer::new_or_inert(config);
    assert!(timer.is_inert());
    assert_eq!(timer.set_interval(Period::from_millis(1)), Err(TimerError::Inert));
    assert_eq!(timer.disarm(), Err(TimerError::Inert));
    assert_eq!(timer.elapsed_count(), 0);
    drop(timer);
}

#[test]
/// Inert because the handler could not be registered.
fn test_inert_after_registration_failure() {
    let config = TimerConfig::default().with_signal(Signal::SIGSTOP);
    let timer = IntervalTimer::new_or_inert(config);
    assert!(timer.is_inert());
    assert_eq!(timer.config().signal(), TimerSignal::Standard(Signal::SIGSTOP));
}

#[test]
/// Successful degraded construction behaves like `with_config`.
fn test_new_or_inert_success() {
    let timer = IntervalTimer::new_or_inert(TimerConfig::default());
    assert!(!timer.is_inert());
}

#[test]
/// Nanosecond part out of range is rejected by the OS.
fn test_schedule_update_failure_on_bad_nanos() {
    let mut timer = IntervalTimer::new().unwrap();
    let period = Period::new(0, 2_000_000_000);
    assert_eq!(
        timer.set_interval(period),
        Err(TimerError::ScheduleUpdate {
            period,
            source: Errno::EINVAL,
        })
    );
    // The timer is still usable afterwards.
    timer.disarm().unwrap();
}

#[test]
/// Negative seconds are rejected by the OS.
fn test_schedule_update_failure_on_negative_seconds() {
    let mut timer = IntervalTimer::new().unwrap();
    let err = timer.set_interval(Period::new(-1, 0)).unwrap_err();
    assert!(matches!(
        err,
        TimerError::ScheduleUpdate {
            source: Errno::EINVAL,
            ..
        }
    ));
}

#[test]
/// The expiration payload survives moving the owning value.
fn test_move_keeps_counter_token() {
    let timer = IntervalTimer::new().unwrap();
    let before = timer.counter.as_ref().unwrap().token();
    let moved = Box::new(timer);
    assert_eq!(moved.counter.as_ref().unwrap().token(), before);
}

#[test]
/// Inert instances hold no counter slot.
fn test_inert_timer_leases_nothing() {
    let timer = IntervalTimer::new_or_inert(TimerConfig::default().with_clock(BOGUS_CLOCK));
    assert!(timer.counter.is_none());
}

#[test]
/// A failed setup hands its counter slot back.
fn test_failed_setup_releases_counter() {
    let config = TimerConfig::default().with_clock(BOGUS_CLOCK);
    for _ in 0..(COUNTER_CAPACITY + 8) {
        assert!(IntervalTimer::with_config(config).is_err());
    }
    assert!(IntervalTimer::new().is_ok());
}

#[test]
/// After drop, the old token no longer reaches any counter.
fn test_drop_retires_token() {
    let timer = IntervalTimer::new().unwrap();
    let stale = timer.counter.as_ref().unwrap().token().to_raw();
    drop(timer);

    let successor = IntervalTimer::new().unwrap();
    COUNTERS.record(stale, 0);
    assert_eq!(successor.elapsed_count(), 0);
}

static ALARM_SEEN: AtomicBool = AtomicBool::new(false);

extern "C" fn record_alarm(_signal: c_int) {
    ALARM_SEEN.store(true, Ordering::SeqCst);
}

#[test]
/// Timers on the default signal leave the program's own SIGALRM handler alone.
fn test_default_signal_leaves_sigalrm_untouched() {
    // SAFETY: installs a handler that only stores to an atomic.
    unsafe {
        let mut action: libc::sigaction = core::mem::zeroed();
        action.sa_sigaction = record_alarm as libc::sighandler_t;
        libc::sigemptyset(&mut action.sa_mask);
        assert_eq!(libc::sigaction(libc::SIGALRM, &action, ptr::null_mut()), 0);
    }

    let mut timer = IntervalTimer::new().unwrap();
    timer.set_interval(Period::new(60, 0)).unwrap();

    // SAFETY: raise() runs the SIGALRM handler on this thread before returning.
    assert_eq!(unsafe { libc::raise(libc::SIGALRM) }, 0);
    assert!(ALARM_SEEN.load(Ordering::SeqCst));
    assert_eq!(timer.elapsed_count(), 0);
}

#[test]
/// Many timers can coexist and be torn down in any order.
fn test_multiple_timers_teardown() {
    let mut timers: Vec<_> = (0..8).map(|_| IntervalTimer::new().unwrap()).collect();
    for timer in timers.iter_mut() {
        timer.set_interval(Period::new(60, 0)).unwrap();
    }
    timers.swap(0, 7);
    drop(timers);
}
