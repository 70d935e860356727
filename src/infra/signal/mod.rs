//! Process-wide dispatch of timer expirations.
//!
//! The kernel only knows one handler per signal, so every [`IntervalTimer`]
//! sharing a signal goes through [`dispatch_expiration`]. Each OS timer is
//! created with its [`CounterToken`](crate::infra::counter::CounterToken) as
//! `sigev_value`; the handler reads it back from `siginfo_t` and hands it,
//! with the overrun, to the process-wide counter table.
//!
//! Everything reachable from the handler must be async-signal-safe: a
//! lock-free compare-exchange, no allocation, no locking, no I/O.
//!
//! [`IntervalTimer`]: crate::timer::IntervalTimer
use core::ffi::c_void;
use core::{mem, ptr};

use nix::errno::Errno;
use nix::libc::{self, c_int};
use nix::sys::signal::SigEvent;

use crate::infra::counter::{CounterToken, COUNTERS};

/// `si_code` value the kernel stores for POSIX timer expirations.
const SI_TIMER: c_int = -2;

/// `siginfo_t` as laid out by Linux for `SI_TIMER` deliveries.
///
/// The three leading ints are followed by the `_sifields` union, which is
/// pointer-aligned; `TimerFields` carries a pointer so `repr(C)` reproduces
/// that padding on 64-bit targets.
#[repr(C)]
struct TimerSigInfo {
    _signo: c_int,
    _errno: c_int,
    code: c_int,
    fields: TimerFields,
}

#[repr(C)]
struct TimerFields {
    _tid: c_int,
    overrun: c_int,
    value: libc::sigval,
}

/// Signal handler shared by every interval timer of the process.
pub(crate) extern "C" fn dispatch_expiration(
    _signal: c_int,
    info: *mut libc::siginfo_t,
    _context: *mut c_void,
) {
    if info.is_null() {
        return;
    }
    // SAFETY: the kernel hands a valid siginfo_t; for SI_TIMER the timer
    // view of the union is the active one.
    let info = unsafe { &*(info as *const TimerSigInfo) };
    if info.code != SI_TIMER {
        // kill(), raise(), sigqueue()... carry no counter.
        return;
    }
    let raw = info.fields.value.sival_ptr as libc::intptr_t;
    COUNTERS.record(raw, info.fields.overrun);
}

/// Install [`dispatch_expiration`] for `signal`. Idempotent: installing it
/// again for another timer replaces the handler with itself.
///
/// Raw `sigaction` so realtime signals, which `nix::Signal` cannot name,
/// are accepted.
pub(crate) fn install_handler(signal: c_int) -> Result<(), Errno> {
    // SAFETY: an all-zero sigaction is valid; the fields that matter are set below.
    let mut action: libc::sigaction = unsafe { mem::zeroed() };
    action.sa_sigaction = dispatch_expiration as libc::sighandler_t;
    action.sa_flags = libc::SA_SIGINFO | libc::SA_RESTART;
    // SAFETY: sa_mask is owned by `action`; the handler is async-signal-safe.
    unsafe {
        libc::sigemptyset(&mut action.sa_mask);
        Errno::result(libc::sigaction(signal, &action, ptr::null_mut())).map(drop)
    }
}

/// `SIGEV_SIGNAL` notification carrying `token` on `signal`.
pub(crate) fn timer_event(signal: c_int, token: CounterToken) -> SigEvent {
    // SAFETY: all-zero is a valid sigevent; unused notify fields stay zero.
    let mut event: libc::sigevent = unsafe { mem::zeroed() };
    event.sigev_notify = libc::SIGEV_SIGNAL;
    event.sigev_signo = signal;
    event.sigev_value = libc::sigval {
        sival_ptr: token.to_raw() as *mut c_void,
    };
    SigEvent::from(&event)
}
