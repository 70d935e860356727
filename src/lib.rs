//! `korri-itimer` library: a POSIX interval timer that counts how many
//! periods elapsed, missed ones included, from an asynchronous signal
//! handler. The crate exposes the timer itself, its configuration, the
//! period data type, and the signal plumbing it is built on.
#![cfg(target_os = "linux")]
//==================================================================================
/// Period data type programmed into the OS timer.
pub mod core;
/// Signal and clock selection applied at construction.
pub mod config;
/// Setup and scheduling failures.
pub mod error;
/// Signal registration and expiration dispatch.
pub(crate) mod infra;
/// The interval timer.
pub mod timer;
/// Stderr sink for the crate's tracing events.
#[cfg(feature = "stderr-diagnostics")]
pub mod diagnostics;
//==================================================================================
pub use crate::config::{TimerConfig, TimerSignal};
pub use crate::core::Period;
pub use crate::error::TimerError;
pub use crate::timer::IntervalTimer;
