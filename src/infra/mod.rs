//! OS plumbing behind the timer: signal registration, expiration dispatch,
//! and the counters expirations are routed to.
pub(crate) mod counter;
pub mod signal;
