//! Shared setup for integration tests.
use std::sync::Once;

use korri_itimer::IntervalTimer;

static TRACING: Once = Once::new();

/// Capture the crate's tracing events in the test output.
pub fn init_tracing() {
    TRACING.call_once(|| {
        let _ = tracing_subscriber::fmt()
            .with_test_writer()
            .with_file(true)
            .with_line_number(true)
            .with_max_level(tracing::Level::DEBUG)
            .try_init();
    });
}

#[allow(dead_code)]
/// Timer on the default configuration, with tracing initialised.
pub fn default_timer() -> IntervalTimer {
    init_tracing();
    IntervalTimer::new().expect("interval timer setup")
}
