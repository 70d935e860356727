//! Routes the crate's `tracing` events to stderr, tagged with the source
//! file and line that emitted them.
use tracing_subscriber::fmt;

/// Install a global fmt subscriber writing to stderr.
///
/// Fails if the process already has a global subscriber; the existing one
/// keeps receiving the events in that case.
pub fn install_stderr_subscriber() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    fmt()
        .with_writer(std::io::stderr)
        .with_file(true)
        .with_line_number(true)
        .with_target(false)
        .try_init()
}
