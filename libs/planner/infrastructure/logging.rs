//! Logging initialization

use tracing_subscriber::EnvFilter;

/// Initialize tracing at the given level; `RUST_LOG` wins when set.
///
/// Safe to call more than once: later calls leave the first subscriber in place.
pub fn init_tracing(level: &str) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_thread_ids(false)
        .with_line_number(false)
        .with_writer(std::io::stderr)
        .try_init();
}
