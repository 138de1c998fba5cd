//! Logging setup.
//!
//! Events go to stderr so stdout stays clean for summaries, previews and plots.
//! `RUST_LOG` wins when set; otherwise the level follows the `-v` count.

use tracing_subscriber::{EnvFilter, fmt};

/// Default filter directive for a given `-v` count.
pub fn default_directive(verbosity: u8) -> &'static str {
    match verbosity {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    }
}

/// Install the global subscriber. Safe to call more than once.
pub fn init(verbosity: u8) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_directive(verbosity)));

    let _ = fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
}
