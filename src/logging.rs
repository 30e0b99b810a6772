//! Diagnostic logging on stderr
//!
//! Filter precedence: `RUST_LOG`, then `gcpath=debug` when debug output is
//! requested, otherwise warnings only.

use tracing_subscriber::{EnvFilter, fmt, prelude::*};

fn filter(debug: bool) -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        if debug {
            EnvFilter::new("warn,gcpath=debug")
        } else {
            EnvFilter::new("warn")
        }
    })
}

/// Install the global subscriber. Calling this more than once is harmless.
pub fn init(debug: bool) {
    let layer = fmt::layer()
        .with_writer(std::io::stderr)
        .with_target(debug)
        .without_time();

    // A second init finds a subscriber already set and leaves it alone
    let _ = tracing_subscriber::registry()
        .with(layer.with_filter(filter(debug)))
        .try_init();
}
