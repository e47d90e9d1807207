//! Log output for the `jbang-rs` binary.
//!
//! The library only emits `tracing` events; installing a subscriber is left to
//! the binary (or to whatever application embeds the library).

use crate::config;
use tracing_subscriber::EnvFilter;

/// Install a stderr fmt subscriber.
///
/// `RUST_LOG` wins when set. Otherwise `DEBUG=jbang` turns on debug output for
/// this crate and everything else stays at `warn`.
pub fn init() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_directive(config::debug_enabled())));

    // A subscriber may already be installed by an embedding application.
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init();
}

fn default_directive(debug: bool) -> &'static str {
    if debug { "warn,jbang=debug" } else { "warn" }
}
