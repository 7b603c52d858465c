//! Diagnostic tracing for the looper binary.
//!
//! Reads `RUST_LOG` (default `warn`) and writes compact output to stderr, so
//! it never mixes with a manifest printed on stdout.

use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

/// Initialize the tracing subscriber.
///
/// # Example
/// ```bash
/// RUST_LOG=looper=debug looper build site/
/// ```
pub fn init() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_writer(std::io::stderr).compact())
        .init();
}
