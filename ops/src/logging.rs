//! `tracing` setup shared by `tmp-sweep` and `config-edit`.
//!
//! Structured diagnostics (walk progress, subprocess status, load/save
//! details) go to stderr and are filtered by `RUST_LOG`. What an operator
//! reads, such as sweep status lines, the settings table and the restart
//! prompt, is printed to stdout by the binaries and never filtered.

use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

/// Install the global subscriber; call once at the top of `main`.
///
/// Without `RUST_LOG` only warnings and errors are shown, e.g.
/// `RUST_LOG=autotrade_ops=debug tmp-sweep` to trace a sweep.
pub fn init() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_writer(std::io::stderr).compact())
        .init();
}
