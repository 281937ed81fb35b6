//! Tracing setup for embedding binaries
//!
//! The library itself only emits `tracing` events; hosts call
//! [`init`] (or install their own subscriber) to see them.

use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

/// Initialize a compact stderr subscriber driven by `RUST_LOG`.
///
/// Defaults to `info` when `RUST_LOG` is unset. Safe to call once per
/// process; later calls fail quietly if a subscriber is already set.
pub fn init() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    let _ = tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_writer(std::io::stderr).compact())
        .try_init();
}
