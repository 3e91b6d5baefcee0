//! `waxcrate-observability` — tracing setup for hosts of the catalog engine.
//!
//! The engine itself only emits `tracing` events (allocation retries at
//! `debug`, orphaned assets at `warn`); whoever hosts it decides where
//! they go. This crate provides the standard subscriber wiring.

use tracing_subscriber::EnvFilter;

/// Initialize JSON tracing with `RUST_LOG` filtering, defaulting to `info`.
///
/// Safe to call multiple times; only the first call installs a subscriber.
pub fn init() {
    init_with_default("info");
}

/// Like [`init`], with an explicit fallback filter for when `RUST_LOG`
/// is unset (tests typically pass `"waxcrate=debug"`).
pub fn init_with_default(directives: &str) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(directives));

    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .json()
        .with_target(false)
        .try_init();
}
