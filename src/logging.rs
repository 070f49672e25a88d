//! logging
//!
//! Structured logging setup for the binary.
//!
//! The library only emits `tracing` events; installing a subscriber is the
//! embedding application's choice. The CLI installs one that writes to
//! stderr so command output on stdout stays clean.
//!
//! # Filter Precedence
//!
//! 1. `RUST_LOG`, if set and valid
//! 2. `--debug`, which enables `ghfs=debug`
//! 3. `log.level` from the config file (default `warn`)

use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Registry};

/// Build the event filter.
pub fn build_env_filter(level: &str, debug: bool) -> EnvFilter {
    if let Ok(filter) = EnvFilter::try_from_default_env() {
        return filter;
    }
    if debug {
        return EnvFilter::new(format!("{},ghfs=debug", level));
    }
    EnvFilter::new(level)
}

/// Install the global subscriber. A second call is a no-op.
pub fn init_logging(level: &str, debug: bool) {
    let filter = build_env_filter(level, debug);
    let _ = Registry::default()
        .with(filter)
        .with(
            fmt::layer()
                .with_target(debug)
                .with_writer(std::io::stderr),
        )
        .try_init();
}
