//! Tracing setup.

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Filter used when `RUST_LOG` is not set.
pub const DEFAULT_FILTER: &str = "lingo_client=debug";

/// Install the global tracing subscriber.
///
/// Safe to call more than once; returns `false` if a subscriber was already
/// installed.
pub fn init_tracing() -> bool {
    init_tracing_with(DEFAULT_FILTER)
}

pub fn init_tracing_with(default_filter: &str) -> bool {
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| default_filter.into()))
        .with(tracing_subscriber::fmt::layer())
        .try_init()
        .is_ok()
}
