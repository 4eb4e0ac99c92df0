//! Tracing setup for applications embedding the tracker.
//!
//! The library itself only emits `tracing` events; installing a subscriber
//! is the embedding application's choice. These helpers wire up the usual
//! stack: an env-filtered fmt layer plus `tracing-error`'s span traces.

use tracing_error::ErrorLayer;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::{SubscriberInitExt, TryInitError};
use tracing_subscriber::EnvFilter;

/// Installs the default subscriber, failing if one is already set.
///
/// The filter honors `RUST_LOG` and defaults to `info`.
pub fn try_init() -> Result<(), TryInitError> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer())
        .with(ErrorLayer::default())
        .try_init()
}

/// Installs the default subscriber, ignoring an already-set one.
pub fn init() {
    let _ = try_init();
}
