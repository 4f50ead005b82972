//! Subscriber setup for test harnesses that want to see polling progress.
//!
//! The library only emits `tracing` events. Harnesses call [`init`] once at
//! start-up; the filter comes from `RUST_LOG` and falls back to
//! [`DEFAULT_FILTER`].

use thiserror::Error;
use tracing_subscriber::EnvFilter;

/// Filter used when `RUST_LOG` is unset or unparsable.
pub const DEFAULT_FILTER: &str = "provisionwait=info";

/// Failure to install the global subscriber.
#[derive(Debug, Error)]
#[error("failed to install tracing subscriber: {0}")]
pub struct LoggingError(String);

/// Install a formatted subscriber filtered by `RUST_LOG`.
///
/// Fails when another global subscriber is already installed.
pub fn try_init() -> Result<(), LoggingError> {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .try_init()
        .map_err(|error| LoggingError(error.to_string()))
}

/// Install the subscriber unless one is already present.
///
/// Safe to call from every test; only the first call has an effect.
pub fn init() {
    if try_init().is_err() {
        tracing::debug!("tracing subscriber already installed");
    }
}
