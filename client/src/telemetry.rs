//! Tracing bootstrap.

use tracing::warn;
use tracing_subscriber::{fmt, EnvFilter};

/// Install the global subscriber, filtered by `RUST_LOG`.
///
/// Safe to call more than once; later calls warn and keep the first
/// subscriber.
pub fn init() {
    if let Err(error) = fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .try_init()
    {
        warn!(error = %error, "tracing init failed");
    }
}
