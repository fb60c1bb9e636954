//! # Structured Logging
//!
//! Environment-aware tracing initialization. Safe to call more than once;
//! only the first call installs the global subscriber.

use std::sync::OnceLock;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Layer};

static LOGGER_INITIALIZED: OnceLock<()> = OnceLock::new();

/// Initialize structured logging with an environment-derived filter.
///
/// The filter comes from `RUST_LOG` when set, otherwise from the
/// `FLEET_ENV` environment name (`production` logs at `info`, everything
/// else at `debug`).
pub fn init_structured_logging() {
    LOGGER_INITIALIZED.get_or_init(|| {
        let environment =
            std::env::var("FLEET_ENV").unwrap_or_else(|_| "development".to_string());
        let default_level = if environment == "production" {
            "info"
        } else {
            "debug"
        };
        let filter =
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

        let subscriber = tracing_subscriber::registry().with(
            fmt::layer()
                .with_target(true)
                .with_level(true)
                .with_filter(filter),
        );

        // A global subscriber may already be installed by the embedding
        // process; that is not an error.
        if subscriber.try_init().is_err() {
            tracing::debug!("global tracing subscriber already initialized");
        }
    });
}
