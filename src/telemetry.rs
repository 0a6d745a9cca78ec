//! Tracing subscriber setup.
//!
//! JSON lines in production, compact human-readable output otherwise.
//! `RUST_LOG` takes precedence over the configured filter.

use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::config::ServerConfig;

/// Build the level filter: `RUST_LOG` if set and valid, else `directive`,
/// else plain `info`.
pub fn env_filter(directive: &str) -> EnvFilter {
    EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(directive))
        .unwrap_or_else(|_| EnvFilter::new("info"))
}

/// Install the global subscriber for the process.
///
/// # Errors
///
/// Fails if a global subscriber is already installed.
pub fn init(server: &ServerConfig) -> Result<(), tracing_subscriber::util::TryInitError> {
    let registry = tracing_subscriber::registry().with(env_filter(&server.log_level));

    if server.is_production() {
        registry
            .with(fmt::layer().json().with_current_span(true).with_target(true))
            .try_init()
    } else {
        registry.with(fmt::layer().with_target(true)).try_init()
    }
}
