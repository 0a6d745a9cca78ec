//! Application configuration module
//!
//! This module provides type-safe configuration loading from environment variables
//! using the `config` and `dotenvy` crates. Configuration is loaded with the
//! `NOTIFICATION_RELAY` prefix and nested values use double underscores as separators.
//!
//! # Example
//!
//! ```no_run
//! use notification_relay::config::AppConfig;
//!
//! let config = AppConfig::load().expect("Failed to load configuration");
//! config.validate().expect("Invalid configuration");
//!
//! println!("Server running on {}", config.server.bind_address());
//! ```

mod broker;
mod error;
mod notifications;
mod server;

pub use broker::BrokerConfig;
pub use error::{ConfigError, ValidationError};
pub use notifications::NotificationsConfig;
pub use server::{Environment, ServerConfig};

use serde::Deserialize;

/// Environment variable prefix for every setting
pub const ENV_PREFIX: &str = "NOTIFICATION_RELAY";

/// Root application configuration
///
/// Every section has defaults, so an empty environment yields a runnable
/// local configuration. Load using [`AppConfig::load()`].
#[derive(Debug, Clone, Deserialize, Default)]
pub struct AppConfig {
    /// Server configuration (host, port, environment, log filter)
    #[serde(default)]
    pub server: ServerConfig,

    /// Broker configuration (URL, retry policy, queue sizes)
    #[serde(default)]
    pub broker: BrokerConfig,

    /// Notification delivery configuration (channel, timeouts, buffer cap)
    #[serde(default)]
    pub notifications: NotificationsConfig,
}

impl AppConfig {
    /// Load configuration from environment variables
    ///
    /// This function:
    /// 1. Loads `.env` file if present (for development)
    /// 2. Reads environment variables with `NOTIFICATION_RELAY` prefix
    /// 3. Uses `__` (double underscore) to separate nested values
    /// 4. Deserializes into typed configuration structs
    ///
    /// # Environment Variable Format
    ///
    /// - `NOTIFICATION_RELAY__SERVER__PORT=5003` -> `server.port = 5003`
    /// - `NOTIFICATION_RELAY__BROKER__URL=...` -> `broker.url = ...`
    /// - `NOTIFICATION_RELAY__NOTIFICATIONS__CHANNEL=email` -> `notifications.channel = "email"`
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if values cannot be parsed into expected types.
    pub fn load() -> Result<Self, ConfigError> {
        // Load .env file if present (development)
        dotenvy::dotenv().ok();

        let config = config::Config::builder()
            .add_source(
                config::Environment::default()
                    .prefix(ENV_PREFIX)
                    .separator("__"),
            )
            .build()?
            .try_deserialize()?;

        Ok(config)
    }

    /// Validate all configuration values
    ///
    /// # Errors
    ///
    /// Returns `ValidationError` if any configuration value is invalid.
    pub fn validate(&self) -> Result<(), ValidationError> {
        self.server.validate()?;
        self.broker.validate()?;
        self.notifications.validate()?;
        Ok(())
    }

    /// Check if running in production environment
    pub fn is_production(&self) -> bool {
        self.server.is_production()
    }
}
