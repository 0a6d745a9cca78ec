//! Broker configuration

use serde::Deserialize;
use std::time::Duration;

use crate::domain::broker::RetryPolicy;

use super::error::ValidationError;

/// Broker (Redis pub/sub) configuration
#[derive(Debug, Clone, Deserialize)]
pub struct BrokerConfig {
    /// Broker connection URL
    #[serde(default = "default_url")]
    pub url: String,

    /// Connect attempts before giving up
    #[serde(default = "default_connect_attempts")]
    pub connect_attempts: u32,

    /// Delay between connect attempts in seconds
    #[serde(default = "default_retry_delay")]
    pub retry_delay_secs: u64,

    /// Per-attempt connect timeout in seconds
    #[serde(default = "default_connect_timeout")]
    pub connect_timeout_secs: u64,

    /// Bounded queue size per topic subscription
    #[serde(default = "default_subscription_capacity")]
    pub subscription_capacity: usize,
}

impl BrokerConfig {
    /// Retry policy for the broker connector
    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy::default()
            .with_max_attempts(self.connect_attempts)
            .with_delay(Duration::from_secs(self.retry_delay_secs))
            .with_attempt_timeout(Duration::from_secs(self.connect_timeout_secs))
    }

    /// Validate broker configuration
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.url.is_empty() {
            return Err(ValidationError::MissingRequired("BROKER__URL"));
        }
        if !self.url.starts_with("redis://") && !self.url.starts_with("rediss://") {
            return Err(ValidationError::InvalidBrokerUrl);
        }
        if self.connect_attempts == 0 {
            return Err(ValidationError::InvalidConnectAttempts);
        }
        if self.connect_timeout_secs == 0 {
            return Err(ValidationError::InvalidTimeout("broker.connect_timeout_secs"));
        }
        if self.subscription_capacity == 0 {
            return Err(ValidationError::InvalidCapacity("broker.subscription_capacity"));
        }
        Ok(())
    }
}

impl Default for BrokerConfig {
    fn default() -> Self {
        Self {
            url: default_url(),
            connect_attempts: default_connect_attempts(),
            retry_delay_secs: default_retry_delay(),
            connect_timeout_secs: default_connect_timeout(),
            subscription_capacity: default_subscription_capacity(),
        }
    }
}

fn default_url() -> String {
    "redis://127.0.0.1:6379".to_string()
}

fn default_connect_attempts() -> u32 {
    5
}

fn default_retry_delay() -> u64 {
    2
}

fn default_connect_timeout() -> u64 {
    5
}

fn default_subscription_capacity() -> usize {
    256
}
