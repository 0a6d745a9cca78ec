//! Notification delivery configuration

use serde::Deserialize;
use std::time::Duration;

use crate::domain::notification::{NotificationChannel, UnsupportedChannel};

use super::error::ValidationError;

/// Notification delivery configuration
#[derive(Debug, Clone, Deserialize)]
pub struct NotificationsConfig {
    /// Delivery channel: `in_app` or `email`
    ///
    /// Kept as free text; an unknown value is reported per message at
    /// dispatch rather than rejected here.
    #[serde(default = "default_channel")]
    pub channel: String,

    /// Per-client send timeout in milliseconds
    #[serde(default = "default_send_timeout")]
    pub send_timeout_ms: u64,

    /// Optional cap on the missed-notification buffer
    #[serde(default)]
    pub missed_capacity: Option<usize>,

    /// Address handed to the email sender
    #[serde(default = "default_email_recipient")]
    pub email_recipient: String,
}

impl NotificationsConfig {
    /// Get send timeout as Duration
    pub fn send_timeout(&self) -> Duration {
        Duration::from_millis(self.send_timeout_ms)
    }

    /// Parsed channel, or the unsupported value
    pub fn parsed_channel(&self) -> Result<NotificationChannel, UnsupportedChannel> {
        self.channel.parse()
    }

    /// Validate notification configuration
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.send_timeout_ms == 0 {
            return Err(ValidationError::InvalidTimeout("notifications.send_timeout_ms"));
        }
        if self.missed_capacity == Some(0) {
            return Err(ValidationError::InvalidCapacity("notifications.missed_capacity"));
        }
        if self.parsed_channel() == Ok(NotificationChannel::Email)
            && !self.email_recipient.contains('@')
        {
            return Err(ValidationError::InvalidEmailRecipient);
        }
        Ok(())
    }
}

impl Default for NotificationsConfig {
    fn default() -> Self {
        Self {
            channel: default_channel(),
            send_timeout_ms: default_send_timeout(),
            missed_capacity: None,
            email_recipient: default_email_recipient(),
        }
    }
}

fn default_channel() -> String {
    NotificationChannel::InApp.as_str().to_string()
}

fn default_send_timeout() -> u64 {
    5000
}

fn default_email_recipient() -> String {
    "notifications@localhost".to_string()
}
