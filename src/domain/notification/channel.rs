//! Notification delivery channel selection.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Channel through which notifications leave the relay.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NotificationChannel {
    /// Push to connected real-time clients, buffering when none are connected.
    InApp,
    /// Hand off to the external email collaborator.
    Email,
}

impl NotificationChannel {
    /// Configuration spelling of the channel.
    pub fn as_str(&self) -> &'static str {
        match self {
            NotificationChannel::InApp => "in_app",
            NotificationChannel::Email => "email",
        }
    }
}

impl fmt::Display for NotificationChannel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A configured channel value the relay does not know how to deliver to.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Notification channel '{0}' is not supported")]
pub struct UnsupportedChannel(pub String);

impl FromStr for NotificationChannel {
    type Err = UnsupportedChannel;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "in_app" => Ok(NotificationChannel::InApp),
            "email" => Ok(NotificationChannel::Email),
            other => Err(UnsupportedChannel(other.to_string())),
        }
    }
}
