//! Rendered notification value.

use std::fmt;

use crate::domain::foundation::Timestamp;

/// A notification rendered from one inbound broker message.
///
/// The text is always `[<topic>] <payload>`. The payload is opaque and
/// is never parsed or validated.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notification {
    topic: String,
    text: String,
    received_at: Timestamp,
}

impl Notification {
    /// Render a notification for `payload` received on `topic`.
    pub fn render(topic: impl Into<String>, payload: &str) -> Self {
        let topic = topic.into();
        let text = format!("[{}] {}", topic, payload);
        Self {
            topic,
            text,
            received_at: Timestamp::now(),
        }
    }

    /// Topic the source message arrived on.
    pub fn topic(&self) -> &str {
        &self.topic
    }

    /// Rendered text sent to clients.
    pub fn text(&self) -> &str {
        &self.text
    }

    /// When the relay received the source message.
    pub fn received_at(&self) -> Timestamp {
        self.received_at
    }
}

impl fmt::Display for Notification {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.text)
    }
}
