//! Email sender that writes notifications to the log instead of a mail server.
//!
//! Stands in for a real provider: the relay's contract with the email
//! collaborator ends at the hand-off, so this is enough to run the
//! `email` channel end to end.

use async_trait::async_trait;

use crate::domain::notification::Notification;
use crate::ports::{EmailError, EmailSender};

/// Logs each notification as an outbound email to a fixed recipient.
#[derive(Debug, Clone)]
pub struct LoggingEmailSender {
    recipient: String,
}

impl LoggingEmailSender {
    pub fn new(recipient: impl Into<String>) -> Self {
        Self {
            recipient: recipient.into(),
        }
    }

    pub fn recipient(&self) -> &str {
        &self.recipient
    }
}

#[async_trait]
impl EmailSender for LoggingEmailSender {
    async fn send(&self, notification: &Notification) -> Result<(), EmailError> {
        if self.recipient.is_empty() {
            return Err(EmailError::Delivery("no recipient configured".to_string()));
        }

        tracing::info!(
            recipient = %self.recipient,
            topic = notification.topic(),
            body = notification.text(),
            "Sending email notification"
        );
        Ok(())
    }

    fn name(&self) -> &'static str {
        "log"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn send_succeeds_with_recipient() {
        let sender = LoggingEmailSender::new("ops@example.com");
        let notification = Notification::render("user.created", "alice");

        assert!(sender.send(&notification).await.is_ok());
        assert_eq!(sender.recipient(), "ops@example.com");
    }

    #[tokio::test]
    async fn send_fails_without_recipient() {
        let sender = LoggingEmailSender::new("");
        let notification = Notification::render("user.created", "alice");

        let err = sender.send(&notification).await.unwrap_err();

        assert_eq!(err, EmailError::Delivery("no recipient configured".to_string()));
    }
}
