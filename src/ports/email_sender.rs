//! EmailSender port - External email delivery collaborator.

use async_trait::async_trait;
use thiserror::Error;

use crate::domain::notification::Notification;

/// Email delivery failure.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EmailError {
    #[error("Email delivery failed: {0}")]
    Delivery(String),
}

/// Port for handing a notification to an email service.
///
/// The relay only logs the outcome; it never retries or buffers email.
#[async_trait]
pub trait EmailSender: Send + Sync {
    async fn send(&self, notification: &Notification) -> Result<(), EmailError>;

    /// Sender name for logging.
    fn name(&self) -> &'static str;
}
