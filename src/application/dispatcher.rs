//! NotificationDispatcher - routes one broker message to the configured channel.
//!
//! Every message received on a relay topic passes through here:
//!
//! ```text
//! (topic, payload) ──render──▶ "[topic] payload"
//!                                  │
//!             ┌────────────────────┼──────────────────┐
//!          in_app               email            unsupported
//!             │                    │                  │
//!   registry.deliver()     EmailSender::send    log + drop
//!   (broadcast | buffer)
//! ```
//!
//! The channel is fixed at construction from configuration. An unknown
//! channel name does not stop the relay; each message is reported and
//! dropped instead.

use std::sync::Arc;

use crate::domain::notification::{Notification, NotificationChannel, UnsupportedChannel};
use crate::ports::EmailSender;

use super::client_registry::{ClientRegistry, Delivery};

/// What happened to a dispatched message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DispatchOutcome {
    /// Broadcast to connected clients.
    Delivered { recipients: usize, failed: usize },
    /// Nobody was connected; stored as missed.
    Buffered,
    /// Handed to the email sender.
    Emailed,
    /// Not delivered anywhere (unsupported channel or email failure).
    Dropped,
}

/// Routes rendered notifications to the in-app registry or email sender.
pub struct NotificationDispatcher {
    channel: Result<NotificationChannel, UnsupportedChannel>,
    registry: Arc<ClientRegistry>,
    email: Arc<dyn EmailSender>,
}

impl NotificationDispatcher {
    /// Create a dispatcher for a configured channel name.
    pub fn new(channel: &str, registry: Arc<ClientRegistry>, email: Arc<dyn EmailSender>) -> Self {
        Self {
            channel: channel.parse(),
            registry,
            email,
        }
    }

    /// Create a dispatcher for an already-parsed channel.
    pub fn for_channel(
        channel: NotificationChannel,
        registry: Arc<ClientRegistry>,
        email: Arc<dyn EmailSender>,
    ) -> Self {
        Self {
            channel: Ok(channel),
            registry,
            email,
        }
    }

    /// The channel this dispatcher routes to, or the rejected name.
    pub fn channel(&self) -> Result<NotificationChannel, &UnsupportedChannel> {
        self.channel.as_ref().copied()
    }

    pub fn registry(&self) -> &Arc<ClientRegistry> {
        &self.registry
    }

    /// Render and route one broker message. Never fails; problems are logged.
    pub async fn dispatch(&self, topic: &str, payload: &str) -> DispatchOutcome {
        let channel = match &self.channel {
            Ok(channel) => *channel,
            Err(unsupported) => {
                tracing::error!(topic, "{}", unsupported);
                return DispatchOutcome::Dropped;
            }
        };

        let notification = Notification::render(topic, payload);

        match channel {
            NotificationChannel::InApp => match self.registry.deliver(notification).await {
                Delivery::Broadcast(report) => {
                    tracing::debug!(
                        topic,
                        delivered = report.delivered,
                        failed = report.failed.len(),
                        "Notification broadcast"
                    );
                    DispatchOutcome::Delivered {
                        recipients: report.delivered,
                        failed: report.failed.len(),
                    }
                }
                Delivery::Buffered => {
                    tracing::info!(topic, "No clients connected, notification buffered");
                    DispatchOutcome::Buffered
                }
            },
            NotificationChannel::Email => match self.email.send(&notification).await {
                Ok(()) => DispatchOutcome::Emailed,
                Err(e) => {
                    tracing::error!(
                        topic,
                        sender = self.email.name(),
                        error = %e,
                        "Failed to send email notification"
                    );
                    DispatchOutcome::Dropped
                }
            },
        }
    }
}
