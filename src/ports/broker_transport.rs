//! BrokerTransport port - Interface for the physical broker connection.
//!
//! The relay never talks to a broker client library directly. A transport
//! opens links; a link hands out subscriptions whose messages arrive on a
//! bounded channel, one channel per topic. When the link dies, every
//! subscription channel it produced is closed, which is how the relay
//! notices a mid-life disconnect.

use async_trait::async_trait;
use thiserror::Error;
use tokio::sync::mpsc;

/// One message received from the broker.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BrokerMessage {
    /// Topic (subject/channel) the message was published on.
    pub topic: String,
    /// Opaque UTF-8 payload.
    pub payload: String,
}

impl BrokerMessage {
    pub fn new(topic: impl Into<String>, payload: impl Into<String>) -> Self {
        Self {
            topic: topic.into(),
            payload: payload.into(),
        }
    }
}

/// A live subscription to one topic.
///
/// Messages are delivered in broker order. `next` returns `None` once the
/// underlying link has gone away.
#[derive(Debug)]
pub struct Subscription {
    topic: String,
    messages: mpsc::Receiver<BrokerMessage>,
}

impl Subscription {
    pub fn new(topic: impl Into<String>, messages: mpsc::Receiver<BrokerMessage>) -> Self {
        Self {
            topic: topic.into(),
            messages,
        }
    }

    /// Topic this subscription was created for.
    pub fn topic(&self) -> &str {
        &self.topic
    }

    /// Wait for the next message, or `None` when the subscription ended.
    pub async fn next(&mut self) -> Option<BrokerMessage> {
        self.messages.recv().await
    }
}

/// Errors reported by broker transports.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BrokerError {
    /// The handshake with the broker failed.
    #[error("Broker connection failed: {0}")]
    Connect(String),

    /// The broker rejected or failed a subscription.
    #[error("Subscribe to '{topic}' failed: {reason}")]
    Subscribe { topic: String, reason: String },

    /// The link was already closed.
    #[error("Broker link is closed")]
    Closed,
}

/// Port for opening broker connections.
///
/// Implementations perform exactly one handshake per `open` call; retry
/// policy belongs to the caller.
#[async_trait]
pub trait BrokerTransport: Send + Sync {
    /// Establish a new link to the broker.
    async fn open(&self) -> Result<Box<dyn BrokerLink>, BrokerError>;

    /// Human-readable broker address for logs.
    fn endpoint(&self) -> String;
}

/// An established broker connection.
#[async_trait]
pub trait BrokerLink: Send + Sync {
    /// Subscribe to `topic`, buffering at most `capacity` undelivered messages.
    async fn subscribe(&self, topic: &str, capacity: usize) -> Result<Subscription, BrokerError>;

    /// Tear the link down. Every subscription created from it ends.
    async fn close(&self) -> Result<(), BrokerError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[allow(dead_code)]
    fn assert_transport_object_safe(_: &dyn BrokerTransport) {}

    #[allow(dead_code)]
    fn assert_link_object_safe(_: &dyn BrokerLink) {}

    #[tokio::test]
    async fn subscription_yields_messages_then_ends() {
        let (tx, rx) = mpsc::channel(4);
        let mut sub = Subscription::new("user.created", rx);

        tx.send(BrokerMessage::new("user.created", "alice")).await.unwrap();
        drop(tx);

        assert_eq!(sub.topic(), "user.created");
        assert_eq!(
            sub.next().await,
            Some(BrokerMessage::new("user.created", "alice"))
        );
        assert_eq!(sub.next().await, None);
    }

    #[test]
    fn subscribe_error_names_topic() {
        let err = BrokerError::Subscribe {
            topic: "user.deleted".to_string(),
            reason: "permission denied".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "Subscribe to 'user.deleted' failed: permission denied"
        );
    }
}
