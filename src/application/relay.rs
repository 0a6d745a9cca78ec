//! NotificationRelay - supervises the broker connection and subscriptions.
//!
//! ## Lifecycle
//!
//! ```text
//! start ──▶ connect (bounded retry) ──▶ subscribe all topics ──▶ running
//!                 ▲                                                 │
//!                 │          any subscription ends                  │
//!                 └──── mark disconnected ◀─────────────────────────┘
//! ```
//!
//! A failed reconnect (retry bound exhausted) ends `run` with an error.
//!
//! ## Graceful Shutdown
//!
//! `run` listens for a shutdown signal, stops the dispatch loops and
//! closes the broker connection before returning.

use std::sync::Arc;

use thiserror::Error;
use tokio::sync::watch;

use super::broker_connector::{BrokerConnector, ConnectorError};
use super::subscription_manager::{ActiveSubscriptions, SubscriptionManager};

/// Errors that stop the relay.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RelayError {
    #[error("Broker unavailable: {0}")]
    Broker(#[from] ConnectorError),
}

/// Owns the connect → subscribe → reconnect cycle.
pub struct NotificationRelay {
    connector: Arc<BrokerConnector>,
    subscriptions: SubscriptionManager,
}

impl NotificationRelay {
    pub fn new(connector: Arc<BrokerConnector>, subscriptions: SubscriptionManager) -> Self {
        Self {
            connector,
            subscriptions,
        }
    }

    pub fn connector(&self) -> &Arc<BrokerConnector> {
        &self.connector
    }

    /// Establish the initial broker connection.
    ///
    /// # Errors
    ///
    /// `RelayError::Broker` when the retry bound is exhausted. Startup
    /// should treat this as fatal.
    pub async fn start(&self) -> Result<(), RelayError> {
        self.connector.connect().await?;
        Ok(())
    }

    /// Run until shutdown is signalled or a reconnect fails.
    ///
    /// Connects if not already connected, subscribes every topic, and
    /// re-does both whenever a subscription stream ends.
    ///
    /// # Arguments
    ///
    /// * `shutdown` - Watch channel that signals when to stop
    pub async fn run(&self, mut shutdown: watch::Receiver<bool>) -> Result<(), RelayError> {
        loop {
            tokio::select! {
                result = self.connector.connect() => {
                    if let Err(e) = result {
                        tracing::error!(error = %e, "Broker reconnect failed, relay stopping");
                        return Err(e.into());
                    }
                }
                _ = shutdown_requested(&mut shutdown) => {
                    self.stop().await;
                    return Ok(());
                }
            }

            let mut active = self.subscriptions.subscribe_all().await;
            if active.active_count() == 0 {
                tracing::error!(
                    topics = self.subscriptions.topics().len(),
                    "No topic could be subscribed, relay idle until shutdown"
                );
            } else {
                tracing::info!(
                    active = active.active_count(),
                    failed = active.failures().len(),
                    "Relay running"
                );
            }

            let ended = tokio::select! {
                topic = next_ended_or_idle(&mut active) => Some(topic),
                _ = shutdown_requested(&mut shutdown) => None,
            };

            active.shutdown().await;

            match ended {
                Some(topic) => {
                    tracing::warn!(topic = %topic, "Broker subscription ended, reconnecting");
                    self.connector.mark_disconnected().await;
                }
                None => {
                    self.stop().await;
                    return Ok(());
                }
            }
        }
    }

    async fn stop(&self) {
        if let Err(e) = self.connector.close().await {
            tracing::warn!(error = %e, "Error closing broker connection");
        }
        tracing::info!("Relay stopped");
    }
}

async fn next_ended_or_idle(active: &mut ActiveSubscriptions) -> String {
    match active.next_ended().await {
        Some(topic) => topic,
        None => futures::future::pending().await,
    }
}

/// Resolves once `true` is sent or the sender is dropped.
async fn shutdown_requested(shutdown: &mut watch::Receiver<bool>) {
    loop {
        if *shutdown.borrow() {
            return;
        }
        if shutdown.changed().await.is_err() {
            return;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    use crate::adapters::broker::InMemoryBroker;
    use crate::adapters::email::LoggingEmailSender;
    use crate::application::{ClientRegistry, NotificationDispatcher};
    use crate::domain::broker::{ConnectionState, RetryPolicy};

    fn relay(broker: Arc<InMemoryBroker>) -> NotificationRelay {
        let connector = Arc::new(BrokerConnector::new(broker, RetryPolicy::default()));
        let registry = Arc::new(ClientRegistry::new(Duration::from_millis(100)));
        let dispatcher = Arc::new(NotificationDispatcher::new(
            "in_app",
            registry,
            Arc::new(LoggingEmailSender::new("ops@example.com")),
        ));
        let subscriptions =
            SubscriptionManager::for_relay_topics(connector.clone(), dispatcher, 16);
        NotificationRelay::new(connector, subscriptions)
    }

    #[tokio::test]
    async fn start_connects() {
        let broker = Arc::new(InMemoryBroker::new());
        let relay = relay(broker.clone());

        relay.start().await.unwrap();

        assert_eq!(relay.connector().state().await, ConnectionState::Connected);
    }

    #[tokio::test(start_paused = true)]
    async fn start_fails_after_retry_bound() {
        let broker = Arc::new(InMemoryBroker::unreachable());
        let relay = relay(broker.clone());

        let err = relay.start().await.unwrap_err();

        assert!(matches!(
            err,
            RelayError::Broker(ConnectorError::ConnectionFailed { attempts: 5, .. })
        ));
        assert_eq!(broker.open_attempts(), 5);
    }

    #[tokio::test]
    async fn shutdown_closes_connection() {
        let broker = Arc::new(InMemoryBroker::new());
        let relay = Arc::new(relay(broker.clone()));
        relay.start().await.unwrap();

        let (tx, rx) = watch::channel(false);
        let handle = tokio::spawn({
            let relay = Arc::clone(&relay);
            async move { relay.run(rx).await }
        });

        while broker.subscriber_count("user.created") == 0 {
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
        tx.send(true).unwrap();

        handle.await.unwrap().unwrap();
        assert_eq!(relay.connector().state().await, ConnectionState::Disconnected);
        assert_eq!(broker.subscriber_count("user.created"), 0);
    }

    #[tokio::test]
    async fn dropped_sender_counts_as_shutdown() {
        let broker = Arc::new(InMemoryBroker::new());
        let relay = relay(broker);
        let (tx, rx) = watch::channel(false);
        drop(tx);

        assert!(relay.run(rx).await.is_ok());
    }

    #[tokio::test(start_paused = true)]
    async fn exhausted_reconnect_stops_with_error() {
        let broker = Arc::new(InMemoryBroker::new());
        let relay = Arc::new(relay(broker.clone()));
        relay.start().await.unwrap();

        let (_tx, rx) = watch::channel(false);
        let handle = tokio::spawn({
            let relay = Arc::clone(&relay);
            async move { relay.run(rx).await }
        });

        while broker.subscriber_count("user.created") == 0 {
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
        broker.set_unreachable(true);
        broker.drop_connections();

        let err = handle.await.unwrap().unwrap_err();
        assert!(matches!(
            err,
            RelayError::Broker(ConnectorError::ConnectionFailed { .. })
        ));
        // Initial connect plus five failed reconnect attempts.
        assert_eq!(broker.open_attempts(), 6);
    }
}
