//! SubscriptionManager - one broker subscription and dispatch loop per topic.
//!
//! ```text
//! broker ──▶ Subscription(user.created)    ──bounded queue──▶ dispatch loop ─┐
//!        ──▶ Subscription(product.created) ──bounded queue──▶ dispatch loop ─┼─▶ dispatcher
//!        ──▶ ...                                                              ─┘
//! ```
//!
//! Each loop awaits every dispatch before taking the next message, so
//! per-topic order is kept. There is no ordering across topics.

use std::sync::Arc;

use tokio::task::JoinSet;

use crate::domain::notification::RELAY_TOPICS;
use crate::ports::Subscription;

use super::broker_connector::{BrokerConnector, ConnectorError};
use super::dispatcher::NotificationDispatcher;

/// Default bounded queue size per topic subscription.
pub const DEFAULT_SUBSCRIPTION_CAPACITY: usize = 256;

/// Subscribes the relay's topic set and runs its dispatch loops.
pub struct SubscriptionManager {
    connector: Arc<BrokerConnector>,
    dispatcher: Arc<NotificationDispatcher>,
    topics: Vec<String>,
    capacity: usize,
}

impl SubscriptionManager {
    pub fn new<I, S>(
        connector: Arc<BrokerConnector>,
        dispatcher: Arc<NotificationDispatcher>,
        topics: I,
        capacity: usize,
    ) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            connector,
            dispatcher,
            topics: topics.into_iter().map(Into::into).collect(),
            capacity: capacity.max(1),
        }
    }

    /// Manager for the fixed relay topic set.
    pub fn for_relay_topics(
        connector: Arc<BrokerConnector>,
        dispatcher: Arc<NotificationDispatcher>,
        capacity: usize,
    ) -> Self {
        Self::new(connector, dispatcher, RELAY_TOPICS.iter().copied(), capacity)
    }

    pub fn topics(&self) -> &[String] {
        &self.topics
    }

    /// Subscribe every topic and start a dispatch loop for each success.
    ///
    /// A topic that fails to subscribe is logged and reported in
    /// [`ActiveSubscriptions::failures`]; the others are still subscribed.
    pub async fn subscribe_all(&self) -> ActiveSubscriptions {
        let mut active = ActiveSubscriptions::default();

        for topic in &self.topics {
            match self.connector.subscribe(topic, self.capacity).await {
                Ok(subscription) => {
                    tracing::info!(topic = %topic, "Subscribed to topic");
                    active
                        .tasks
                        .spawn(dispatch_loop(subscription, Arc::clone(&self.dispatcher)));
                }
                Err(e) => {
                    tracing::error!(topic = %topic, error = %e, "Failed to subscribe to topic");
                    active.failures.push((topic.clone(), e));
                }
            }
        }

        active
    }
}

/// Drain one subscription into the dispatcher until the broker ends it.
///
/// Returns the topic so the supervisor knows which stream closed.
async fn dispatch_loop(
    mut subscription: Subscription,
    dispatcher: Arc<NotificationDispatcher>,
) -> String {
    while let Some(message) = subscription.next().await {
        let outcome = dispatcher.dispatch(&message.topic, &message.payload).await;
        tracing::trace!(topic = %message.topic, ?outcome, "Message dispatched");
    }
    subscription.topic().to_string()
}

/// Running dispatch loops plus the topics that could not be subscribed.
#[derive(Default)]
pub struct ActiveSubscriptions {
    tasks: JoinSet<String>,
    failures: Vec<(String, ConnectorError)>,
}

impl ActiveSubscriptions {
    /// Number of dispatch loops still running.
    pub fn active_count(&self) -> usize {
        self.tasks.len()
    }

    /// Topics that failed to subscribe, with the reason.
    pub fn failures(&self) -> &[(String, ConnectorError)] {
        &self.failures
    }

    /// Wait for any dispatch loop to end and return its topic.
    ///
    /// Returns `None` when no loop is running.
    pub async fn next_ended(&mut self) -> Option<String> {
        let joined = self.tasks.join_next().await?;
        Some(match joined {
            Ok(topic) => topic,
            Err(e) => {
                tracing::error!(error = %e, "Dispatch loop terminated abnormally");
                "unknown".to_string()
            }
        })
    }

    /// Abort every dispatch loop and wait for them to stop.
    pub async fn shutdown(&mut self) {
        self.tasks.shutdown().await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    use crate::adapters::broker::InMemoryBroker;
    use crate::adapters::client::InMemoryClient;
    use crate::adapters::email::LoggingEmailSender;
    use crate::application::ClientRegistry;
    use crate::domain::broker::RetryPolicy;
    use crate::domain::foundation::ClientId;

    struct Fixture {
        broker: Arc<InMemoryBroker>,
        connector: Arc<BrokerConnector>,
        registry: Arc<ClientRegistry>,
        manager: SubscriptionManager,
    }

    fn fixture() -> Fixture {
        let broker = Arc::new(InMemoryBroker::new());
        let connector = Arc::new(BrokerConnector::new(broker.clone(), RetryPolicy::default()));
        let registry = Arc::new(ClientRegistry::new(Duration::from_millis(100)));
        let dispatcher = Arc::new(NotificationDispatcher::new(
            "in_app",
            registry.clone(),
            Arc::new(LoggingEmailSender::new("ops@example.com")),
        ));
        let manager = SubscriptionManager::for_relay_topics(connector.clone(), dispatcher, 16);
        Fixture {
            broker,
            connector,
            registry,
            manager,
        }
    }

    async fn wait_for<F: Fn() -> bool>(condition: F) {
        for _ in 0..200 {
            if condition() {
                return;
            }
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
        panic!("condition not met in time");
    }

    #[tokio::test]
    async fn subscribes_every_relay_topic() {
        let f = fixture();
        f.connector.connect().await.unwrap();

        let active = f.manager.subscribe_all().await;

        assert_eq!(active.active_count(), RELAY_TOPICS.len());
        assert!(active.failures().is_empty());
        for topic in RELAY_TOPICS {
            assert_eq!(f.broker.subscriber_count(topic), 1, "{}", topic);
        }
    }

    #[tokio::test]
    async fn one_failing_topic_does_not_block_the_rest() {
        let f = fixture();
        f.broker.fail_topic("user.deleted");
        f.connector.connect().await.unwrap();

        let active = f.manager.subscribe_all().await;

        assert_eq!(active.active_count(), RELAY_TOPICS.len() - 1);
        assert_eq!(active.failures().len(), 1);
        assert_eq!(active.failures()[0].0, "user.deleted");
        assert_eq!(f.broker.subscriber_count("user.created"), 1);
    }

    #[tokio::test]
    async fn subscribe_all_while_disconnected_reports_every_topic() {
        let f = fixture();

        let active = f.manager.subscribe_all().await;

        assert_eq!(active.active_count(), 0);
        assert_eq!(active.failures().len(), RELAY_TOPICS.len());
        assert!(active
            .failures()
            .iter()
            .all(|(_, e)| *e == ConnectorError::NotConnected));
    }

    #[tokio::test]
    async fn messages_flow_to_clients_in_topic_order() {
        let f = fixture();
        f.connector.connect().await.unwrap();
        let client = Arc::new(InMemoryClient::new());
        f.registry.register(ClientId::new(), client.clone()).await;
        let _active = f.manager.subscribe_all().await;

        for i in 0..5 {
            f.broker.publish("user.created", &i.to_string()).await;
        }

        wait_for(|| client.received().len() == 5).await;
        assert_eq!(
            client.received(),
            (0..5).map(|i| format!("[user.created] {}", i)).collect::<Vec<_>>()
        );
    }

    #[tokio::test]
    async fn dropped_connection_ends_dispatch_loops() {
        let f = fixture();
        f.connector.connect().await.unwrap();
        let mut active = f.manager.subscribe_all().await;

        f.broker.drop_connections();

        let ended = active.next_ended().await.unwrap();
        assert!(RELAY_TOPICS.contains(&ended.as_str()));
        active.shutdown().await;
        assert_eq!(active.active_count(), 0);
        assert_eq!(active.next_ended().await, None);
    }
}
