//! Redis pub/sub broker transport for production deployments.
//!
//! Topics map one-to-one onto Redis channels. Each subscription holds its
//! own dedicated pub/sub connection (Redis puts a connection into
//! subscriber mode, so it cannot be multiplexed) and a pump task that
//! forwards messages into the subscription's bounded queue.
//!
//! When Redis drops a pub/sub connection the pump's stream ends, the queue
//! sender is dropped, and the subscription yields `None`. The relay treats
//! that as a broker failure.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Mutex, MutexGuard, PoisonError};

use async_trait::async_trait;
use futures::StreamExt;
use redis::aio::{MultiplexedConnection, PubSub};
use redis::Client;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

use crate::ports::{BrokerError, BrokerLink, BrokerMessage, BrokerTransport, Subscription};

/// Redis-backed broker transport.
#[derive(Clone)]
pub struct RedisBroker {
    client: Client,
    url: String,
}

impl RedisBroker {
    /// Create a transport for `url` (e.g. `redis://127.0.0.1:6379`).
    ///
    /// Only validates the URL; no connection is made until `open`.
    pub fn new(url: &str) -> Result<Self, BrokerError> {
        let client = Client::open(url).map_err(|e| BrokerError::Connect(e.to_string()))?;
        Ok(Self {
            client,
            url: url.to_string(),
        })
    }
}

#[async_trait]
impl BrokerTransport for RedisBroker {
    async fn open(&self) -> Result<Box<dyn BrokerLink>, BrokerError> {
        let mut control = self
            .client
            .get_multiplexed_async_connection()
            .await
            .map_err(|e: redis::RedisError| BrokerError::Connect(e.to_string()))?;

        let _: String = redis::cmd("PING")
            .query_async(&mut control)
            .await
            .map_err(|e: redis::RedisError| BrokerError::Connect(e.to_string()))?;

        let link: Box<dyn BrokerLink> = Box::new(RedisLink {
            client: self.client.clone(),
            _control: control,
            pumps: Mutex::new(Vec::new()),
            closed: AtomicBool::new(false),
        });
        Ok(link)
    }

    fn endpoint(&self) -> String {
        self.url.clone()
    }
}

/// One live session with Redis.
///
/// Keeps the handshake connection open for the life of the link and owns
/// the pump task of every subscription made through it.
struct RedisLink {
    client: Client,
    _control: MultiplexedConnection,
    pumps: Mutex<Vec<JoinHandle<()>>>,
    closed: AtomicBool,
}

impl RedisLink {
    fn pumps(&self) -> MutexGuard<'_, Vec<JoinHandle<()>>> {
        self.pumps.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn abort_pumps(&self) {
        for pump in self.pumps().drain(..) {
            pump.abort();
        }
    }
}

#[async_trait]
impl BrokerLink for RedisLink {
    async fn subscribe(&self, topic: &str, capacity: usize) -> Result<Subscription, BrokerError> {
        if self.closed.load(Ordering::SeqCst) {
            return Err(BrokerError::Closed);
        }

        let subscribe_error = |e: redis::RedisError| BrokerError::Subscribe {
            topic: topic.to_string(),
            reason: e.to_string(),
        };

        let conn = self.client.get_async_connection().await.map_err(subscribe_error)?;
        let mut pubsub = conn.into_pubsub();
        pubsub.subscribe(topic).await.map_err(subscribe_error)?;

        let (sender, receiver) = mpsc::channel(capacity.max(1));
        let pump = tokio::spawn(pump_messages(topic.to_string(), pubsub, sender));
        self.pumps().push(pump);

        tracing::debug!(topic, "Subscribed to Redis channel");
        Ok(Subscription::new(topic, receiver))
    }

    async fn close(&self) -> Result<(), BrokerError> {
        if !self.closed.swap(true, Ordering::SeqCst) {
            self.abort_pumps();
        }
        Ok(())
    }
}

impl Drop for RedisLink {
    fn drop(&mut self) {
        self.abort_pumps();
    }
}

async fn pump_messages(topic: String, pubsub: PubSub, sender: mpsc::Sender<BrokerMessage>) {
    let mut stream = pubsub.into_on_message();

    while let Some(msg) = stream.next().await {
        let payload: String = match msg.get_payload() {
            Ok(payload) => payload,
            Err(e) => {
                tracing::warn!(topic = %topic, error = %e, "Skipping non-text Redis payload");
                continue;
            }
        };

        if sender.send(BrokerMessage::new(&topic, payload)).await.is_err() {
            // Subscriber went away.
            return;
        }
    }

    tracing::warn!(topic = %topic, "Redis subscription stream ended");
}
