//! In-memory broker transport for testing.
//!
//! Delivers published messages to every live subscription on the topic and
//! can inject connect failures, hung handshakes, failing topics, and a
//! mid-life connection drop.
//!
//! # Security Note
//!
//! This adapter is for **testing only** and should not be used in production.
//! It uses `.expect()` on lock operations which will panic if locks are poisoned.
//! Production code should use the Redis broker adapter.

use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};

use async_trait::async_trait;
use tokio::sync::mpsc;

use crate::ports::{BrokerError, BrokerLink, BrokerMessage, BrokerTransport, Subscription};

#[derive(Default)]
struct Faults {
    unreachable: bool,
    fail_next: usize,
    hang_next: usize,
    failing_topics: HashSet<String>,
}

struct Subscriber {
    link_id: u64,
    sender: mpsc::Sender<BrokerMessage>,
}

#[derive(Default)]
struct Shared {
    faults: Mutex<Faults>,
    subscribers: Mutex<HashMap<String, Vec<Subscriber>>>,
    /// Links opened before the last `drop_connections` are dead.
    generation: AtomicU64,
    next_link_id: AtomicU64,
    open_attempts: AtomicUsize,
}

impl Shared {
    fn faults(&self) -> MutexGuard<'_, Faults> {
        self.faults.lock().expect("InMemoryBroker: faults lock poisoned")
    }

    fn subscribers(&self) -> MutexGuard<'_, HashMap<String, Vec<Subscriber>>> {
        self.subscribers
            .lock()
            .expect("InMemoryBroker: subscribers lock poisoned")
    }
}

enum OpenOutcome {
    Accept,
    Refuse,
    Hang,
}

/// In-memory broker for testing.
///
/// # Panics
///
/// Methods may panic if internal locks are poisoned. This is acceptable
/// for test code but this adapter should NOT be used in production.
///
/// # Example
///
/// ```ignore
/// let broker = Arc::new(InMemoryBroker::new());
/// broker.fail_next_connects(2);
///
/// let connector = BrokerConnector::new(broker.clone(), RetryPolicy::default());
/// connector.connect().await?;
/// assert_eq!(broker.open_attempts(), 3);
/// ```
#[derive(Default)]
pub struct InMemoryBroker {
    shared: Arc<Shared>,
}

impl InMemoryBroker {
    /// A broker that accepts every connection.
    pub fn new() -> Self {
        Self::default()
    }

    /// A broker that refuses every connection.
    pub fn unreachable() -> Self {
        let broker = Self::new();
        broker.set_unreachable(true);
        broker
    }

    // === Fault Injection ===

    /// Refuse (or stop refusing) every connection.
    ///
    /// # Panics
    ///
    /// Panics if the internal lock is poisoned.
    pub fn set_unreachable(&self, unreachable: bool) {
        self.shared.faults().unreachable = unreachable;
    }

    /// Refuse the next `count` connection attempts.
    ///
    /// # Panics
    ///
    /// Panics if the internal lock is poisoned.
    pub fn fail_next_connects(&self, count: usize) {
        self.shared.faults().fail_next = count;
    }

    /// Never complete the next `count` handshakes.
    ///
    /// # Panics
    ///
    /// Panics if the internal lock is poisoned.
    pub fn hang_next_connects(&self, count: usize) {
        self.shared.faults().hang_next = count;
    }

    /// Reject subscriptions to `topic`.
    ///
    /// # Panics
    ///
    /// Panics if the internal lock is poisoned.
    pub fn fail_topic(&self, topic: &str) {
        self.shared.faults().failing_topics.insert(topic.to_string());
    }

    /// Sever every open link, ending all of their subscriptions.
    ///
    /// # Panics
    ///
    /// Panics if the internal lock is poisoned.
    pub fn drop_connections(&self) {
        self.shared.generation.fetch_add(1, Ordering::SeqCst);
        self.shared.subscribers().clear();
    }

    // === Test Helpers ===

    /// Deliver a message to every live subscription on `topic`.
    ///
    /// Returns how many subscriptions accepted it.
    ///
    /// # Panics
    ///
    /// Panics if the internal lock is poisoned.
    pub async fn publish(&self, topic: &str, payload: &str) -> usize {
        let senders: Vec<_> = self
            .shared
            .subscribers()
            .get(topic)
            .map(|subs| subs.iter().map(|s| s.sender.clone()).collect())
            .unwrap_or_default();

        let mut delivered = 0;
        for sender in senders {
            if sender.send(BrokerMessage::new(topic, payload)).await.is_ok() {
                delivered += 1;
            }
        }
        delivered
    }

    /// Number of connection attempts seen so far.
    pub fn open_attempts(&self) -> usize {
        self.shared.open_attempts.load(Ordering::SeqCst)
    }

    /// Number of live subscriptions on `topic`.
    ///
    /// # Panics
    ///
    /// Panics if the internal lock is poisoned.
    pub fn subscriber_count(&self, topic: &str) -> usize {
        self.shared
            .subscribers()
            .get(topic)
            .map(|subs| subs.iter().filter(|s| !s.sender.is_closed()).count())
            .unwrap_or(0)
    }

    fn next_outcome(&self) -> OpenOutcome {
        let mut faults = self.shared.faults();
        if faults.hang_next > 0 {
            faults.hang_next -= 1;
            OpenOutcome::Hang
        } else if faults.fail_next > 0 {
            faults.fail_next -= 1;
            OpenOutcome::Refuse
        } else if faults.unreachable {
            OpenOutcome::Refuse
        } else {
            OpenOutcome::Accept
        }
    }
}

#[async_trait]
impl BrokerTransport for InMemoryBroker {
    async fn open(&self) -> Result<Box<dyn BrokerLink>, BrokerError> {
        self.shared.open_attempts.fetch_add(1, Ordering::SeqCst);

        match self.next_outcome() {
            OpenOutcome::Accept => {
                let link: Box<dyn BrokerLink> = Box::new(InMemoryLink {
                    shared: Arc::clone(&self.shared),
                    id: self.shared.next_link_id.fetch_add(1, Ordering::SeqCst),
                    generation: self.shared.generation.load(Ordering::SeqCst),
                });
                Ok(link)
            }
            OpenOutcome::Refuse => Err(BrokerError::Connect("connection refused".to_string())),
            OpenOutcome::Hang => futures::future::pending().await,
        }
    }

    fn endpoint(&self) -> String {
        "memory://broker".to_string()
    }
}

struct InMemoryLink {
    shared: Arc<Shared>,
    id: u64,
    generation: u64,
}

impl InMemoryLink {
    fn is_alive(&self) -> bool {
        self.shared.generation.load(Ordering::SeqCst) == self.generation
    }
}

#[async_trait]
impl BrokerLink for InMemoryLink {
    async fn subscribe(&self, topic: &str, capacity: usize) -> Result<Subscription, BrokerError> {
        if !self.is_alive() {
            return Err(BrokerError::Closed);
        }
        if self.shared.faults().failing_topics.contains(topic) {
            return Err(BrokerError::Subscribe {
                topic: topic.to_string(),
                reason: "subscription rejected".to_string(),
            });
        }

        let (sender, receiver) = mpsc::channel(capacity.max(1));
        self.shared
            .subscribers()
            .entry(topic.to_string())
            .or_default()
            .push(Subscriber {
                link_id: self.id,
                sender,
            });
        Ok(Subscription::new(topic, receiver))
    }

    async fn close(&self) -> Result<(), BrokerError> {
        let mut subscribers = self.shared.subscribers();
        for subs in subscribers.values_mut() {
            subs.retain(|s| s.link_id != self.id);
        }
        Ok(())
    }
}
