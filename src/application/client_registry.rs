//! Registry of connected real-time clients.
//!
//! Every client receives every notification; there are no rooms or
//! per-client filters. The registry also owns the missed-notification
//! buffer so that "nobody is connected, buffer it" and "a client just
//! connected, replay the buffer" are decided under one lock.
//!
//! # Architecture
//!
//! ```text
//!   dispatcher ──deliver──▶ ┌──────────────────────────────┐
//!                           │ ClientRegistry (one Mutex)   │
//!   endpoint ──register──▶  │  clients: id → ClientSink    │
//!            ──unregister─▶ │  missed:  ordered buffer     │
//!                           └──────────────────────────────┘
//! ```
//!
//! Lock order is always registry, then buffer.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use futures::future::join_all;
use thiserror::Error;
use tokio::sync::Mutex;

use crate::domain::foundation::ClientId;
use crate::domain::notification::Notification;
use crate::ports::{ClientSendError, ClientSink};

use super::missed_notifications::MissedNotificationBuffer;

/// Default upper bound for a single client send.
pub const DEFAULT_SEND_TIMEOUT: Duration = Duration::from_secs(5);

/// Result of fanning one notification out to the registered clients.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BroadcastReport {
    /// Clients that accepted the notification.
    pub delivered: usize,
    /// Clients whose send failed or timed out; they are no longer registered.
    pub failed: Vec<ClientId>,
}

/// What `deliver` did with a notification.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Delivery {
    /// At least one client was registered; the notification was broadcast.
    Broadcast(BroadcastReport),
    /// No client was registered; the notification went to the missed buffer.
    Buffered,
}

/// Replay of missed notifications to a newly connected client failed.
///
/// The client has been unregistered and the undelivered remainder dropped.
#[derive(Debug, Clone, Error)]
#[error("Replay to client {client_id} failed after {delivered} of {total} notifications: {source}")]
pub struct ReplayError {
    pub client_id: ClientId,
    pub delivered: usize,
    pub total: usize,
    #[source]
    pub source: ClientSendError,
}

/// Thread-safe set of connected clients plus the missed-notification buffer.
///
/// # Thread Safety
///
/// Registration, removal, broadcast and the empty check all take the same
/// `tokio::sync::Mutex`, so a broadcast never iterates a set that is being
/// mutated and never decides "empty" against a registration that is in
/// flight. Sends inside a broadcast run concurrently and are individually
/// bounded by the send timeout, so one hung client holds the lock for at
/// most that long.
pub struct ClientRegistry {
    clients: Mutex<HashMap<ClientId, Arc<dyn ClientSink>>>,
    missed: MissedNotificationBuffer,
    send_timeout: Duration,
}

impl ClientRegistry {
    /// Create a registry with the given send timeout and an unbounded buffer.
    pub fn new(send_timeout: Duration) -> Self {
        Self::with_buffer(send_timeout, MissedNotificationBuffer::new())
    }

    /// Create a registry around an existing missed-notification buffer.
    pub fn with_buffer(send_timeout: Duration, missed: MissedNotificationBuffer) -> Self {
        Self {
            clients: Mutex::new(HashMap::new()),
            missed,
            send_timeout,
        }
    }

    /// Add a client. Re-registering an id replaces its sink.
    pub async fn register(&self, client_id: ClientId, sink: Arc<dyn ClientSink>) {
        let mut clients = self.clients.lock().await;
        clients.insert(client_id, sink);
        tracing::debug!(client_id = %client_id, total = clients.len(), "Client registered");
    }

    /// Remove a client. Returns false if it was not registered.
    pub async fn unregister(&self, client_id: &ClientId) -> bool {
        let mut clients = self.clients.lock().await;
        let removed = clients.remove(client_id).is_some();
        if removed {
            tracing::debug!(client_id = %client_id, total = clients.len(), "Client unregistered");
        }
        removed
    }

    /// Whether no client is currently registered.
    pub async fn is_empty(&self) -> bool {
        self.clients.lock().await.is_empty()
    }

    /// Number of registered clients.
    pub async fn len(&self) -> usize {
        self.clients.lock().await.len()
    }

    /// Whether `client_id` is currently registered.
    pub async fn contains(&self, client_id: &ClientId) -> bool {
        self.clients.lock().await.contains_key(client_id)
    }

    /// Upper bound on a single client send.
    pub fn send_timeout(&self) -> Duration {
        self.send_timeout
    }

    /// The missed-notification buffer owned by this registry.
    pub fn missed(&self) -> &MissedNotificationBuffer {
        &self.missed
    }

    /// Send the notification to every registered client.
    ///
    /// A client whose send fails or times out is logged, unregistered and
    /// evicted; the remaining clients still receive the notification.
    pub async fn broadcast(&self, notification: &Notification) -> BroadcastReport {
        let mut clients = self.clients.lock().await;
        self.broadcast_locked(&mut clients, notification).await
    }

    /// Broadcast if anyone is connected, otherwise buffer as missed.
    ///
    /// The empty check and the resulting action happen under one lock.
    pub async fn deliver(&self, notification: Notification) -> Delivery {
        let mut clients = self.clients.lock().await;

        if clients.is_empty() {
            if let Some(evicted) = self.missed.append(notification) {
                tracing::warn!(
                    evicted = %evicted,
                    capacity = ?self.missed.capacity(),
                    "Missed-notification buffer full, dropped oldest entry"
                );
            }
            return Delivery::Buffered;
        }

        Delivery::Broadcast(self.broadcast_locked(&mut clients, &notification).await)
    }

    /// Register a new client and replay every missed notification to it.
    ///
    /// Registration, drain and replay happen under the registry lock, so
    /// the client sees its backlog before any live notification and two
    /// clients connecting together never split or duplicate the backlog.
    /// If a replay send fails the client is unregistered and the rest of
    /// the backlog is dropped.
    ///
    /// Returns the number of notifications replayed.
    pub async fn register_with_replay(
        &self,
        client_id: ClientId,
        sink: Arc<dyn ClientSink>,
    ) -> Result<usize, ReplayError> {
        let mut clients = self.clients.lock().await;
        clients.insert(client_id, Arc::clone(&sink));

        let backlog = self.missed.drain_all();
        let total = backlog.len();

        for (delivered, notification) in backlog.iter().enumerate() {
            if let Err(source) = self.send_bounded(sink.as_ref(), notification.text()).await {
                clients.remove(&client_id);
                sink.evict();
                tracing::error!(
                    client_id = %client_id,
                    delivered,
                    dropped = total - delivered,
                    error = %source,
                    "Failed to send missed notification"
                );
                return Err(ReplayError {
                    client_id,
                    delivered,
                    total,
                    source,
                });
            }
        }

        if let Some(oldest) = backlog.first() {
            tracing::info!(
                client_id = %client_id,
                count = total,
                oldest_age_secs = oldest.received_at().age().num_seconds(),
                "Replayed missed notifications"
            );
        }
        tracing::debug!(client_id = %client_id, total = clients.len(), "Client registered");

        Ok(total)
    }

    async fn broadcast_locked(
        &self,
        clients: &mut HashMap<ClientId, Arc<dyn ClientSink>>,
        notification: &Notification,
    ) -> BroadcastReport {
        let text = notification.text();
        let sends = clients.iter().map(|(client_id, sink)| async move {
            (*client_id, self.send_bounded(sink.as_ref(), text).await)
        });
        let results = join_all(sends).await;

        let mut report = BroadcastReport::default();
        for (client_id, result) in results {
            match result {
                Ok(()) => report.delivered += 1,
                Err(e) => {
                    tracing::error!(
                        client_id = %client_id,
                        topic = notification.topic(),
                        error = %e,
                        "Failed to send notification to client"
                    );
                    if let Some(sink) = clients.remove(&client_id) {
                        sink.evict();
                    }
                    report.failed.push(client_id);
                }
            }
        }
        report
    }

    async fn send_bounded(&self, sink: &dyn ClientSink, text: &str) -> Result<(), ClientSendError> {
        match tokio::time::timeout(self.send_timeout, sink.send_text(text)).await {
            Ok(result) => result,
            Err(_) => Err(ClientSendError::TimedOut(self.send_timeout)),
        }
    }
}

impl Default for ClientRegistry {
    fn default() -> Self {
        Self::new(DEFAULT_SEND_TIMEOUT)
    }
}
