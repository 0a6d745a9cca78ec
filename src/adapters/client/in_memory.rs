//! In-memory client sink for testing.
//!
//! Records every text frame it accepts and can be told to fail, hang, or
//! fail after a number of successful sends.
//!
//! # Security Note
//!
//! This adapter is for **testing only**. It uses `.expect()` on lock
//! operations which will panic if locks are poisoned.

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;

use crate::ports::{ClientSendError, ClientSink};

/// How an [`InMemoryClient`] responds to sends.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClientBehavior {
    /// Record and succeed.
    Accept,
    /// Fail every send as if the peer had closed.
    Reject,
    /// Never complete the send.
    Hang,
    /// Accept this many sends, then fail with a transport error.
    FailAfter(usize),
}

/// Recording client sink.
///
/// # Example
///
/// ```ignore
/// let client = Arc::new(InMemoryClient::new());
/// registry.register(ClientId::new(), client.clone()).await;
/// registry.broadcast(&notification).await;
/// assert_eq!(client.received(), vec!["[user.created] alice"]);
/// ```
pub struct InMemoryClient {
    received: Mutex<Vec<String>>,
    behavior: Mutex<ClientBehavior>,
    attempts: AtomicUsize,
    evicted: AtomicBool,
}

impl InMemoryClient {
    /// A client that accepts everything.
    pub fn new() -> Self {
        Self::with_behavior(ClientBehavior::Accept)
    }

    /// A client whose every send fails.
    pub fn failing() -> Self {
        Self::with_behavior(ClientBehavior::Reject)
    }

    /// A client whose sends never complete.
    pub fn hanging() -> Self {
        Self::with_behavior(ClientBehavior::Hang)
    }

    /// A client that fails once it has accepted `accepted` sends.
    pub fn failing_after(accepted: usize) -> Self {
        Self::with_behavior(ClientBehavior::FailAfter(accepted))
    }

    pub fn with_behavior(behavior: ClientBehavior) -> Self {
        Self {
            received: Mutex::new(Vec::new()),
            behavior: Mutex::new(behavior),
            attempts: AtomicUsize::new(0),
            evicted: AtomicBool::new(false),
        }
    }

    /// Change behaviour for subsequent sends.
    ///
    /// # Panics
    ///
    /// Panics if the internal lock is poisoned.
    pub fn set_behavior(&self, behavior: ClientBehavior) {
        *self
            .behavior
            .lock()
            .expect("InMemoryClient: behavior lock poisoned") = behavior;
    }

    /// Every frame accepted so far, in order.
    ///
    /// # Panics
    ///
    /// Panics if the internal lock is poisoned.
    pub fn received(&self) -> Vec<String> {
        self.received
            .lock()
            .expect("InMemoryClient: received lock poisoned")
            .clone()
    }

    /// Number of send attempts, successful or not.
    pub fn attempts(&self) -> usize {
        self.attempts.load(Ordering::SeqCst)
    }

    /// Whether the registry evicted this client.
    pub fn was_evicted(&self) -> bool {
        self.evicted.load(Ordering::SeqCst)
    }

    fn record(&self, text: &str) {
        self.received
            .lock()
            .expect("InMemoryClient: received lock poisoned")
            .push(text.to_string());
    }
}

impl Default for InMemoryClient {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ClientSink for InMemoryClient {
    async fn send_text(&self, text: &str) -> Result<(), ClientSendError> {
        self.attempts.fetch_add(1, Ordering::SeqCst);

        let behavior = *self
            .behavior
            .lock()
            .expect("InMemoryClient: behavior lock poisoned");

        match behavior {
            ClientBehavior::Accept => {
                self.record(text);
                Ok(())
            }
            ClientBehavior::Reject => Err(ClientSendError::Closed),
            ClientBehavior::Hang => futures::future::pending().await,
            ClientBehavior::FailAfter(limit) => {
                if self.received().len() < limit {
                    self.record(text);
                    Ok(())
                } else {
                    Err(ClientSendError::Transport("injected failure".to_string()))
                }
            }
        }
    }

    fn evict(&self) {
        self.evicted.store(true, Ordering::SeqCst);
    }
}
