//! BrokerConnector - owns the single outbound broker connection.
//!
//! Establishes the connection with a bounded retry policy, tracks its
//! lifecycle through [`ConnectionState`], and hands out subscriptions
//! only while connected.
//!
//! ## Retry
//!
//! | Setting | Default | Description |
//! |---------|---------|-------------|
//! | `max_attempts` | 5 | Attempts before the failure is terminal |
//! | `delay` | 2s | Pause between attempts |
//! | `attempt_timeout` | 5s | Bound on one handshake |

use std::sync::Arc;

use thiserror::Error;
use tokio::sync::Mutex;

use crate::domain::broker::{ConnectionState, RetryPolicy};
use crate::domain::foundation::StateMachine;
use crate::ports::{BrokerError, BrokerLink, BrokerTransport, Subscription};

/// Errors from connecting to or using the broker connection.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConnectorError {
    #[error("Failed to connect to broker at {endpoint} after {attempts} attempts: {last_error}")]
    ConnectionFailed {
        endpoint: String,
        attempts: u32,
        last_error: String,
    },

    #[error("Broker connection is not established")]
    NotConnected,

    #[error(transparent)]
    Broker(#[from] BrokerError),
}

struct Inner {
    state: ConnectionState,
    link: Option<Box<dyn BrokerLink>>,
}

impl Inner {
    fn set_state(&mut self, target: ConnectionState) {
        debug_assert!(
            self.state.can_transition_to(&target),
            "illegal connection state change {} -> {}",
            self.state,
            target
        );
        self.state = target;
    }
}

/// The relay's one connection to the message broker.
pub struct BrokerConnector {
    transport: Arc<dyn BrokerTransport>,
    policy: RetryPolicy,
    inner: Mutex<Inner>,
}

impl BrokerConnector {
    pub fn new(transport: Arc<dyn BrokerTransport>, policy: RetryPolicy) -> Self {
        Self {
            transport,
            policy,
            inner: Mutex::new(Inner {
                state: ConnectionState::Disconnected,
                link: None,
            }),
        }
    }

    /// Current lifecycle state.
    pub async fn state(&self) -> ConnectionState {
        self.inner.lock().await.state
    }

    pub async fn is_connected(&self) -> bool {
        self.state().await.is_connected()
    }

    pub fn policy(&self) -> &RetryPolicy {
        &self.policy
    }

    pub fn endpoint(&self) -> String {
        self.transport.endpoint()
    }

    /// Connect, retrying up to the policy's attempt bound.
    ///
    /// Sleeps `policy.delay` between attempts, never after the last one.
    /// Does nothing if already connected.
    ///
    /// # Errors
    ///
    /// `ConnectionFailed` once every attempt has failed; the connector is
    /// left `Disconnected`.
    pub async fn connect(&self) -> Result<(), ConnectorError> {
        let mut inner = self.inner.lock().await;
        if inner.state.is_connected() {
            return Ok(());
        }
        // A connect future dropped mid-handshake leaves this behind.
        if inner.state == ConnectionState::Connecting {
            inner.set_state(ConnectionState::Disconnected);
        }

        let endpoint = self.transport.endpoint();
        let mut attempt = 1;

        loop {
            inner.set_state(ConnectionState::Connecting);
            tracing::info!(
                endpoint = %endpoint,
                attempt,
                max_attempts = self.policy.max_attempts,
                "Connecting to broker"
            );

            match self.try_connect().await {
                Ok(link) => {
                    inner.link = Some(link);
                    inner.set_state(ConnectionState::Connected);
                    tracing::info!(endpoint = %endpoint, attempt, "Connected to broker");
                    return Ok(());
                }
                Err(e) => {
                    inner.set_state(ConnectionState::Disconnected);

                    if !self.policy.has_next(attempt) {
                        tracing::error!(
                            endpoint = %endpoint,
                            attempts = attempt,
                            error = %e,
                            "Giving up connecting to broker"
                        );
                        return Err(ConnectorError::ConnectionFailed {
                            endpoint,
                            attempts: attempt,
                            last_error: e.to_string(),
                        });
                    }

                    tracing::warn!(
                        endpoint = %endpoint,
                        attempt,
                        error = %e,
                        retry_in = ?self.policy.delay,
                        "Broker connection attempt failed"
                    );
                    tokio::time::sleep(self.policy.delay).await;
                    attempt += 1;
                }
            }
        }
    }

    async fn try_connect(&self) -> Result<Box<dyn BrokerLink>, BrokerError> {
        match tokio::time::timeout(self.policy.attempt_timeout, self.transport.open()).await {
            Ok(result) => result,
            Err(_) => Err(BrokerError::Connect(format!(
                "handshake timed out after {:?}",
                self.policy.attempt_timeout
            ))),
        }
    }

    /// Subscribe to one topic on the live connection.
    ///
    /// # Errors
    ///
    /// `NotConnected` unless the connector is `Connected`; otherwise the
    /// broker's own subscribe error.
    pub async fn subscribe(
        &self,
        topic: &str,
        capacity: usize,
    ) -> Result<Subscription, ConnectorError> {
        let inner = self.inner.lock().await;
        match (&inner.state, &inner.link) {
            (ConnectionState::Connected, Some(link)) => {
                Ok(link.subscribe(topic, capacity).await?)
            }
            _ => Err(ConnectorError::NotConnected),
        }
    }

    /// Record that the live connection has failed.
    ///
    /// Releases the link so the next `connect` starts fresh.
    pub async fn mark_disconnected(&self) {
        let mut inner = self.inner.lock().await;
        if let Some(link) = inner.link.take() {
            if let Err(e) = link.close().await {
                tracing::debug!(error = %e, "Error releasing failed broker link");
            }
        }
        if inner.state != ConnectionState::Disconnected {
            inner.set_state(ConnectionState::Disconnected);
            tracing::warn!(endpoint = %self.transport.endpoint(), "Broker connection lost");
        }
    }

    /// Close the connection. Safe to call more than once.
    pub async fn close(&self) -> Result<(), ConnectorError> {
        let mut inner = self.inner.lock().await;
        let link = inner.link.take();
        if inner.state != ConnectionState::Disconnected {
            inner.set_state(ConnectionState::Disconnected);
        }
        if let Some(link) = link {
            link.close().await?;
            tracing::info!(endpoint = %self.transport.endpoint(), "Broker connection closed");
        }
        Ok(())
    }
}
