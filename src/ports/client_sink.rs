//! ClientSink port - Outbound half of a real-time client connection.
//!
//! The client registry only ever needs to push text to a client. Keeping
//! that behind a trait lets the registry be exercised without sockets.

use std::time::Duration;

use async_trait::async_trait;
use thiserror::Error;

/// Reasons a send to one client failed.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ClientSendError {
    /// The peer already closed the connection.
    #[error("Client connection closed")]
    Closed,

    /// The transport reported an error.
    #[error("Client transport error: {0}")]
    Transport(String),

    /// The send did not complete within the configured window.
    #[error("Client send timed out after {0:?}")]
    TimedOut(Duration),
}

/// Port for pushing notification text to one connected client.
#[async_trait]
pub trait ClientSink: Send + Sync {
    /// Send one text frame.
    async fn send_text(&self, text: &str) -> Result<(), ClientSendError>;

    /// Called once the registry has dropped this client after a failed send.
    ///
    /// Connection-backed sinks use it to close the underlying connection.
    fn evict(&self) {}
}
