//! Client sink over the write half of an axum WebSocket.

use std::time::Duration;

use async_trait::async_trait;
use axum::extract::ws::{Message, WebSocket};
use futures::stream::SplitSink;
use futures::SinkExt;
use tokio::sync::{Mutex, Notify};

use crate::ports::{ClientSendError, ClientSink};

/// Sends notification text as WebSocket text frames.
///
/// The write half is behind a mutex so concurrent broadcasts and replays
/// never interleave frames on one socket. Eviction by the registry is
/// signalled to the connection task through [`WebSocketSink::evicted`].
pub struct WebSocketSink {
    sender: Mutex<SplitSink<WebSocket, Message>>,
    evicted: Notify,
}

impl WebSocketSink {
    pub fn new(sender: SplitSink<WebSocket, Message>) -> Self {
        Self {
            sender: Mutex::new(sender),
            evicted: Notify::new(),
        }
    }

    /// Resolves once the registry has evicted this client.
    ///
    /// An eviction that happened before the call is not lost.
    pub async fn evicted(&self) {
        self.evicted.notified().await;
    }

    /// Send a close frame, giving up after `within`.
    ///
    /// The peer may be gone or not reading, so failure is only logged.
    pub async fn close(&self, within: Duration) {
        let result = tokio::time::timeout(within, async {
            let mut sender = self.sender.lock().await;
            sender.send(Message::Close(None)).await
        })
        .await;

        match result {
            Ok(Ok(())) => {}
            Ok(Err(e)) => tracing::debug!(error = %e, "Close frame not sent"),
            Err(_) => tracing::debug!(timeout = ?within, "Close frame timed out"),
        }
    }
}

#[async_trait]
impl ClientSink for WebSocketSink {
    async fn send_text(&self, text: &str) -> Result<(), ClientSendError> {
        let mut sender = self.sender.lock().await;
        sender
            .send(Message::Text(text.to_string()))
            .await
            .map_err(|e| ClientSendError::Transport(e.to_string()))
    }

    fn evict(&self) {
        self.evicted.notify_one();
    }
}
