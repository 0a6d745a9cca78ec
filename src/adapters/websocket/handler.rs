//! WebSocket upgrade handler for real-time notification clients.
//!
//! Handles the HTTP → WebSocket upgrade and manages the connection lifecycle:
//! 1. Upgrade to WebSocket
//! 2. Register with the client registry and receive any missed notifications
//! 3. Read (and discard) inbound frames until the peer goes away or the
//!    registry evicts the client after a failed send
//! 4. Close and unregister
//!
//! Clients are receive-only. Inbound text is logged at trace level and
//! otherwise ignored.

use std::net::SocketAddr;
use std::sync::Arc;

use axum::{
    extract::{
        ws::{Message, WebSocket, WebSocketUpgrade},
        ConnectInfo, State,
    },
    response::Response,
};
use futures::StreamExt;

use crate::application::ClientRegistry;
use crate::domain::foundation::ClientId;

use super::sink::WebSocketSink;

/// State required for WebSocket handling.
#[derive(Clone)]
pub struct WebSocketState {
    /// Registry every accepted socket joins.
    pub registry: Arc<ClientRegistry>,
}

impl WebSocketState {
    pub fn new(registry: Arc<ClientRegistry>) -> Self {
        Self { registry }
    }
}

/// Handle WebSocket upgrade requests.
///
/// Route: `GET /ws`
pub async fn ws_handler(
    ws: WebSocketUpgrade,
    ConnectInfo(peer): ConnectInfo<SocketAddr>,
    State(state): State<WebSocketState>,
) -> Response {
    ws.on_upgrade(move |socket| handle_socket(socket, peer, state))
}

/// Run one client connection from registration to cleanup.
///
/// Ends when the peer closes, a read fails, or the registry evicts the
/// client after a failed send. Both socket halves are dropped on return.
async fn handle_socket(socket: WebSocket, peer: SocketAddr, state: WebSocketState) {
    let (sender, mut receiver) = socket.split();
    let sink = Arc::new(WebSocketSink::new(sender));
    let client_id = ClientId::new();
    let close_within = state.registry.send_timeout();

    tracing::info!(client_id = %client_id, peer = %peer, "Client connected");

    if let Err(e) = state
        .registry
        .register_with_replay(client_id, sink.clone())
        .await
    {
        tracing::warn!(client_id = %client_id, error = %e, "Dropping client after failed replay");
        sink.close(close_within).await;
        return;
    }

    loop {
        let result = tokio::select! {
            _ = sink.evicted() => {
                tracing::info!(client_id = %client_id, "Client evicted after failed send");
                sink.close(close_within).await;
                break;
            }
            result = receiver.next() => result,
        };

        match result {
            Some(Ok(Message::Text(text))) => {
                tracing::trace!(
                    client_id = %client_id,
                    len = text.len(),
                    "Ignoring client text frame"
                );
            }
            Some(Ok(Message::Binary(_))) => {
                tracing::trace!(client_id = %client_id, "Ignoring client binary frame");
            }
            Some(Ok(Message::Ping(_))) | Some(Ok(Message::Pong(_))) => {
                // Answered by axum
            }
            Some(Ok(Message::Close(_))) | None => {
                tracing::debug!(client_id = %client_id, "Client closed connection");
                break;
            }
            Some(Err(e)) => {
                tracing::debug!(client_id = %client_id, error = %e, "Receive error");
                break;
            }
        }
    }

    state.registry.unregister(&client_id).await;
    tracing::info!(client_id = %client_id, peer = %peer, "Client disconnected");
}

/// Create axum router for the WebSocket endpoint.
///
/// # Example
///
/// ```ignore
/// let app = Router::new()
///     .merge(websocket_router().with_state(WebSocketState::new(registry)));
/// ```
pub fn websocket_router() -> axum::Router<WebSocketState> {
    use axum::routing::get;

    axum::Router::new().route("/ws", get(ws_handler))
}
