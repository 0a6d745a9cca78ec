//! WebSocket adapters for real-time notification delivery.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────┐
//! │                    NotificationDispatcher                            │
//! │   - Renders "[topic] payload"                                       │
//! │   - Broadcasts, or buffers when nobody is connected                 │
//! └─────────────────────────────────────────────────────────────────────┘
//!                                     │
//!                                     │ deliver
//!                                     ▼
//! ┌─────────────────────────────────────────────────────────────────────┐
//! │                      ClientRegistry                                  │
//! │   ├── client-a (WebSocketSink)                                       │
//! │   ├── client-b (WebSocketSink)                                       │
//! │   └── missed-notification buffer                                     │
//! └─────────────────────────────────────────────────────────────────────┘
//!                                     ▲
//!                                     │ register_with_replay / unregister
//! ┌─────────────────────────────────────────────────────────────────────┐
//! │                      GET /ws (handler)                               │
//! └─────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! # Components
//!
//! - [`handler`] - Axum WebSocket upgrade handler
//! - [`sink`] - `ClientSink` over the socket's write half

pub mod handler;
pub mod sink;

pub use handler::{websocket_router, ws_handler, WebSocketState};
pub use sink::WebSocketSink;
