//! Adapters - Implementations of port interfaces.
//!
//! Adapters connect the relay to external systems:
//! - `broker` - Broker transports (Redis pub/sub, in-memory)
//! - `client` - In-memory client sink for tests
//! - `email` - Email sender implementations
//! - `http` - Router and server
//! - `websocket` - Real-time client endpoint

pub mod broker;
pub mod client;
pub mod email;
pub mod http;
pub mod websocket;

pub use broker::{InMemoryBroker, RedisBroker};
pub use client::{ClientBehavior, InMemoryClient};
pub use email::LoggingEmailSender;
pub use websocket::{WebSocketSink, WebSocketState};
