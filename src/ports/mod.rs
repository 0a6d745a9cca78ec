//! Ports - Interfaces for external dependencies.
//!
//! Following hexagonal architecture, ports define the contracts between
//! the relay and the outside world. Adapters implement these ports.
//!
//! - `BrokerTransport` / `BrokerLink` - Physical broker connection and subscriptions
//! - `ClientSink` - Outbound half of one real-time client connection
//! - `EmailSender` - External email delivery collaborator

mod broker_transport;
mod client_sink;
mod email_sender;

pub use broker_transport::{BrokerError, BrokerLink, BrokerMessage, BrokerTransport, Subscription};
pub use client_sink::{ClientSendError, ClientSink};
pub use email_sender::{EmailError, EmailSender};
