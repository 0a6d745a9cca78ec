//! Application layer - the relay's moving parts.
//!
//! - `BrokerConnector` - Bounded-retry connection to the broker
//! - `SubscriptionManager` - Topic subscriptions and per-topic dispatch loops
//! - `NotificationDispatcher` - Renders and routes to in-app or email
//! - `ClientRegistry` - Connected clients, broadcast, missed replay
//! - `MissedNotificationBuffer` - Backlog held while nobody is connected
//! - `NotificationRelay` - Supervisor tying the above together

mod broker_connector;
mod client_registry;
mod dispatcher;
mod missed_notifications;
mod relay;
mod subscription_manager;

pub use broker_connector::{BrokerConnector, ConnectorError};
pub use client_registry::{
    BroadcastReport, ClientRegistry, Delivery, ReplayError, DEFAULT_SEND_TIMEOUT,
};
pub use dispatcher::{DispatchOutcome, NotificationDispatcher};
pub use missed_notifications::MissedNotificationBuffer;
pub use relay::{NotificationRelay, RelayError};
pub use subscription_manager::{
    ActiveSubscriptions, SubscriptionManager, DEFAULT_SUBSCRIPTION_CAPACITY,
};
