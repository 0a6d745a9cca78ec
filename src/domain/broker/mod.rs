//! Broker connection domain - connection lifecycle and retry policy.

mod connection_state;
mod retry_policy;

pub use connection_state::ConnectionState;
pub use retry_policy::RetryPolicy;
