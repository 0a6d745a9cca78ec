//! Broker transport adapters.
//!
//! - `RedisBroker` - Redis pub/sub for production
//! - `InMemoryBroker` - In-process broker with fault injection for tests

mod in_memory;
mod redis;

pub use self::in_memory::InMemoryBroker;
pub use self::redis::RedisBroker;
