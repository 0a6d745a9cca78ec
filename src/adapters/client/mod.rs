//! Client sink adapters.
//!
//! - `InMemoryClient` - Recording client with injectable failures for tests

mod in_memory;

pub use in_memory::{ClientBehavior, InMemoryClient};
