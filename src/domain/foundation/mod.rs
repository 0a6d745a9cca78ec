//! Foundation module - Shared domain primitives.
//!
//! Contains identifiers, timestamps, the state machine contract and
//! validation errors used throughout the relay domain.

mod errors;
mod ids;
mod state_machine;
mod timestamp;

pub use errors::ValidationError;
pub use ids::ClientId;
pub use state_machine::StateMachine;
pub use timestamp::Timestamp;
