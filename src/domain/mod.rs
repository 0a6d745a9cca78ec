//! Domain layer containing the relay's core types.
//!
//! # Module Organization
//!
//! - `foundation` - Shared primitives (IDs, timestamps, state machine, errors)
//! - `broker` - Broker connection lifecycle and retry policy
//! - `notification` - Rendered notifications, delivery channels, topic set

pub mod broker;
pub mod foundation;
pub mod notification;
