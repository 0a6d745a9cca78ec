//! Notification Relay
//!
//! Subscribes to a fixed set of marketplace broker topics and fans every
//! event out to connected WebSocket clients as `"[topic] payload"` text.
//! Events that arrive while nobody is connected are held and replayed to
//! the next client that connects.

pub mod adapters;
pub mod application;
pub mod config;
pub mod domain;
pub mod ports;
pub mod telemetry;
