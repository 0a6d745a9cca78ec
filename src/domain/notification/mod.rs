//! Notification domain - what the relay delivers and through which channel.
//!
//! - [`Notification`] - immutable rendered message built from one broker message
//! - [`NotificationChannel`] - configured delivery channel (`in_app`, `email`)
//! - [`RELAY_TOPICS`] - the fixed broker topic set the relay subscribes to

mod channel;
mod message;
mod topics;

pub use channel::{NotificationChannel, UnsupportedChannel};
pub use message::Notification;
pub use topics::RELAY_TOPICS;
