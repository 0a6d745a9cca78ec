//! Email sender adapters.
//!
//! - `LoggingEmailSender` - Records outbound email notifications in the log

mod log_sender;

pub use log_sender::LoggingEmailSender;
