//! HTTP surface: the welcome route, the WebSocket route, and the server.

mod routes;
mod server;

pub use routes::{app_router, root_handler, WELCOME_MESSAGE};
pub use server::serve;
