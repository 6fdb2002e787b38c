//! Request handlers.

pub mod http;
pub mod websocket;

pub use http::{debug_connections, health_check, home_page};
pub use websocket::websocket_handler;
