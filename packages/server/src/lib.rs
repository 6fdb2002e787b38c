//! WebSocket broadcast relay.
//!
//! Every message a client sends is forwarded to all other connected clients.
//! The core is the connection registry and the broadcast fan-out engine; the
//! HTTP layer only calls the admission entry point.

// layers
pub mod domain;
pub mod infrastructure;
pub mod ui;
pub mod usecase;

pub mod config;
pub mod error;
