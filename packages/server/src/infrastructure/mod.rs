//! Infrastructure 層
//!
//! - `websocket`: axum の WebSocket を使った `Connection` 実装
//! - `dto`: HTTP レスポンスの DTO

pub mod dto;
pub mod websocket;

pub use websocket::WsConnection;
