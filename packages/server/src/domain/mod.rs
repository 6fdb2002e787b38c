//! Domain 層
//!
//! リレーの中核となる型を定義します。
//!
//! - `ConnectionId` / `Connection`: 接続の識別子と送信側の抽象
//! - `Payload` / `Frame` / `Inbound` / `Envelope`: 接続上を流れるメッセージ
//! - `ConnectionRegistry`: ブロードキャスト・プローブ対象となる接続の集合
//!
//! Transport（WebSocket）の具体的な実装は Infrastructure 層が提供します。

pub mod connection;
pub mod error;
pub mod message;
pub mod registry;

pub use connection::{Connection, ConnectionId};
pub use error::{DeliveryError, QueueClosed};
pub use message::{Envelope, Frame, Inbound, Payload};
pub use registry::{ConnectionRegistry, Visit};

#[cfg(test)]
pub use connection::MockConnection;
