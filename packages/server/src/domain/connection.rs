//! Connection identity and the write-side abstraction over a transport.

use std::fmt;

use async_trait::async_trait;
use uuid::Uuid;

use super::{DeliveryError, Frame};

/// Unique identity of one live connection. Used as the registry key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ConnectionId(Uuid);

impl ConnectionId {
    /// Generate a fresh random identity.
    pub fn generate() -> Self {
        Self(Uuid::new_v4())
    }

    pub fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl From<Uuid> for ConnectionId {
    fn from(value: Uuid) -> Self {
        Self(value)
    }
}

impl fmt::Display for ConnectionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// Write side of a duplex connection to one remote peer.
///
/// The read side is owned by the admission reader loop and is not part of
/// this trait. Implementations must tolerate `close()` being called more than
/// once, but the core only calls it from whoever removed the connection from
/// the registry.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait Connection: Send + Sync {
    /// Registry key of this connection.
    fn id(&self) -> ConnectionId;

    /// Write one frame. A failure is terminal for the connection.
    async fn send(&self, frame: Frame) -> Result<(), DeliveryError>;

    /// Close the underlying handle.
    async fn close(&self);
}
