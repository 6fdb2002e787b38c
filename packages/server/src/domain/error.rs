//! Domain error types.

use thiserror::Error;

/// A write to a single connection failed.
///
/// Delivery failures are local: the failing connection is pruned and nobody
/// else is told.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DeliveryError {
    #[error("connection is closed")]
    Closed,

    #[error("transport error: {0}")]
    Transport(String),
}

/// The broadcast queue has no consumer any more.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("broadcast queue is closed")]
pub struct QueueClosed;
