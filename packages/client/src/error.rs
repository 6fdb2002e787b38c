//! Error types for the relay client.

use thiserror::Error;

/// Client-specific errors
#[derive(Debug, Error)]
pub enum ClientError {
    /// Connection error
    #[error("Connection error: {0}")]
    ConnectionError(String),

    /// Gave up reconnecting
    #[error("Failed to reconnect after {0} attempts")]
    ReconnectExhausted(u32),
}
