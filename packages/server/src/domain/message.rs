//! Messages flowing through the relay.

use super::ConnectionId;

/// Opaque message body. The frame kind it arrived in is preserved on relay.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Payload {
    Text(String),
    Binary(Vec<u8>),
}

impl Payload {
    pub fn len(&self) -> usize {
        match self {
            Payload::Text(text) => text.len(),
            Payload::Binary(bytes) => bytes.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl From<&str> for Payload {
    fn from(value: &str) -> Self {
        Payload::Text(value.to_string())
    }
}

impl From<String> for Payload {
    fn from(value: String) -> Self {
        Payload::Text(value)
    }
}

impl From<Vec<u8>> for Payload {
    fn from(value: Vec<u8>) -> Self {
        Payload::Binary(value)
    }
}

/// A frame the core writes to a connection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Frame {
    Message(Payload),
    /// Transport-level keep-alive probe with an empty payload.
    Ping,
}

/// What the reader loop observes on a connection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Inbound {
    Message(Payload),
    /// The peer asked to close.
    Close,
    /// Ping / pong frames. The transport answers pings itself.
    Control,
}

/// A received message tagged with its sender, queued for broadcast.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Envelope {
    sender: ConnectionId,
    payload: Payload,
}

impl Envelope {
    pub fn new(sender: ConnectionId, payload: Payload) -> Self {
        Self { sender, payload }
    }

    pub fn sender(&self) -> ConnectionId {
        self.sender
    }

    pub fn payload(&self) -> &Payload {
        &self.payload
    }
}
