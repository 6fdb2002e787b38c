//! Queue between the per-connection reader loops and the broadcast engine.
//!
//! Many producers (one per connection), one consumer. The queue is either
//! unbounded or bounded; a full bounded queue makes producers wait.

use tokio::sync::mpsc;

use crate::domain::{Envelope, QueueClosed};

/// Capacity policy of the broadcast queue.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum QueueMode {
    #[default]
    Unbounded,
    /// At most `n` envelopes are buffered; producers wait for room.
    Bounded(usize),
}

/// Producer handle. Cloned into every reader loop.
#[derive(Clone)]
pub struct Outbox {
    sender: OutboxSender,
}

#[derive(Clone)]
enum OutboxSender {
    Unbounded(mpsc::UnboundedSender<Envelope>),
    Bounded(mpsc::Sender<Envelope>),
}

impl Outbox {
    /// Hand an envelope to the broadcast engine.
    ///
    /// Waits for room when the queue is bounded and full.
    pub async fn submit(&self, envelope: Envelope) -> Result<(), QueueClosed> {
        match &self.sender {
            OutboxSender::Unbounded(sender) => sender.send(envelope).map_err(|_| QueueClosed),
            OutboxSender::Bounded(sender) => sender.send(envelope).await.map_err(|_| QueueClosed),
        }
    }
}

/// Consumer side, owned by the broadcast engine.
pub enum BroadcastQueue {
    Unbounded(mpsc::UnboundedReceiver<Envelope>),
    Bounded(mpsc::Receiver<Envelope>),
}

impl BroadcastQueue {
    /// Wait for the next envelope. `None` once every `Outbox` is dropped.
    pub async fn recv(&mut self) -> Option<Envelope> {
        match self {
            BroadcastQueue::Unbounded(receiver) => receiver.recv().await,
            BroadcastQueue::Bounded(receiver) => receiver.recv().await,
        }
    }
}

/// Create a connected `Outbox` / `BroadcastQueue` pair.
///
/// # Panics
///
/// Panics if `mode` is `QueueMode::Bounded(0)`. `ServerConfig` rejects that value.
pub fn broadcast_queue(mode: QueueMode) -> (Outbox, BroadcastQueue) {
    match mode {
        QueueMode::Unbounded => {
            let (sender, receiver) = mpsc::unbounded_channel();
            (
                Outbox {
                    sender: OutboxSender::Unbounded(sender),
                },
                BroadcastQueue::Unbounded(receiver),
            )
        }
        QueueMode::Bounded(capacity) => {
            let (sender, receiver) = mpsc::channel(capacity);
            (
                Outbox {
                    sender: OutboxSender::Bounded(sender),
                },
                BroadcastQueue::Bounded(receiver),
            )
        }
    }
}
