//! Broadcast Engine
//!
//! キューからエンベロープを 1 件ずつ取り出し、送信者以外の全ての登録済み接続へ
//! 書き込みます。2 件のエンベロープを同時に配信することはありません。
//! 書き込みに失敗した接続はその場で close され、Registry から取り除かれます。

use std::sync::Arc;

use crate::domain::{ConnectionId, ConnectionRegistry, Envelope, Frame};

use super::{delivery::write_or_evict, queue::BroadcastQueue};

/// Result of relaying one envelope.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BroadcastReport {
    /// Recipients that accepted the write.
    pub delivered: usize,
    /// Recipients that failed and were pruned.
    pub pruned: Vec<ConnectionId>,
}

/// Single consumer of the broadcast queue.
pub struct BroadcastEngine {
    registry: Arc<ConnectionRegistry>,
    queue: BroadcastQueue,
}

impl BroadcastEngine {
    pub fn new(registry: Arc<ConnectionRegistry>, queue: BroadcastQueue) -> Self {
        Self { registry, queue }
    }

    /// Relay envelopes until every `Outbox` has been dropped.
    ///
    /// In the server this runs for the lifetime of the process.
    pub async fn run(mut self) {
        tracing::info!("Broadcast engine started");
        while let Some(envelope) = self.queue.recv().await {
            self.deliver(&envelope).await;
        }
        tracing::info!("Broadcast queue closed, engine stopped");
    }

    /// Write one envelope to every registered connection except its sender.
    pub async fn deliver(&self, envelope: &Envelope) -> BroadcastReport {
        let sender = envelope.sender();
        let frame = Frame::Message(envelope.payload().clone());

        let mut attempted = 0;
        let pruned = self
            .registry
            .for_each_except(&sender, |connection| {
                attempted += 1;
                write_or_evict(connection, frame.clone(), "broadcast")
            })
            .await;

        let report = BroadcastReport {
            delivered: attempted - pruned.len(),
            pruned,
        };
        tracing::debug!(
            "Relayed {} bytes from '{}' to {} connection(s), pruned {}",
            envelope.payload().len(),
            sender,
            report.delivered,
            report.pruned.len()
        );
        report
    }
}
