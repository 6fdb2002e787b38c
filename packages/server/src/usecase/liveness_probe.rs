//! Liveness Prober
//!
//! 一定間隔で全ての登録済み接続へ空の ping を送信します。
//! 送信に失敗した接続はブロードキャストの失敗時と同じく close・登録解除されます。
//! pong の受信は確認しないため、書き込みは受け付けるが応答しない接続は
//! この仕組みだけでは検出されません。

use std::{sync::Arc, time::Duration};

use tokio::time::{Instant, MissedTickBehavior};

use crate::domain::{ConnectionId, ConnectionRegistry, Frame};

use super::delivery::write_or_evict;

/// Default period between two probe rounds.
pub const DEFAULT_PROBE_INTERVAL: Duration = Duration::from_secs(30);

/// Periodic keep-alive task.
pub struct LivenessProber {
    registry: Arc<ConnectionRegistry>,
    interval: Duration,
}

impl LivenessProber {
    pub fn new(registry: Arc<ConnectionRegistry>, interval: Duration) -> Self {
        Self { registry, interval }
    }

    /// Probe every `interval`, forever. The first round runs one full interval
    /// after start.
    pub async fn run(self) {
        tracing::info!("Liveness prober started (interval: {:?})", self.interval);
        let mut ticker = tokio::time::interval_at(Instant::now() + self.interval, self.interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        loop {
            ticker.tick().await;
            self.probe().await;
        }
    }

    /// Send one ping to every registered connection.
    ///
    /// Returns the ids of the connections pruned in this round.
    pub async fn probe(&self) -> Vec<ConnectionId> {
        let pruned = self
            .registry
            .for_each(|connection| write_or_evict(connection, Frame::Ping, "ping"))
            .await;
        if pruned.is_empty() {
            tracing::trace!("Probe round finished");
        } else {
            tracing::info!("Probe round pruned {} connection(s)", pruned.len());
        }
        pruned
    }
}
