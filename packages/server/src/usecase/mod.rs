//! UseCase 層
//!
//! - `AdmitConnectionUseCase`: 接続の受付と受信ループ
//! - `BroadcastEngine`: 受信メッセージを送信者以外の全接続へ配信
//! - `LivenessProber`: 一定間隔で全接続へ ping を送信

mod admit_connection;
mod broadcast;
mod delivery;
mod liveness_probe;
mod queue;

#[cfg(test)]
mod testing;

pub use admit_connection::{AdmitConnectionUseCase, Departure};
pub use broadcast::{BroadcastEngine, BroadcastReport};
pub use liveness_probe::{DEFAULT_PROBE_INTERVAL, LivenessProber};
pub use queue::{BroadcastQueue, Outbox, QueueMode, broadcast_queue};
