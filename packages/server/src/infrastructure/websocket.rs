//! WebSocket を使った Connection 実装
//!
//! ## 責務
//!
//! - WebSocket を送信側（`WsConnection`）と受信側（`Inbound` のストリーム）に分割する
//! - `Frame` を axum の `Message` に変換して書き込む
//! - close 時に受信側のストリームも終了させる
//!
//! 送信側は `Mutex` で保護され、Broadcast Engine・Liveness Prober・受付処理の
//! いずれからも書き込まれます。

use std::sync::{
    Arc,
    atomic::{AtomicBool, Ordering},
};

use async_trait::async_trait;
use axum::{
    body::Bytes,
    extract::ws::{Message, WebSocket},
};
use futures_util::{
    Stream,
    sink::SinkExt,
    stream::{SplitSink, StreamExt},
};
use tokio::sync::{Mutex, Notify};

use crate::domain::{Connection, ConnectionId, DeliveryError, Frame, Inbound, Payload};

/// Write side of an upgraded WebSocket.
pub struct WsConnection {
    id: ConnectionId,
    sender: Mutex<SplitSink<WebSocket, Message>>,
    closed: AtomicBool,
    /// Wakes the read side once the connection is closed.
    shutdown: Arc<Notify>,
}

impl WsConnection {
    /// Split an upgraded socket into its write handle and its inbound stream.
    ///
    /// The stream ends after the handle is closed, so a reader loop blocked on
    /// a pruned connection returns promptly.
    pub fn split(
        socket: WebSocket,
    ) -> (
        Arc<Self>,
        impl Stream<Item = Result<Inbound, axum::Error>> + Send + Unpin + 'static,
    ) {
        let (sender, receiver) = socket.split();
        let shutdown = Arc::new(Notify::new());

        let connection = Arc::new(Self {
            id: ConnectionId::generate(),
            sender: Mutex::new(sender),
            closed: AtomicBool::new(false),
            shutdown: shutdown.clone(),
        });

        let closed = Box::pin(async move { shutdown.notified().await });
        let inbound = receiver
            .map(|message| message.map(to_inbound))
            .take_until(closed);

        (connection, inbound)
    }

    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::Acquire)
    }
}

#[async_trait]
impl Connection for WsConnection {
    fn id(&self) -> ConnectionId {
        self.id
    }

    async fn send(&self, frame: Frame) -> Result<(), DeliveryError> {
        if self.is_closed() {
            return Err(DeliveryError::Closed);
        }
        let mut sender = self.sender.lock().await;
        sender
            .send(to_message(frame))
            .await
            .map_err(|e| DeliveryError::Transport(e.to_string()))
    }

    async fn close(&self) {
        if self.closed.swap(true, Ordering::AcqRel) {
            return;
        }
        let mut sender = self.sender.lock().await;
        if let Err(e) = sender.close().await {
            tracing::debug!("Error while closing connection '{}': {}", self.id, e);
        }
        self.shutdown.notify_one();
    }
}

/// Convert an outbound frame to a WebSocket message.
pub fn to_message(frame: Frame) -> Message {
    match frame {
        Frame::Message(Payload::Text(text)) => Message::Text(text.into()),
        Frame::Message(Payload::Binary(bytes)) => Message::Binary(bytes.into()),
        Frame::Ping => Message::Ping(Bytes::new()),
    }
}

/// Convert a received WebSocket message to what the reader loop sees.
pub fn to_inbound(message: Message) -> Inbound {
    match message {
        Message::Text(text) => Inbound::Message(Payload::Text(text.as_str().to_owned())),
        Message::Binary(bytes) => Inbound::Message(Payload::Binary(bytes.to_vec())),
        Message::Close(_) => Inbound::Close,
        Message::Ping(_) | Message::Pong(_) => Inbound::Control,
    }
}
