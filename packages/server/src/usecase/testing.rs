//! In-memory connection used by the usecase tests.

use std::sync::{
    Arc, Mutex,
    atomic::{AtomicBool, AtomicUsize, Ordering},
};

use async_trait::async_trait;

use crate::domain::{Connection, ConnectionId, DeliveryError, Frame, Payload};

/// Records every frame written to it. Can be switched to fail all writes.
pub(crate) struct RecordingConnection {
    id: ConnectionId,
    frames: Mutex<Vec<Frame>>,
    failing: AtomicBool,
    closes: AtomicUsize,
}

impl RecordingConnection {
    pub(crate) fn new() -> Arc<Self> {
        Arc::new(Self {
            id: ConnectionId::generate(),
            frames: Mutex::new(Vec::new()),
            failing: AtomicBool::new(false),
            closes: AtomicUsize::new(0),
        })
    }

    pub(crate) fn failing() -> Arc<Self> {
        let connection = Self::new();
        connection.fail_writes();
        connection
    }

    pub(crate) fn fail_writes(&self) {
        self.failing.store(true, Ordering::SeqCst);
    }

    pub(crate) fn frames(&self) -> Vec<Frame> {
        self.frames.lock().unwrap().clone()
    }

    /// Payloads of the relayed messages, pings excluded.
    pub(crate) fn payloads(&self) -> Vec<Payload> {
        self.frames()
            .into_iter()
            .filter_map(|frame| match frame {
                Frame::Message(payload) => Some(payload),
                Frame::Ping => None,
            })
            .collect()
    }

    pub(crate) fn close_count(&self) -> usize {
        self.closes.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Connection for RecordingConnection {
    fn id(&self) -> ConnectionId {
        self.id
    }

    async fn send(&self, frame: Frame) -> Result<(), DeliveryError> {
        if self.failing.load(Ordering::SeqCst) || self.close_count() > 0 {
            return Err(DeliveryError::Closed);
        }
        self.frames.lock().unwrap().push(frame);
        Ok(())
    }

    async fn close(&self) {
        self.closes.fetch_add(1, Ordering::SeqCst);
    }
}
