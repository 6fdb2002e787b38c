//! UseCase: 接続の受付と受信ループ
//!
//! 1. 接続を Registry に登録する
//! 2. ウェルカムメッセージを送信する
//! 3. 受信したメッセージを Envelope として Broadcast Engine のキューへ渡し続ける
//! 4. 受信に失敗した（相手が切断した）らループを抜ける
//! 5. どの経路で抜けた場合も、登録解除と close を 1 回だけ行う
//!
//! ウェルカムメッセージの送信失敗は切断済みの接続と同じ扱いとし、受信ループには入らず
//! 登録解除して close します。

use std::{fmt, sync::Arc};

use futures_util::{Stream, StreamExt};

use crate::domain::{
    Connection, ConnectionId, ConnectionRegistry, Envelope, Frame, Inbound, Payload,
};

use super::queue::Outbox;

/// Why a connection's reader loop ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Departure {
    /// Another live connection already uses this id. Nothing was registered.
    AlreadyRegistered,
    /// The welcome message could not be written.
    WelcomeFailed(String),
    /// The peer sent a close frame.
    PeerClosed,
    /// The inbound stream ended, either remotely or because the connection was
    /// pruned by a failed broadcast or probe write.
    StreamEnded,
    /// Reading from the connection failed.
    ReadFailed(String),
    /// The broadcast engine is gone (server shutting down).
    QueueClosed,
}

impl fmt::Display for Departure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Departure::AlreadyRegistered => write!(f, "connection id already registered"),
            Departure::WelcomeFailed(e) => write!(f, "failed to send welcome message: {}", e),
            Departure::PeerClosed => write!(f, "peer closed the connection"),
            Departure::StreamEnded => write!(f, "inbound stream ended"),
            Departure::ReadFailed(e) => write!(f, "read error: {}", e),
            Departure::QueueClosed => write!(f, "broadcast queue closed"),
        }
    }
}

/// Admission & reader loop for one connection at a time.
pub struct AdmitConnectionUseCase {
    registry: Arc<ConnectionRegistry>,
    outbox: Outbox,
    welcome: Payload,
}

impl AdmitConnectionUseCase {
    pub fn new(
        registry: Arc<ConnectionRegistry>,
        outbox: Outbox,
        welcome: impl Into<Payload>,
    ) -> Self {
        Self {
            registry,
            outbox,
            welcome: welcome.into(),
        }
    }

    /// Serve `connection` until it fails, then deregister and close it.
    ///
    /// `inbound` is the read side of the same connection.
    pub async fn execute<S, E>(&self, connection: Arc<dyn Connection>, inbound: S) -> Departure
    where
        S: Stream<Item = Result<Inbound, E>> + Unpin,
        E: fmt::Display,
    {
        let id = connection.id();
        if !self.registry.add(connection.clone()).await {
            tracing::warn!("Connection '{}' is already registered. Rejecting it.", id);
            connection.close().await;
            return Departure::AlreadyRegistered;
        }
        tracing::info!("Connection '{}' admitted", id);

        let departure = self.serve(connection.as_ref(), inbound).await;
        self.release(id).await;
        tracing::info!("Connection '{}' disconnected: {}", id, departure);
        departure
    }

    async fn serve<S, E>(&self, connection: &dyn Connection, mut inbound: S) -> Departure
    where
        S: Stream<Item = Result<Inbound, E>> + Unpin,
        E: fmt::Display,
    {
        let id = connection.id();
        if let Err(e) = connection.send(Frame::Message(self.welcome.clone())).await {
            tracing::error!("Failed to send welcome message to '{}': {}", id, e);
            return Departure::WelcomeFailed(e.to_string());
        }

        loop {
            match inbound.next().await {
                Some(Ok(Inbound::Message(payload))) => {
                    tracing::debug!("Received {} bytes from '{}'", payload.len(), id);
                    if self.outbox.submit(Envelope::new(id, payload)).await.is_err() {
                        tracing::warn!("Broadcast queue closed, dropping connection '{}'", id);
                        return Departure::QueueClosed;
                    }
                }
                Some(Ok(Inbound::Control)) => {
                    tracing::trace!("Control frame from '{}'", id);
                }
                Some(Ok(Inbound::Close)) => return Departure::PeerClosed,
                Some(Err(e)) => {
                    tracing::warn!("Error reading from '{}': {}", id, e);
                    return Departure::ReadFailed(e.to_string());
                }
                None => return Departure::StreamEnded,
            }
        }
    }

    /// Deregister and close, unless a failed write already did both.
    async fn release(&self, id: ConnectionId) {
        match self.registry.remove(&id).await {
            Some(connection) => connection.close().await,
            None => tracing::debug!("Connection '{}' was already pruned", id),
        }
    }
}

#[cfg(test)]
mod tests {
    use std::{convert::Infallible, time::Duration};

    use futures_util::stream;
    use tokio::sync::mpsc;

    use super::*;
    use crate::{
        domain::MockConnection,
        usecase::{BroadcastQueue, QueueMode, broadcast_queue, testing::RecordingConnection},
    };

    const WELCOME: &str = "Welcome to the WebSocket server!";

    fn setup() -> (Arc<ConnectionRegistry>, AdmitConnectionUseCase, BroadcastQueue) {
        let registry = Arc::new(ConnectionRegistry::new());
        let (outbox, queue) = broadcast_queue(QueueMode::Unbounded);
        let usecase = AdmitConnectionUseCase::new(registry.clone(), outbox, WELCOME);
        (registry, usecase, queue)
    }

    fn inbound(
        items: Vec<Result<Inbound, String>>,
    ) -> impl Stream<Item = Result<Inbound, String>> + Unpin {
        stream::iter(items)
    }

    #[tokio::test]
    async fn test_welcome_is_sent_first() {
        // テスト項目: 受付直後にウェルカムメッセージが 1 回送信される
        // given (前提条件):
        let (_registry, usecase, _queue) = setup();
        let connection = RecordingConnection::new();

        // when (操作):
        usecase.execute(connection.clone(), inbound(vec![])).await;

        // then (期待する結果):
        assert_eq!(connection.payloads(), vec![Payload::from(WELCOME)]);
    }

    #[tokio::test]
    async fn test_received_messages_are_queued_in_order_with_sender() {
        // テスト項目: 受信メッセージが送信者付きの Envelope として受信順にキューへ渡される
        // given (前提条件):
        let (_registry, usecase, mut queue) = setup();
        let connection = RecordingConnection::new();
        let items = vec![
            Ok(Inbound::Message(Payload::from("m1"))),
            Ok(Inbound::Control),
            Ok(Inbound::Message(Payload::Binary(vec![0xff]))),
        ];

        // when (操作):
        let departure = usecase.execute(connection.clone(), inbound(items)).await;

        // then (期待する結果):
        assert_eq!(departure, Departure::StreamEnded);
        assert_eq!(
            queue.recv().await,
            Some(Envelope::new(connection.id(), Payload::from("m1")))
        );
        assert_eq!(
            queue.recv().await,
            Some(Envelope::new(connection.id(), Payload::Binary(vec![0xff])))
        );
    }

    #[tokio::test]
    async fn test_read_error_deregisters_and_closes() {
        // テスト項目: 受信エラーでループを抜け、登録解除と close が 1 回行われる
        // given (前提条件):
        let (registry, usecase, mut queue) = setup();
        let connection = RecordingConnection::new();
        let items = vec![
            Err("connection reset".to_string()),
            Ok(Inbound::Message(Payload::from("never read"))),
        ];

        // when (操作):
        let departure = usecase.execute(connection.clone(), inbound(items)).await;

        // then (期待する結果):
        assert_eq!(departure, Departure::ReadFailed("connection reset".to_string()));
        assert!(registry.is_empty().await);
        assert_eq!(connection.close_count(), 1);
        drop(usecase);
        assert!(queue.recv().await.is_none());
    }

    #[tokio::test]
    async fn test_close_frame_ends_loop() {
        // テスト項目: close フレームを受信したらループを抜ける
        // given (前提条件):
        let (registry, usecase, _queue) = setup();
        let connection = RecordingConnection::new();
        let items = vec![
            Ok(Inbound::Close),
            Ok(Inbound::Message(Payload::from("after close"))),
        ];

        // when (操作):
        let departure = usecase.execute(connection.clone(), inbound(items)).await;

        // then (期待する結果):
        assert_eq!(departure, Departure::PeerClosed);
        assert!(registry.is_empty().await);
        assert_eq!(connection.close_count(), 1);
    }

    #[tokio::test]
    async fn test_welcome_failure_skips_reader_and_cleans_up() {
        // テスト項目: ウェルカム送信失敗時は受信ループに入らず登録解除・close される
        // given (前提条件):
        let (registry, usecase, mut queue) = setup();
        let connection = RecordingConnection::failing();
        let items = vec![Ok(Inbound::Message(Payload::from("ignored")))];

        // when (操作):
        let departure = usecase.execute(connection.clone(), inbound(items)).await;

        // then (期待する結果):
        assert!(matches!(departure, Departure::WelcomeFailed(_)));
        assert!(registry.is_empty().await);
        assert_eq!(connection.close_count(), 1);
        drop(usecase);
        assert!(queue.recv().await.is_none());
    }

    #[tokio::test]
    async fn test_connection_is_registered_while_reading() {
        // テスト項目: 受信待ちの間、接続は Registry に登録されている
        // given (前提条件):
        let (registry, usecase, _queue) = setup();
        let usecase = Arc::new(usecase);
        let connection = RecordingConnection::new();
        let (tx, rx) = mpsc::unbounded_channel::<Result<Inbound, Infallible>>();
        let reader = {
            let usecase = usecase.clone();
            let connection = connection.clone();
            tokio::spawn(async move { usecase.execute(connection, receiver_stream(rx)).await })
        };

        // when (操作):
        tokio::time::sleep(Duration::from_millis(20)).await;
        let registered = registry.contains(&connection.id()).await;
        drop(tx);
        let departure = reader.await.unwrap();

        // then (期待する結果):
        assert!(registered);
        assert_eq!(departure, Departure::StreamEnded);
        assert!(!registry.contains(&connection.id()).await);
    }

    #[tokio::test]
    async fn test_duplicate_id_is_rejected_without_touching_existing_entry() {
        // テスト項目: 同じ ID の接続が既に登録済みなら受け付けず、既存の登録は残る
        // given (前提条件):
        let (registry, usecase, _queue) = setup();
        let existing = RecordingConnection::new();
        registry.add(existing.clone()).await;
        let mut duplicate = MockConnection::new();
        duplicate.expect_id().return_const(existing.id());
        duplicate.expect_send().never();
        duplicate.expect_close().times(1).return_const(());

        // when (操作):
        let departure = usecase
            .execute(Arc::new(duplicate), inbound(vec![]))
            .await;

        // then (期待する結果):
        assert_eq!(departure, Departure::AlreadyRegistered);
        assert!(registry.contains(&existing.id()).await);
        assert_eq!(existing.close_count(), 0);
    }

    #[tokio::test]
    async fn test_cleanup_runs_once_when_write_failure_and_read_failure_race() {
        // テスト項目: 書き込み失敗による削除と受信失敗による削除が競合しても close は 1 回だけ
        // given (前提条件):
        let registry = Arc::new(ConnectionRegistry::new());
        let (outbox, queue) = broadcast_queue(QueueMode::Unbounded);
        let usecase = Arc::new(AdmitConnectionUseCase::new(registry.clone(), outbox, WELCOME));
        let engine = crate::usecase::BroadcastEngine::new(registry.clone(), queue);
        let sender = RecordingConnection::new();
        let victim = RecordingConnection::new();
        registry.add(sender.clone()).await;

        let (tx, rx) = mpsc::unbounded_channel::<Result<Inbound, String>>();
        let reader = {
            let usecase = usecase.clone();
            let victim = victim.clone();
            tokio::spawn(async move { usecase.execute(victim, receiver_stream(rx)).await })
        };
        tokio::time::sleep(Duration::from_millis(20)).await;

        // when (操作): 書き込み失敗と受信失敗を同時に発生させる
        victim.fail_writes();
        let envelope = Envelope::new(sender.id(), Payload::from("boom"));
        let broadcast = engine.deliver(&envelope);
        let _ = tx.send(Err("connection reset".to_string()));
        let (report, departure) = tokio::join!(broadcast, reader);

        // then (期待する結果):
        assert_eq!(departure.unwrap(), Departure::ReadFailed("connection reset".to_string()));
        assert!(report.pruned.len() <= 1);
        assert_eq!(victim.close_count(), 1);
        assert_eq!(registry.ids().await, vec![sender.id()]);
    }

    fn receiver_stream<T>(mut rx: mpsc::UnboundedReceiver<T>) -> impl Stream<Item = T> + Unpin {
        Box::pin(stream::poll_fn(move |cx| rx.poll_recv(cx)))
    }
}
