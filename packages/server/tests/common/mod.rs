//! Helpers shared by the integration tests.

#![allow(dead_code)]

use std::{net::SocketAddr, time::Duration};

use futures_util::{SinkExt, StreamExt};
use hiroba_server::{
    config::ServerConfig, infrastructure::dto::http::ConnectionListDto, ui::Server,
};
use tokio::{net::TcpListener, net::TcpStream, sync::oneshot};
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream, connect_async, tungstenite::Message};

pub type Client = WebSocketStream<MaybeTlsStream<TcpStream>>;

pub const WELCOME: &str = "Welcome to the WebSocket server!";
const RECV_TIMEOUT: Duration = Duration::from_secs(2);

/// Relay server running in-process on an ephemeral port.
pub struct TestServer {
    pub addr: SocketAddr,
    shutdown: Option<oneshot::Sender<()>>,
}

impl TestServer {
    pub async fn start() -> Self {
        Self::start_with(ServerConfig::default()).await
    }

    pub async fn start_with(config: ServerConfig) -> Self {
        let listener = TcpListener::bind("127.0.0.1:0")
            .await
            .expect("Failed to bind test listener");
        let addr = listener.local_addr().expect("Failed to read local addr");
        let (shutdown, signal) = oneshot::channel::<()>();

        let server = Server::from_config(&config);
        tokio::spawn(server.serve(listener, async {
            let _ = signal.await;
        }));

        TestServer {
            addr,
            shutdown: Some(shutdown),
        }
    }

    pub fn ws_url(&self) -> String {
        format!("ws://{}/ws", self.addr)
    }

    pub fn http_url(&self, path: &str) -> String {
        format!("http://{}{}", self.addr, path)
    }

    /// Connect a client and consume its welcome message.
    pub async fn connect(&self) -> Client {
        let (mut client, _response) = connect_async(self.ws_url())
            .await
            .expect("Failed to connect");
        assert_eq!(next_text(&mut client).await, WELCOME);
        client
    }

    pub async fn connections(&self) -> ConnectionListDto {
        reqwest::get(self.http_url("/debug/connections"))
            .await
            .expect("Failed to query connections")
            .json()
            .await
            .expect("Invalid connections body")
    }

    /// Poll the registry size until it equals `expected` or the timeout hits.
    pub async fn wait_for_count(&self, expected: usize) -> usize {
        let deadline = tokio::time::Instant::now() + RECV_TIMEOUT;
        loop {
            let count = self.connections().await.count;
            if count == expected || tokio::time::Instant::now() >= deadline {
                return count;
            }
            tokio::time::sleep(Duration::from_millis(20)).await;
        }
    }
}

impl Drop for TestServer {
    fn drop(&mut self) {
        if let Some(shutdown) = self.shutdown.take() {
            let _ = shutdown.send(());
        }
    }
}

/// Next data frame, skipping keep-alive pings and pongs.
pub async fn next_message(client: &mut Client) -> Message {
    loop {
        let message = tokio::time::timeout(RECV_TIMEOUT, client.next())
            .await
            .expect("Timed out waiting for a message")
            .expect("Connection ended")
            .expect("WebSocket error");
        match message {
            Message::Ping(_) | Message::Pong(_) => continue,
            other => return other,
        }
    }
}

pub async fn next_text(client: &mut Client) -> String {
    match next_message(client).await {
        Message::Text(text) => text.as_str().to_owned(),
        other => panic!("Expected a text message, got {:?}", other),
    }
}

/// Assert that no data frame arrives within `wait`.
pub async fn assert_silent(client: &mut Client, wait: Duration) {
    let result = tokio::time::timeout(wait, async {
        loop {
            match client.next().await {
                Some(Ok(Message::Ping(_))) | Some(Ok(Message::Pong(_))) => continue,
                other => return other,
            }
        }
    })
    .await;
    assert!(result.is_err(), "Expected silence, got {:?}", result);
}

pub async fn send_text(client: &mut Client, text: &str) {
    client
        .send(Message::Text(text.into()))
        .await
        .expect("Failed to send");
}
