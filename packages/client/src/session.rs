//! WebSocket client session.

use futures_util::{SinkExt, StreamExt};
use hiroba_shared::time::get_jst_timestamp;
use rustyline::{DefaultEditor, error::ReadlineError};
use tokio::sync::mpsc;
use tokio_tungstenite::{connect_async, tungstenite::protocol::Message};

use crate::{
    error::ClientError,
    formatter::MessageFormatter,
    ui::{PROMPT, redisplay_prompt},
};

/// How a session ended without a connection error
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionEnd {
    /// The user pressed Ctrl+C / Ctrl+D.
    UserExit,
}

/// Run one WebSocket session until the user exits or the connection is lost.
pub async fn run_client_session(url: &str) -> Result<SessionEnd, ClientError> {
    let (ws_stream, _response) = connect_async(url)
        .await
        .map_err(|e| ClientError::ConnectionError(e.to_string()))?;

    tracing::info!("Connected to relay server!");
    print!("{}", MessageFormatter::format_connected(url));

    let (mut write, mut read) = ws_stream.split();

    // Spawn a task to handle incoming messages. It only ends when the connection does.
    let mut read_task = tokio::spawn(async move {
        while let Some(message) = read.next().await {
            match message {
                Ok(Message::Text(text)) => {
                    print!(
                        "{}",
                        MessageFormatter::format_text_message(text.as_str(), get_jst_timestamp())
                    );
                    redisplay_prompt();
                }
                Ok(Message::Binary(data)) => {
                    print!(
                        "{}",
                        MessageFormatter::format_binary_message(data.len(), get_jst_timestamp())
                    );
                    redisplay_prompt();
                }
                Ok(Message::Close(_)) => {
                    tracing::info!("Server closed the connection");
                    return ClientError::ConnectionError("closed by server".to_string());
                }
                Err(e) => {
                    tracing::warn!("WebSocket read error: {}", e);
                    return ClientError::ConnectionError(e.to_string());
                }
                // Pings are answered by tungstenite
                _ => {}
            }
        }
        ClientError::ConnectionError("connection lost".to_string())
    });

    // Create channel for rustyline input
    let (input_tx, mut input_rx) = mpsc::unbounded_channel::<String>();

    // Spawn a blocking thread for rustyline (synchronous readline)
    let _readline_handle = std::thread::spawn(move || {
        let mut rl = match DefaultEditor::new() {
            Ok(rl) => rl,
            Err(e) => {
                tracing::error!("Failed to initialize readline: {}", e);
                return;
            }
        };

        loop {
            match rl.readline(PROMPT) {
                Ok(line) => {
                    let line = line.trim();
                    if !line.is_empty() {
                        rl.add_history_entry(line).ok();
                        if input_tx.send(line.to_string()).is_err() {
                            // Channel closed, exit thread
                            break;
                        }
                    }
                }
                Err(ReadlineError::Interrupted) => {
                    // Ctrl+C
                    tracing::info!("Interrupted");
                    break;
                }
                Err(ReadlineError::Eof) => {
                    // Ctrl+D
                    tracing::info!("EOF");
                    break;
                }
                Err(err) => {
                    tracing::error!("Readline error: {}", err);
                    break;
                }
            }
        }
    });

    // Spawn a task to forward input lines to the WebSocket
    let mut write_task = tokio::spawn(async move {
        while let Some(line) = input_rx.recv().await {
            if let Err(e) = write.send(Message::Text(line.into())).await {
                tracing::warn!("Failed to send message: {}", e);
                return Err(ClientError::ConnectionError(e.to_string()));
            }
        }
        let _ = write.close().await;
        Ok(SessionEnd::UserExit)
    });

    // If any one of the tasks completes, abort the other
    tokio::select! {
        read_result = &mut read_task => {
            write_task.abort();
            match read_result {
                Ok(e) => Err(e),
                Err(e) => Err(ClientError::ConnectionError(e.to_string())),
            }
        }
        write_result = &mut write_task => {
            read_task.abort();
            match write_result {
                Ok(result) => result,
                Err(e) => Err(ClientError::ConnectionError(e.to_string())),
            }
        }
    }
}
