//! Client execution logic with reconnection support.

use std::time::Duration;

use crate::{
    error::ClientError,
    session::{SessionEnd, run_client_session},
};

pub const MAX_RECONNECT_ATTEMPTS: u32 = 5;
const RECONNECT_INTERVAL: Duration = Duration::from_secs(5);

/// Run the WebSocket client with reconnection logic
pub async fn run_client(url: String) -> Result<(), ClientError> {
    let mut reconnect_count = 0;

    loop {
        tracing::info!(
            "Attempting to connect to {} (attempt {}/{})",
            url,
            reconnect_count + 1,
            MAX_RECONNECT_ATTEMPTS
        );

        match run_client_session(&url).await {
            Ok(SessionEnd::UserExit) => {
                tracing::info!("Client session ended normally");
                // If connection ended normally (user exit), don't reconnect
                return Ok(());
            }
            Err(e) => {
                tracing::warn!("Connection lost: {}", e);
                reconnect_count += 1;

                if reconnect_count >= MAX_RECONNECT_ATTEMPTS {
                    return Err(ClientError::ReconnectExhausted(MAX_RECONNECT_ATTEMPTS));
                }

                tracing::info!(
                    "Reconnecting in {} seconds... (attempt {}/{})",
                    RECONNECT_INTERVAL.as_secs(),
                    reconnect_count + 1,
                    MAX_RECONNECT_ATTEMPTS
                );

                tokio::time::sleep(RECONNECT_INTERVAL).await;
            }
        }
    }
}
