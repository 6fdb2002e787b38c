//! WebSocket connection handler.

use std::sync::Arc;

use axum::{
    extract::{
        State,
        ws::{WebSocket, WebSocketUpgrade},
    },
    response::IntoResponse,
};

use crate::{infrastructure::WsConnection, ui::state::AppState};

/// Upgrade the request and hand the socket to the admission usecase.
///
/// Requests without upgrade headers are rejected by the `WebSocketUpgrade`
/// extractor before this runs. Any origin is accepted.
pub async fn websocket_handler(
    ws: WebSocketUpgrade,
    State(state): State<Arc<AppState>>,
) -> impl IntoResponse {
    ws.on_failed_upgrade(|e| tracing::warn!("WebSocket upgrade failed: {}", e))
        .on_upgrade(move |socket| handle_socket(socket, state))
}

async fn handle_socket(socket: WebSocket, state: Arc<AppState>) {
    let (connection, inbound) = WsConnection::split(socket);
    state
        .admit_connection_usecase
        .execute(connection, inbound)
        .await;
}
