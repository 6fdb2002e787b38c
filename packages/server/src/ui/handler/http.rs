//! HTTP endpoint handlers.

use std::sync::Arc;

use axum::{Json, extract::State};

use crate::{infrastructure::dto::http::ConnectionListDto, ui::state::AppState};

/// Body of the home page
pub const HOME_PAGE: &str = "Welcome to the WebSocket Server!";

/// Home page
pub async fn home_page() -> &'static str {
    HOME_PAGE
}

/// Health check endpoint
pub async fn health_check() -> Json<serde_json::Value> {
    Json(serde_json::json!({"status": "ok"}))
}

/// Debug endpoint listing registered connections (for testing purposes)
pub async fn debug_connections(State(state): State<Arc<AppState>>) -> Json<ConnectionListDto> {
    Json(state.registry.ids().await.into())
}
