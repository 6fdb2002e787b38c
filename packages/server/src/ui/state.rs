//! Shared application state.

use std::sync::Arc;

use crate::{domain::ConnectionRegistry, usecase::AdmitConnectionUseCase};

/// Shared application state
pub struct AppState {
    /// Registry（配信対象の接続の集合）
    pub registry: Arc<ConnectionRegistry>,
    /// AdmitConnectionUseCase（接続受付のユースケース）
    pub admit_connection_usecase: Arc<AdmitConnectionUseCase>,
}
