//! Server execution logic.

use std::{future::Future, sync::Arc};

use axum::{Router, routing::get};
use tokio::net::TcpListener;
use tower_http::trace::TraceLayer;

use crate::{
    config::ServerConfig,
    domain::ConnectionRegistry,
    error::ServerError,
    usecase::{AdmitConnectionUseCase, BroadcastEngine, LivenessProber, broadcast_queue},
};

use super::{
    handler::{debug_connections, health_check, home_page, websocket_handler},
    signal::shutdown_signal,
    state::AppState,
};

/// WebSocket relay server
///
/// Owns the registry shared by the admission handler and the two background
/// tasks (broadcast engine and liveness prober).
///
/// # Example
///
/// ```ignore
/// let server = Server::from_config(&config);
/// server.run(&config.host, config.port).await?;
/// ```
pub struct Server {
    registry: Arc<ConnectionRegistry>,
    admit_connection_usecase: Arc<AdmitConnectionUseCase>,
    broadcast_engine: BroadcastEngine,
    liveness_prober: LivenessProber,
}

impl Server {
    /// Create a new Server instance from its parts
    pub fn new(
        registry: Arc<ConnectionRegistry>,
        admit_connection_usecase: Arc<AdmitConnectionUseCase>,
        broadcast_engine: BroadcastEngine,
        liveness_prober: LivenessProber,
    ) -> Self {
        Self {
            registry,
            admit_connection_usecase,
            broadcast_engine,
            liveness_prober,
        }
    }

    /// Wire the registry, queue and usecases described by `config`.
    pub fn from_config(config: &ServerConfig) -> Self {
        // 1. Registry
        let registry = Arc::new(ConnectionRegistry::new());

        // 2. Broadcast queue
        let (outbox, queue) = broadcast_queue(config.queue_mode);

        // 3. UseCases / background tasks
        let admit_connection_usecase = Arc::new(AdmitConnectionUseCase::new(
            registry.clone(),
            outbox,
            config.welcome.clone(),
        ));
        let broadcast_engine = BroadcastEngine::new(registry.clone(), queue);
        let liveness_prober = LivenessProber::new(registry.clone(), config.probe_interval);

        Self::new(
            registry,
            admit_connection_usecase,
            broadcast_engine,
            liveness_prober,
        )
    }

    /// Bind `host:port` and serve until Ctrl+C / SIGTERM.
    ///
    /// # Errors
    ///
    /// Returns an error if the server fails to bind to the specified address or
    /// if there's an error during server execution.
    pub async fn run(self, host: &str, port: u16) -> Result<(), ServerError> {
        let bind_addr = format!("{}:{}", host, port);
        let listener = TcpListener::bind(&bind_addr)
            .await
            .map_err(|source| ServerError::Bind {
                addr: bind_addr.clone(),
                source,
            })?;
        tracing::info!("Connect to: ws://{}/ws", bind_addr);
        tracing::info!("Press Ctrl+C to shutdown gracefully");

        self.serve(listener, shutdown_signal()).await
    }

    /// Serve on an already bound listener until `shutdown` resolves.
    ///
    /// The broadcast engine and the liveness prober run for as long as the
    /// HTTP server does and are aborted once it has stopped.
    pub async fn serve<F>(self, listener: TcpListener, shutdown: F) -> Result<(), ServerError>
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let app_state = Arc::new(AppState {
            registry: self.registry,
            admit_connection_usecase: self.admit_connection_usecase,
        });
        let app = build_router(app_state);

        let broadcast_task = tokio::spawn(self.broadcast_engine.run());
        let probe_task = tokio::spawn(self.liveness_prober.run());

        tracing::info!("WebSocket relay listening on {}", listener.local_addr()?);

        let result = axum::serve(listener, app)
            .with_graceful_shutdown(shutdown)
            .await
            .map_err(ServerError::from);

        broadcast_task.abort();
        probe_task.abort();
        tracing::info!("Server shutdown complete");

        result
    }
}

/// Route table of the relay
pub fn build_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/", get(home_page))
        // WebSocket エンドポイント
        .route("/ws", get(websocket_handler))
        // HTTP エンドポイント
        .route("/api/health", get(health_check))
        .route("/debug/connections", get(debug_connections))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
