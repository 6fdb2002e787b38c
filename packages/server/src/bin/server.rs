//! WebSocket relay server.
//!
//! Every message received from a client is broadcast to all other connected clients.
//!
//! Run with:
//! ```not_rust
//! cargo run --bin hiroba-server
//! cargo run --bin hiroba-server -- --host 0.0.0.0 --port 3000 --queue-capacity 1024
//! ```

use clap::Parser;

use hiroba_server::{
    config::{ServerArgs, ServerConfig},
    ui::Server,
};
use hiroba_shared::logger::setup_logger;

#[tokio::main]
async fn main() {
    // Initialize tracing
    setup_logger(env!("CARGO_PKG_NAME"), env!("CARGO_BIN_NAME"), "debug");

    let args = ServerArgs::parse();
    let config = match ServerConfig::try_from(args) {
        Ok(config) => config,
        Err(e) => {
            tracing::error!("Invalid configuration: {}", e);
            std::process::exit(2);
        }
    };
    tracing::debug!("Starting with {:?}", config);

    let server = Server::from_config(&config);
    if let Err(e) = server.run(&config.host, config.port).await {
        tracing::error!("Server error: {}", e);
        std::process::exit(1);
    }
}
