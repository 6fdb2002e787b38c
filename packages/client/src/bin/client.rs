//! Interactive WebSocket client for the Hiroba relay.
//!
//! Sends every line typed on stdin and prints every message relayed by the server.
//! Automatically reconnects on disconnection (max 5 attempts with 5 second interval).
//!
//! Run with:
//! ```not_rust
//! cargo run --bin hiroba-client
//! cargo run --bin hiroba-client -- --url ws://127.0.0.1:3000/ws
//! ```

use clap::Parser;

use hiroba_shared::logger::setup_logger;

#[derive(Parser, Debug)]
#[command(name = "hiroba-client")]
#[command(about = "Interactive client for the Hiroba WebSocket relay", long_about = None)]
struct Args {
    /// WebSocket server URL
    #[arg(short = 'u', long, default_value = "ws://127.0.0.1:8080/ws")]
    url: String,
}

#[tokio::main]
async fn main() {
    // Initialize tracing
    setup_logger(env!("CARGO_PKG_NAME"), env!("CARGO_BIN_NAME"), "info");

    let args = Args::parse();

    if let Err(e) = hiroba_client::run_client(args.url).await {
        tracing::error!("Client error: {}", e);
        std::process::exit(1);
    }
}
