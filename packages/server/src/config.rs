//! Server configuration.

use std::time::Duration;

use clap::Parser;

use crate::{
    error::ConfigError,
    usecase::{DEFAULT_PROBE_INTERVAL, QueueMode},
};

/// Sent once to every client right after it is admitted.
pub const WELCOME_MESSAGE: &str = "Welcome to the WebSocket server!";

/// Command-line arguments of `hiroba-server`
#[derive(Parser, Debug, Clone)]
#[command(name = "hiroba-server")]
#[command(about = "WebSocket relay that broadcasts every message to all other clients", long_about = None)]
pub struct ServerArgs {
    /// Host address to bind the server to
    #[arg(short = 'H', long, default_value = "127.0.0.1")]
    pub host: String,

    /// Port number to bind the server to
    #[arg(short = 'p', long, default_value = "8080")]
    pub port: u16,

    /// Seconds between two keep-alive ping rounds
    #[arg(long, default_value = "30")]
    pub probe_interval_secs: u64,

    /// Capacity of the broadcast queue (unbounded when omitted)
    #[arg(long)]
    pub queue_capacity: Option<usize>,

    /// Welcome message sent to each new client
    #[arg(long, default_value = WELCOME_MESSAGE)]
    pub welcome: String,
}

/// Validated server configuration
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub probe_interval: Duration,
    pub queue_mode: QueueMode,
    pub welcome: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 8080,
            probe_interval: DEFAULT_PROBE_INTERVAL,
            queue_mode: QueueMode::Unbounded,
            welcome: WELCOME_MESSAGE.to_string(),
        }
    }
}

impl TryFrom<ServerArgs> for ServerConfig {
    type Error = ConfigError;

    fn try_from(args: ServerArgs) -> Result<Self, Self::Error> {
        if args.probe_interval_secs == 0 {
            return Err(ConfigError::ZeroProbeInterval);
        }
        let queue_mode = match args.queue_capacity {
            None => QueueMode::Unbounded,
            Some(0) => return Err(ConfigError::ZeroQueueCapacity),
            Some(capacity) => QueueMode::Bounded(capacity),
        };
        Ok(Self {
            host: args.host,
            port: args.port,
            probe_interval: Duration::from_secs(args.probe_interval_secs),
            queue_mode,
            welcome: args.welcome,
        })
    }
}
