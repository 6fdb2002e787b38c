//! Error types for configuration and the server process.

use thiserror::Error;

/// Invalid command-line configuration
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    #[error("queue capacity must be at least 1 (omit it for an unbounded queue)")]
    ZeroQueueCapacity,

    #[error("probe interval must be at least 1 second")]
    ZeroProbeInterval,
}

/// Fatal server errors. Only the top level sees these.
#[derive(Debug, Error)]
pub enum ServerError {
    #[error("failed to bind {addr}: {source}")]
    Bind {
        addr: String,
        #[source]
        source: std::io::Error,
    },

    #[error("server error: {0}")]
    Serve(#[from] std::io::Error),
}
