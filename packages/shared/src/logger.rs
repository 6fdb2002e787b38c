//! Logging setup shared by the relay server and client binaries.

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Initialize the tracing subscriber for a binary.
///
/// `crate_name` is the library crate the binary drives (e.g. `"hiroba_server"`).
/// Its events and the binary's own events are emitted at `default_log_level`
/// unless `RUST_LOG` says otherwise.
///
/// # Examples
///
/// ```no_run
/// use hiroba_shared::logger::setup_logger;
///
/// setup_logger("hiroba_server", "hiroba_server", "debug");
/// ```
pub fn setup_logger(crate_name: &str, binary_name: &str, default_log_level: &str) {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| default_filter(crate_name, binary_name, default_log_level).into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();
}

/// Build the default `EnvFilter` directive string.
///
/// Cargo binary names use `-` but tracing targets use `_`.
pub fn default_filter(crate_name: &str, binary_name: &str, default_log_level: &str) -> String {
    format!(
        "{}={},{}={},tower_http={}",
        crate_name.replace('-', "_"),
        default_log_level,
        binary_name.replace('-', "_"),
        default_log_level,
        default_log_level
    )
}
