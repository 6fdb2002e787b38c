//! Interactive terminal client for the Hiroba relay.

pub mod error;
pub mod formatter;
pub mod runner;
pub mod session;
pub mod ui;

pub use runner::run_client;
