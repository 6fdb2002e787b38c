//! Data Transfer Objects

pub mod http;
