//! Network create requests

pub mod config;

pub use config::{NetworkSpec, DEFAULT_NETWORK_DRIVER};
