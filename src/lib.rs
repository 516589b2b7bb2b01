//! stackup - deploy Compose manifests to a Docker-compatible engine
//!
//! A manifest is parsed, each service is translated into an engine
//! container configuration, and the result is deployed one service at a
//! time:
//!
//! - Networks are created first; an existing network is not an error
//! - Services are pulled, created and started in declaration order
//! - A failing service is recorded and the deployment moves on
//!
//! The outcome of every network and service is returned as a
//! [`deploy::DeployReport`].

pub mod compose;
pub mod config;
pub mod container;
pub mod deploy;
pub mod error;
pub mod network;
pub mod runtime;

pub use error::{Result, StackError};
