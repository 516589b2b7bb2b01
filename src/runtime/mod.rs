//! Container runtime client
//!
//! The orchestrator only needs four operations from the runtime. They sit
//! behind [`RuntimeClient`] so the engine endpoint can be swapped for an
//! in-memory double in tests.

pub mod http;

#[cfg(test)]
pub(crate) mod testing;

pub use http::HttpRuntime;

use crate::container::ContainerConfig;
use crate::error::Result;
use crate::network::NetworkSpec;
use async_trait::async_trait;

/// Result of a network create call
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NetworkCreation {
    /// The network was created
    Created,
    /// A network with that name already existed
    AlreadyExists,
}

/// Runtime operations used by a deployment.
///
/// Every call is a single blocking request with its own timeout; a timeout
/// surfaces as [`crate::error::StackError::Timeout`].
#[async_trait]
pub trait RuntimeClient: Send + Sync {
    /// Create a network; an existing network with the same name is not an error
    async fn create_network(&self, spec: &NetworkSpec) -> Result<NetworkCreation>;

    /// Pull an image by reference
    async fn pull_image(&self, reference: &str) -> Result<()>;

    /// Create a container, returning its ID
    async fn create_container(&self, name: &str, config: &ContainerConfig) -> Result<String>;

    /// Start a created container
    async fn start_container(&self, id: &str) -> Result<()>;
}
