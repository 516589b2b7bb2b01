//! Container configuration
//!
//! These are the bodies sent to the engine's `POST /containers/create`.
//! Field names follow the Docker Engine API, which Podman's compat API
//! accepts unchanged.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// Serializes as `{}`; the API uses it as a set-member marker
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EmptyObject {}

/// Container create request
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct ContainerConfig {
    /// Container name (sent as a query parameter, not in the body)
    #[serde(skip)]
    pub name: String,
    /// Image reference
    pub image: String,
    /// Command to run
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cmd: Option<Vec<String>>,
    /// Environment as KEY=VALUE strings
    #[serde(default)]
    pub env: Vec<String>,
    /// Ports the container listens on
    #[serde(default)]
    pub exposed_ports: IndexMap<String, EmptyObject>,
    /// Healthcheck probe
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub healthcheck: Option<HealthConfig>,
    /// Working directory
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub working_dir: Option<String>,
    /// User to run as
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user: Option<String>,
    /// Hostname
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hostname: Option<String>,
    /// Container labels
    #[serde(default, skip_serializing_if = "IndexMap::is_empty")]
    pub labels: IndexMap<String, String>,
    /// Host-side configuration
    #[serde(default)]
    pub host_config: HostConfig,
    /// Network attachments made at create time
    #[serde(default)]
    pub networking_config: NetworkingConfig,
}

impl ContainerConfig {
    /// Create a new container configuration
    pub fn new(name: &str, image: &str) -> Self {
        Self {
            name: name.to_string(),
            image: image.to_string(),
            ..Self::default()
        }
    }
}

/// Host configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct HostConfig {
    /// `<port>/tcp` to host bindings
    #[serde(default)]
    pub port_bindings: IndexMap<String, Vec<PortBinding>>,
    /// `host:container:mode` bind strings
    #[serde(default)]
    pub binds: Vec<String>,
    /// Network mode
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub network_mode: Option<String>,
    /// Restart policy
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub restart_policy: Option<RestartPolicy>,
}

/// One host binding for a container port
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct PortBinding {
    /// Host port; empty lets the runtime pick one
    pub host_port: String,
}

impl PortBinding {
    pub fn new(host_port: &str) -> Self {
        Self {
            host_port: host_port.to_string(),
        }
    }
}

/// Healthcheck probe; all durations in nanoseconds
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct HealthConfig {
    pub test: Vec<String>,
    pub interval: i64,
    pub timeout: i64,
    pub retries: u32,
    pub start_period: i64,
}

/// Restart policy
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "Name")]
pub enum RestartPolicy {
    #[serde(rename = "no")]
    No,
    #[serde(rename = "always")]
    Always,
    #[serde(rename = "unless-stopped")]
    UnlessStopped,
    #[serde(rename = "on-failure")]
    OnFailure {
        #[serde(rename = "MaximumRetryCount")]
        maximum_retry_count: u32,
    },
}

/// Retry budget for a bare `on-failure`
pub const DEFAULT_ON_FAILURE_RETRIES: u32 = 5;

impl RestartPolicy {
    /// Map a Compose `restart:` value.
    ///
    /// Unrecognized values yield `None`, meaning no policy is sent.
    pub fn from_compose(value: &str) -> Option<Self> {
        match value.trim() {
            "no" | "none" => Some(RestartPolicy::No),
            "always" => Some(RestartPolicy::Always),
            "unless-stopped" => Some(RestartPolicy::UnlessStopped),
            "on-failure" => Some(RestartPolicy::OnFailure {
                maximum_retry_count: DEFAULT_ON_FAILURE_RETRIES,
            }),
            other => other
                .strip_prefix("on-failure:")
                .and_then(|n| n.parse().ok())
                .map(|maximum_retry_count| RestartPolicy::OnFailure {
                    maximum_retry_count,
                }),
        }
    }
}

impl std::fmt::Display for RestartPolicy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RestartPolicy::No => write!(f, "no"),
            RestartPolicy::Always => write!(f, "always"),
            RestartPolicy::UnlessStopped => write!(f, "unless-stopped"),
            RestartPolicy::OnFailure {
                maximum_retry_count,
            } => write!(f, "on-failure:{}", maximum_retry_count),
        }
    }
}

/// Networking configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct NetworkingConfig {
    /// Network name to endpoint settings
    #[serde(default)]
    pub endpoints_config: IndexMap<String, EndpointSettings>,
}

/// Per-network endpoint settings (attachment only)
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EndpointSettings {}
