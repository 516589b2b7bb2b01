//! Network configuration

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// Driver used when a network block names none
pub const DEFAULT_NETWORK_DRIVER: &str = "bridge";

/// Network create request
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct NetworkSpec {
    /// Network name
    pub name: String,
    /// Network driver
    pub driver: String,
    /// Ask the runtime to refuse duplicates instead of creating a twin
    pub check_duplicate: bool,
    /// Internal network (no external access)
    #[serde(default)]
    pub internal: bool,
    /// Attachable by standalone containers
    #[serde(default)]
    pub attachable: bool,
    /// Network labels
    #[serde(default, skip_serializing_if = "IndexMap::is_empty")]
    pub labels: IndexMap<String, String>,
}

impl NetworkSpec {
    /// Create a new network configuration
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            driver: DEFAULT_NETWORK_DRIVER.to_string(),
            check_duplicate: true,
            internal: false,
            attachable: false,
            labels: IndexMap::new(),
        }
    }

    /// Set network driver
    pub fn driver(mut self, driver: &str) -> Self {
        self.driver = driver.to_string();
        self
    }

    /// Mark network as internal
    pub fn internal(mut self, internal: bool) -> Self {
        self.internal = internal;
        self
    }

    /// Allow standalone containers to attach
    pub fn attachable(mut self, attachable: bool) -> Self {
        self.attachable = attachable;
        self
    }

    /// Add a label
    pub fn label(mut self, key: &str, value: &str) -> Self {
        self.labels.insert(key.to_string(), value.to_string());
        self
    }
}
