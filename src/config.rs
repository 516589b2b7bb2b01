//! stackup configuration
//!
//! Settings come from an optional YAML file, then the environment, then
//! command-line flags (applied by the binary).

use crate::error::{Result, StackError};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Default Docker-compatible engine endpoint
pub const DEFAULT_RUNTIME_URL: &str = "http://localhost:2375";

/// Environment variable overriding the runtime endpoint
pub const RUNTIME_URL_ENV: &str = "STACKUP_RUNTIME_URL";

/// What to do with a port or volume entry that cannot be normalized
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum EntryPolicy {
    /// Drop the entry and keep going
    #[default]
    LenientSkip,
    /// Fail the owning service
    Strict,
}

impl EntryPolicy {
    /// Apply the policy to a malformed entry.
    ///
    /// Returns `Ok(())` when the entry should be dropped.
    pub fn malformed(self, service: &str, field: &'static str, entry: impl Into<String>) -> Result<()> {
        let entry = entry.into();
        match self {
            EntryPolicy::LenientSkip => {
                tracing::warn!("Service '{}': dropping {} entry {:?}", service, field, entry);
                Ok(())
            }
            EntryPolicy::Strict => Err(StackError::MalformedEntry {
                service: service.to_string(),
                field,
                entry,
            }),
        }
    }
}

/// Healthcheck to send when a service declares none
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum MissingHealthcheck {
    /// No healthcheck configured
    #[default]
    Skip,
    /// A probe that always fails (`CMD-SHELL exit 1`)
    FailingDefault,
}

/// Runtime endpoint configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RuntimeConfig {
    /// Engine API base URL
    pub url: String,
    /// Timeout for network, create and start calls
    pub request_timeout_secs: u64,
    /// Timeout for image pulls
    pub pull_timeout_secs: u64,
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            url: DEFAULT_RUNTIME_URL.to_string(),
            request_timeout_secs: 10,
            pull_timeout_secs: 300,
        }
    }
}

impl RuntimeConfig {
    /// Create a configuration for the given endpoint
    pub fn new(url: &str) -> Self {
        Self {
            url: url.trim_end_matches('/').to_string(),
            ..Self::default()
        }
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    pub fn pull_timeout(&self) -> Duration {
        Duration::from_secs(self.pull_timeout_secs)
    }
}

/// Translation settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TranslateConfig {
    /// Malformed port/volume entries
    pub entry_policy: EntryPolicy,
    /// Services without a healthcheck block
    pub missing_healthcheck: MissingHealthcheck,
    /// Add `com.docker.compose.*` labels to containers
    pub project_labels: bool,
}

impl Default for TranslateConfig {
    fn default() -> Self {
        Self {
            entry_policy: EntryPolicy::default(),
            missing_healthcheck: MissingHealthcheck::default(),
            project_labels: true,
        }
    }
}

/// Top-level configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct StackupConfig {
    pub runtime: RuntimeConfig,
    pub translate: TranslateConfig,
}

impl StackupConfig {
    /// `$XDG_CONFIG_HOME/stackup/config.yaml` (or the platform equivalent)
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join("stackup").join("config.yaml"))
    }

    /// Load configuration.
    ///
    /// An explicit path must exist. Without one, the default path is used
    /// when present, otherwise built-in defaults. Environment overrides are
    /// applied last.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let mut config = match path {
            Some(path) => Self::from_file(path)?,
            None => match Self::default_path().filter(|p| p.exists()) {
                Some(path) => Self::from_file(&path)?,
                None => Self::default(),
            },
        };

        config.apply_env(|key| std::env::var(key).ok());
        config.validate()?;
        Ok(config)
    }

    /// Read configuration from a YAML file
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            StackError::InvalidConfig(format!("Failed to read {}: {}", path.display(), e))
        })?;
        tracing::debug!("Loaded configuration from {}", path.display());
        Self::from_yaml(&content)
    }

    /// Parse configuration from YAML text
    pub fn from_yaml(content: &str) -> Result<Self> {
        if content.trim().is_empty() {
            return Ok(Self::default());
        }
        serde_yaml::from_str(content)
            .map_err(|e| StackError::InvalidConfig(format!("Failed to parse YAML: {}", e)))
    }

    /// Apply environment overrides through `lookup`
    pub fn apply_env<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(url) = lookup(RUNTIME_URL_ENV).filter(|u| !u.trim().is_empty()) {
            self.runtime.url = url.trim().trim_end_matches('/').to_string();
        }
    }

    /// Check values that would only fail later at request time
    pub fn validate(&self) -> Result<()> {
        let url = &self.runtime.url;
        if !(url.starts_with("http://") || url.starts_with("https://")) {
            return Err(StackError::InvalidConfig(format!(
                "runtime url must be http(s): {}",
                url
            )));
        }
        if self.runtime.request_timeout_secs == 0 || self.runtime.pull_timeout_secs == 0 {
            return Err(StackError::InvalidConfig(
                "runtime timeouts must be greater than zero".to_string(),
            ));
        }
        Ok(())
    }
}
