//! Compose manifest types
//!
//! Fields that accept several YAML shapes are modeled as closed untagged
//! enums. Each one has a catch-all or a normalizer in a sibling module, so
//! an odd entry reaches the entry policy instead of failing the whole parse.

use indexmap::IndexMap;
use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;

/// Parsed Compose document
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Manifest {
    /// Compose file version
    #[serde(default)]
    pub version: Option<String>,
    /// Project name
    #[serde(default)]
    pub name: Option<String>,
    /// Services, in declaration order
    #[serde(default, deserialize_with = "null_as_default")]
    pub services: IndexMap<String, ServiceSpec>,
    /// Networks (a bare `name:` entry has no body)
    #[serde(default, deserialize_with = "null_as_default")]
    pub networks: IndexMap<String, Option<NetworkConfig>>,
}

impl Manifest {
    /// Service names in creation order
    pub fn service_names(&self) -> impl Iterator<Item = &str> {
        self.services.keys().map(|s| s.as_str())
    }
}

/// Service configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ServiceSpec {
    /// Image reference
    #[serde(default)]
    pub image: Option<String>,
    /// Command to run
    #[serde(default)]
    pub command: Option<CommandConfig>,
    /// Container name
    #[serde(default)]
    pub container_name: Option<String>,
    /// Hostname
    #[serde(default)]
    pub hostname: Option<String>,
    /// Environment variables
    #[serde(default)]
    pub environment: Option<EnvironmentConfig>,
    /// Port declarations
    #[serde(default, deserialize_with = "null_as_default")]
    pub ports: Vec<PortEntry>,
    /// Volume declarations
    #[serde(default, deserialize_with = "null_as_default")]
    pub volumes: Vec<VolumeEntry>,
    /// Networks to attach to
    #[serde(default)]
    pub networks: Option<NetworksConfig>,
    /// Network mode (`host`, `bridge`, `container:<name>`, ...)
    #[serde(default)]
    pub network_mode: Option<String>,
    /// Service dependencies
    #[serde(default)]
    pub depends_on: Option<DependsOnConfig>,
    /// Healthcheck configuration
    #[serde(default)]
    pub healthcheck: Option<HealthcheckConfig>,
    /// Labels
    #[serde(default)]
    pub labels: Option<LabelsConfig>,
    /// Restart policy
    #[serde(default)]
    pub restart: Option<String>,
    /// Working directory
    #[serde(default)]
    pub working_dir: Option<String>,
    /// User
    #[serde(default)]
    pub user: Option<String>,
}

impl ServiceSpec {
    /// Declared image, ignoring blank strings
    pub fn image(&self) -> Option<&str> {
        self.image.as_deref().map(str::trim).filter(|s| !s.is_empty())
    }

    /// Container name, falling back to the service name
    pub fn container_name_or<'a>(&'a self, service_name: &'a str) -> &'a str {
        self.container_name
            .as_deref()
            .filter(|n| !n.trim().is_empty())
            .unwrap_or(service_name)
    }
}

/// A YAML scalar that Compose lets users write either quoted or bare
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ScalarValue {
    Bool(bool),
    Integer(i64),
    Float(f64),
    Text(String),
}

impl fmt::Display for ScalarValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ScalarValue::Bool(b) => write!(f, "{}", b),
            ScalarValue::Integer(i) => write!(f, "{}", i),
            ScalarValue::Float(x) => write!(f, "{}", x),
            ScalarValue::Text(s) => write!(f, "{}", s),
        }
    }
}

/// Command configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum CommandConfig {
    /// Whitespace-separated command string
    Shell(String),
    /// Exec form array
    Exec(Vec<String>),
}

/// Environment configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum EnvironmentConfig {
    /// Array of KEY=value strings
    Array(Vec<String>),
    /// Map of key to value
    Map(IndexMap<String, Option<ScalarValue>>),
}

/// Port declaration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum PortEntry {
    /// `80`, `"80"` or `"8080:80"`
    Short(ScalarValue),
    /// `{ target: 80, published: 8080 }`
    Long(PortConfigLong),
    /// Anything else
    Other(serde_yaml::Value),
}

/// Long port configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PortConfigLong {
    /// Target port in container
    #[serde(default)]
    pub target: Option<ScalarValue>,
    /// Published port on host
    #[serde(default)]
    pub published: Option<ScalarValue>,
}

/// Volume declaration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum VolumeEntry {
    /// Short syntax: "host:container[:mode]"
    Short(String),
    /// Long syntax or anything else; not bound
    Other(serde_yaml::Value),
}

/// Networks configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum NetworksConfig {
    /// Array of network names
    Array(Vec<String>),
    /// Map of network name to per-network options (options are ignored)
    Map(IndexMap<String, Option<serde_yaml::Value>>),
}

/// Depends on configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum DependsOnConfig {
    /// Array of service names
    Array(Vec<String>),
    /// Map of service to condition
    Map(IndexMap<String, Option<serde_yaml::Value>>),
}

impl DependsOnConfig {
    /// Names of the services depended on
    pub fn names(&self) -> Vec<String> {
        match self {
            DependsOnConfig::Array(arr) => arr.clone(),
            DependsOnConfig::Map(map) => map.keys().cloned().collect(),
        }
    }
}

/// Healthcheck configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct HealthcheckConfig {
    /// Test command
    #[serde(default)]
    pub test: Option<HealthcheckTest>,
    /// Interval
    #[serde(default)]
    pub interval: Option<DurationValue>,
    /// Timeout
    #[serde(default)]
    pub timeout: Option<DurationValue>,
    /// Retries
    #[serde(default)]
    pub retries: Option<RetriesValue>,
    /// Start period
    #[serde(default)]
    pub start_period: Option<DurationValue>,
    /// Disable healthcheck
    #[serde(default)]
    pub disable: Option<bool>,
}

/// Healthcheck test
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum HealthcheckTest {
    /// Command string
    Command(String),
    /// Command array
    Array(Vec<String>),
    /// Anything else; rejected when the service is translated
    Other(serde_yaml::Value),
}

/// Interval value: bare integer seconds or `<digits><unit>`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum DurationValue {
    Seconds(u64),
    Text(String),
    /// Floats, negatives, booleans and collections; never a valid duration
    Other(serde_yaml::Value),
}

impl From<&str> for DurationValue {
    fn from(s: &str) -> Self {
        DurationValue::Text(s.to_string())
    }
}

impl fmt::Display for DurationValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DurationValue::Seconds(n) => write!(f, "{}", n),
            DurationValue::Text(s) => write!(f, "{}", s),
            DurationValue::Other(v) => write!(f, "{}", describe_value(v)),
        }
    }
}

/// Healthcheck retry count
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RetriesValue {
    Count(u32),
    Other(serde_yaml::Value),
}

/// Render a YAML value on one line for messages
pub fn describe_value(value: &serde_yaml::Value) -> String {
    serde_yaml::to_string(value)
        .map(|s| s.trim().to_string())
        .unwrap_or_else(|_| format!("{:?}", value))
}

/// Labels configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum LabelsConfig {
    /// Array of "key=value" strings
    Array(Vec<String>),
    /// Map of key to value
    Map(IndexMap<String, ScalarValue>),
}

impl LabelsConfig {
    /// Labels as ordered key/value pairs
    pub fn pairs(&self) -> Vec<(String, String)> {
        match self {
            LabelsConfig::Array(arr) => arr
                .iter()
                .map(|item| match item.split_once('=') {
                    Some((k, v)) => (k.to_string(), v.to_string()),
                    None => (item.clone(), String::new()),
                })
                .collect(),
            LabelsConfig::Map(map) => map
                .iter()
                .map(|(k, v)| (k.clone(), v.to_string()))
                .collect(),
        }
    }
}

/// Top-level network configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct NetworkConfig {
    /// Driver
    #[serde(default)]
    pub driver: Option<String>,
    /// Internal network
    #[serde(default)]
    pub internal: Option<bool>,
    /// Attachable
    #[serde(default)]
    pub attachable: Option<bool>,
    /// Labels
    #[serde(default)]
    pub labels: Option<LabelsConfig>,
    /// Managed outside this manifest
    #[serde(default)]
    pub external: Option<ExternalConfig>,
}

/// External resource configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ExternalConfig {
    /// Boolean
    Bool(bool),
    /// With name
    Named { name: String },
}

impl ExternalConfig {
    pub fn is_external(&self) -> bool {
        match self {
            ExternalConfig::Bool(b) => *b,
            ExternalConfig::Named { .. } => true,
        }
    }
}

/// Treat an explicit YAML `null` like an omitted key
fn null_as_default<'de, D, T>(deserializer: D) -> std::result::Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_services_keep_declaration_order() {
        let yaml = r#"
services:
  zeta:
    image: busybox
  alpha:
    image: alpine
  mid:
    image: nginx
"#;
        let manifest: Manifest = serde_yaml::from_str(yaml).unwrap();
        let names: Vec<&str> = manifest.service_names().collect();
        assert_eq!(names, vec!["zeta", "alpha", "mid"]);
    }

    #[test]
    fn test_port_entry_shapes() {
        let yaml = r#"
- 80
- "443"
- "8080:80"
- target: 5432
  published: "15432"
- ~
"#;
        let ports: Vec<PortEntry> = serde_yaml::from_str(yaml).unwrap();
        assert!(matches!(ports[0], PortEntry::Short(ScalarValue::Integer(80))));
        assert!(matches!(&ports[1], PortEntry::Short(ScalarValue::Text(s)) if s == "443"));
        assert!(matches!(&ports[2], PortEntry::Short(ScalarValue::Text(s)) if s == "8080:80"));
        assert!(matches!(&ports[3], PortEntry::Long(long) if long.target == Some(ScalarValue::Integer(5432))));
        assert!(matches!(ports[4], PortEntry::Other(_)));
    }

    #[test]
    fn test_null_sections() {
        let yaml = r#"
networks:
  app-net:
services:
  web:
    image: nginx
    ports:
    volumes:
"#;
        let manifest: Manifest = serde_yaml::from_str(yaml).unwrap();
        assert!(manifest.networks["app-net"].is_none());
        let web = &manifest.services["web"];
        assert!(web.ports.is_empty());
        assert!(web.volumes.is_empty());
    }

    #[test]
    fn test_blank_image_is_missing() {
        let spec = ServiceSpec {
            image: Some("  ".to_string()),
            ..Default::default()
        };
        assert_eq!(spec.image(), None);
    }

    #[test]
    fn test_labels_pairs() {
        let labels = LabelsConfig::Array(vec!["tier=web".to_string(), "canary".to_string()]);
        assert_eq!(
            labels.pairs(),
            vec![
                ("tier".to_string(), "web".to_string()),
                ("canary".to_string(), String::new())
            ]
        );
    }

    #[test]
    fn test_odd_healthcheck_values_still_parse() {
        let yaml = r#"
test: 123
interval: 1.5
timeout: true
start_period: -5
retries: "3"
"#;
        let block: HealthcheckConfig = serde_yaml::from_str(yaml).unwrap();
        assert!(matches!(block.test, Some(HealthcheckTest::Other(_))));
        assert!(matches!(block.interval, Some(DurationValue::Other(_))));
        assert!(matches!(block.timeout, Some(DurationValue::Other(_))));
        assert!(matches!(block.start_period, Some(DurationValue::Other(_))));
        assert!(matches!(block.retries, Some(RetriesValue::Other(_))));
        assert_eq!(block.interval.unwrap().to_string(), "1.5");
    }
}
