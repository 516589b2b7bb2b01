//! Compose file parser

use super::config::{CommandConfig, EnvironmentConfig, Manifest, ScalarValue};
use super::networks::network_names;
use crate::error::{Result, StackError};
use regex::{Captures, Regex};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::LazyLock;

/// Default compose file names
pub const DEFAULT_COMPOSE_FILES: &[&str] = &[
    "compose.yaml",
    "compose.yml",
    "docker-compose.yaml",
    "docker-compose.yml",
];

static INTERPOLATION_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\$\{([A-Za-z_][A-Za-z0-9_]*)(?::-([^}]*))?\}|\$([A-Za-z_][A-Za-z0-9_]*)")
        .expect("interpolation pattern compiles")
});

/// Compose file parser
pub struct ComposeParser;

impl ComposeParser {
    /// Find compose file in directory
    pub fn find_compose_file(dir: &Path) -> Option<PathBuf> {
        DEFAULT_COMPOSE_FILES
            .iter()
            .map(|name| dir.join(name))
            .find(|path| path.exists())
    }

    /// Parse compose file from path
    pub fn parse_file(path: &Path) -> Result<Manifest> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            StackError::ManifestParse(format!("Failed to read {}: {}", path.display(), e))
        })?;

        Self::parse_str(&content)
    }

    /// Parse compose file from string
    pub fn parse_str(content: &str) -> Result<Manifest> {
        if content.trim().is_empty() {
            return Err(StackError::ManifestParse(
                "No compose document provided".to_string(),
            ));
        }

        serde_yaml::from_str(content)
            .map_err(|e| StackError::ManifestParse(format!("Failed to parse YAML: {}", e)))
    }

    /// Validate a manifest.
    ///
    /// Nothing found here stops a deployment; problems are returned as
    /// warnings for the caller to show.
    pub fn validate(manifest: &Manifest) -> Vec<String> {
        let mut warnings = Vec::new();
        let order: HashMap<&str, usize> = manifest
            .service_names()
            .enumerate()
            .map(|(i, name)| (name, i))
            .collect();

        for (position, (name, service)) in manifest.services.iter().enumerate() {
            if service.image().is_none() {
                warnings.push(format!(
                    "Service '{}' has no image and will be skipped",
                    name
                ));
            }

            for net in network_names(service.networks.as_ref()) {
                if net != "default" && !manifest.networks.contains_key(&net) {
                    warnings.push(format!(
                        "Service '{}' references undefined network '{}'",
                        name, net
                    ));
                }
            }

            if let Some(depends) = &service.depends_on {
                for dep in depends.names() {
                    match order.get(dep.as_str()) {
                        None => warnings.push(format!(
                            "Service '{}' depends on unknown service '{}'",
                            name, dep
                        )),
                        Some(&dep_position) if dep_position > position => {
                            warnings.push(format!(
                                "Service '{}' depends on '{}', which is declared later and will start after it",
                                name, dep
                            ))
                        }
                        Some(_) => {}
                    }
                }
            }
        }

        warnings
    }

    /// Interpolate environment variables in images, commands and
    /// environment values
    pub fn interpolate(manifest: &mut Manifest, env: &HashMap<String, String>) {
        for service in manifest.services.values_mut() {
            if let Some(ref mut image) = service.image {
                *image = interpolate_string(image, env);
            }

            if let Some(ref mut command) = service.command {
                match command {
                    CommandConfig::Shell(s) => *s = interpolate_string(s, env),
                    CommandConfig::Exec(arr) => {
                        for item in arr.iter_mut() {
                            *item = interpolate_string(item, env);
                        }
                    }
                }
            }

            if let Some(ref mut environment) = service.environment {
                match environment {
                    EnvironmentConfig::Map(map) => {
                        for value in map.values_mut() {
                            if let Some(ScalarValue::Text(v)) = value {
                                *v = interpolate_string(v, env);
                            }
                        }
                    }
                    EnvironmentConfig::Array(arr) => {
                        for item in arr.iter_mut() {
                            *item = interpolate_string(item, env);
                        }
                    }
                }
            }
        }
    }
}

/// Interpolate `${VAR}`, `${VAR:-default}` and `$VAR`.
///
/// Unset variables without a default become empty; `$$` is a literal `$`.
fn interpolate_string(s: &str, env: &HashMap<String, String>) -> String {
    s.split("$$")
        .map(|segment| {
            INTERPOLATION_RE
                .replace_all(segment, |caps: &Captures| {
                    let var = caps.get(1).or_else(|| caps.get(3)).map(|m| m.as_str());
                    let value = var.and_then(|v| env.get(v)).filter(|v| !v.is_empty());
                    match (value, caps.get(2)) {
                        (Some(value), _) => value.clone(),
                        (None, Some(default)) => default.as_str().to_string(),
                        (None, None) => String::new(),
                    }
                })
                .into_owned()
        })
        .collect::<Vec<_>>()
        .join("$")
}
