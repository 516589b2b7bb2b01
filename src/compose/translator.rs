//! Compose service to runtime configuration translation
//!
//! Pure: nothing here talks to the runtime. Each service becomes one
//! [`ContainerConfig`] and each declared network one [`NetworkSpec`].

use super::config::{CommandConfig, EnvironmentConfig, Manifest, ServiceSpec};
use super::healthcheck::normalize_healthcheck;
use super::networks::resolve_networks;
use super::ports::normalize_ports;
use super::volumes::normalize_volumes;
use crate::config::TranslateConfig;
use crate::container::{ContainerConfig, HostConfig, NetworkingConfig, RestartPolicy};
use crate::error::{Result, StackError};
use crate::network::{NetworkSpec, DEFAULT_NETWORK_DRIVER};
use tracing::{debug, info, instrument, warn};

/// Label carrying the project name
pub const PROJECT_LABEL: &str = "com.docker.compose.project";
/// Label carrying the service name
pub const SERVICE_LABEL: &str = "com.docker.compose.service";

/// Translates a parsed manifest into runtime requests
#[derive(Debug, Clone)]
pub struct ManifestTranslator {
    project_name: String,
    options: TranslateConfig,
}

impl ManifestTranslator {
    /// Create a translator for the given project
    pub fn new(project_name: &str, options: TranslateConfig) -> Self {
        Self {
            project_name: project_name.to_string(),
            options,
        }
    }

    pub fn project_name(&self) -> &str {
        &self.project_name
    }

    /// Network create requests for every declared, non-external network
    pub fn translate_networks(&self, manifest: &Manifest) -> Vec<NetworkSpec> {
        let mut specs = Vec::with_capacity(manifest.networks.len());

        for (name, block) in &manifest.networks {
            let block = block.clone().unwrap_or_default();
            if block.external.as_ref().is_some_and(|e| e.is_external()) {
                info!("Network '{}' is external, not creating it", name);
                continue;
            }

            let mut spec = NetworkSpec::new(name)
                .driver(block.driver.as_deref().unwrap_or(DEFAULT_NETWORK_DRIVER))
                .internal(block.internal.unwrap_or(false))
                .attachable(block.attachable.unwrap_or(false));

            if let Some(labels) = &block.labels {
                for (key, value) in labels.pairs() {
                    spec = spec.label(&key, &value);
                }
            }
            if self.options.project_labels {
                spec = spec.label(PROJECT_LABEL, &self.project_name);
            }

            specs.push(spec);
        }

        specs
    }

    /// Build the container configuration for one service
    #[instrument(skip(self, service), fields(project = %self.project_name))]
    pub fn translate_service(&self, service_name: &str, service: &ServiceSpec) -> Result<ContainerConfig> {
        let image = service
            .image()
            .ok_or_else(|| StackError::MissingImage(service_name.to_string()))?;
        let container_name = service.container_name_or(service_name);
        let policy = self.options.entry_policy;

        let ports = normalize_ports(service_name, &service.ports, policy)?;
        let binds = normalize_volumes(service_name, &service.volumes, policy)?;
        let healthcheck =
            normalize_healthcheck(service.healthcheck.as_ref(), self.options.missing_healthcheck)?;
        let endpoints = resolve_networks(service.networks.as_ref());

        let restart_policy = service.restart.as_deref().and_then(|value| {
            let policy = RestartPolicy::from_compose(value);
            if policy.is_none() {
                warn!(
                    "Service '{}': unknown restart policy '{}', none configured",
                    service_name, value
                );
            }
            policy
        });

        let mut config = ContainerConfig::new(container_name, image);
        config.cmd = service.command.as_ref().map(command_vector);
        config.env = render_environment(service.environment.as_ref());
        config.exposed_ports = ports.exposed_ports;
        config.healthcheck = healthcheck;
        config.working_dir = service.working_dir.clone();
        config.user = service.user.clone();
        config.hostname = service.hostname.clone();
        config.host_config = HostConfig {
            port_bindings: ports.port_bindings,
            binds,
            network_mode: service.network_mode.clone(),
            restart_policy,
        };
        config.networking_config = NetworkingConfig {
            endpoints_config: endpoints,
        };

        if let Some(labels) = &service.labels {
            for (key, value) in labels.pairs() {
                config.labels.insert(key, value);
            }
        }
        if self.options.project_labels {
            config
                .labels
                .insert(PROJECT_LABEL.to_string(), self.project_name.clone());
            config
                .labels
                .insert(SERVICE_LABEL.to_string(), service_name.to_string());
        }

        debug!("Translated service '{}' into container '{}'", service_name, container_name);
        Ok(config)
    }

    /// Translate every service, keeping per-service failures separate
    pub fn translate_services(&self, manifest: &Manifest) -> Vec<(String, Result<ContainerConfig>)> {
        manifest
            .services
            .iter()
            .map(|(name, spec)| (name.clone(), self.translate_service(name, spec)))
            .collect()
    }
}

/// Command vector; the string form is split on whitespace
fn command_vector(command: &CommandConfig) -> Vec<String> {
    match command {
        CommandConfig::Shell(s) => s.split_whitespace().map(str::to_string).collect(),
        CommandConfig::Exec(arr) => arr.clone(),
    }
}

/// `KEY=VALUE` strings in declaration order
fn render_environment(environment: Option<&EnvironmentConfig>) -> Vec<String> {
    match environment {
        None => Vec::new(),
        Some(EnvironmentConfig::Array(arr)) => arr.clone(),
        Some(EnvironmentConfig::Map(map)) => map
            .iter()
            .map(|(key, value)| match value {
                Some(v) => format!("{}={}", key, v),
                None => format!("{}=", key),
            })
            .collect(),
    }
}
