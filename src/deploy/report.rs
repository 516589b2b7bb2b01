//! Deployment outcomes

use chrono::{DateTime, Utc};
use serde::Serialize;
use std::fmt;

/// Step of a service deployment
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum DeployStage {
    Pull,
    Translate,
    Create,
    Start,
}

impl fmt::Display for DeployStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DeployStage::Pull => write!(f, "pull"),
            DeployStage::Translate => write!(f, "translate"),
            DeployStage::Create => write!(f, "create"),
            DeployStage::Start => write!(f, "start"),
        }
    }
}

/// What happened to one service
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "lowercase")]
pub enum ServiceStatus {
    /// Created and started
    Started { container_id: String },
    /// Never attempted
    Skipped { reason: String },
    /// A step failed; a container created before a failed start is kept
    Failed {
        stage: DeployStage,
        error: String,
        container_id: Option<String>,
    },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ServiceOutcome {
    pub service: String,
    pub container_name: String,
    #[serde(flatten)]
    pub status: ServiceStatus,
}

impl ServiceOutcome {
    pub fn started(service: &str, container_name: &str, container_id: String) -> Self {
        Self {
            service: service.to_string(),
            container_name: container_name.to_string(),
            status: ServiceStatus::Started { container_id },
        }
    }

    pub fn skipped(service: &str, container_name: &str, reason: impl Into<String>) -> Self {
        Self {
            service: service.to_string(),
            container_name: container_name.to_string(),
            status: ServiceStatus::Skipped {
                reason: reason.into(),
            },
        }
    }

    pub fn failed(
        service: &str,
        container_name: &str,
        stage: DeployStage,
        error: impl ToString,
        container_id: Option<String>,
    ) -> Self {
        Self {
            service: service.to_string(),
            container_name: container_name.to_string(),
            status: ServiceStatus::Failed {
                stage,
                error: error.to_string(),
                container_id,
            },
        }
    }

    pub fn is_started(&self) -> bool {
        matches!(self.status, ServiceStatus::Started { .. })
    }

    pub fn is_failed(&self) -> bool {
        matches!(self.status, ServiceStatus::Failed { .. })
    }

    /// Failing stage, if any
    pub fn failed_stage(&self) -> Option<DeployStage> {
        match self.status {
            ServiceStatus::Failed { stage, .. } => Some(stage),
            _ => None,
        }
    }
}

impl fmt::Display for ServiceOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.status {
            ServiceStatus::Started { container_id } => write!(
                f,
                "{:<20} started  {} ({})",
                self.service,
                self.container_name,
                crate::runtime::http::short_id(container_id)
            ),
            ServiceStatus::Skipped { reason } => {
                write!(f, "{:<20} skipped  {}", self.service, reason)
            }
            ServiceStatus::Failed { stage, error, .. } => {
                write!(f, "{:<20} failed   [{}] {}", self.service, stage, error)
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "kebab-case")]
pub enum NetworkStatus {
    Created,
    AlreadyExists,
    Failed { error: String },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NetworkOutcome {
    pub network: String,
    #[serde(flatten)]
    pub status: NetworkStatus,
}

/// Result of one deployment
#[derive(Debug, Clone, Serialize)]
pub struct DeployReport {
    /// Deployment ID
    pub id: String,
    /// Project name
    pub project: String,
    pub started_at: DateTime<Utc>,
    pub finished_at: Option<DateTime<Utc>>,
    /// Network outcomes, in declaration order
    pub networks: Vec<NetworkOutcome>,
    /// Service outcomes, in declaration order
    pub services: Vec<ServiceOutcome>,
}

impl DeployReport {
    /// Start a report for `project`
    pub fn new(project: &str) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            project: project.to_string(),
            started_at: Utc::now(),
            finished_at: None,
            networks: Vec::new(),
            services: Vec::new(),
        }
    }

    pub fn finish(&mut self) {
        self.finished_at = Some(Utc::now());
    }

    /// Whether every network and service either succeeded or was skipped
    pub fn is_success(&self) -> bool {
        self.failed().next().is_none()
            && !self
                .networks
                .iter()
                .any(|n| matches!(n.status, NetworkStatus::Failed { .. }))
    }

    pub fn started(&self) -> impl Iterator<Item = &ServiceOutcome> {
        self.services.iter().filter(|s| s.is_started())
    }

    pub fn failed(&self) -> impl Iterator<Item = &ServiceOutcome> {
        self.services.iter().filter(|s| s.is_failed())
    }

    pub fn skipped(&self) -> impl Iterator<Item = &ServiceOutcome> {
        self.services
            .iter()
            .filter(|s| matches!(s.status, ServiceStatus::Skipped { .. }))
    }

    /// Outcome for a service by name
    pub fn service(&self, name: &str) -> Option<&ServiceOutcome> {
        self.services.iter().find(|s| s.service == name)
    }

    /// One-line summary
    pub fn summary(&self) -> String {
        format!(
            "{} started, {} failed, {} skipped",
            self.started().count(),
            self.failed().count(),
            self.skipped().count()
        )
    }
}
