//! Deployment of a manifest against a container runtime

pub mod orchestrator;
pub mod report;

pub use orchestrator::Orchestrator;
pub use report::{DeployReport, DeployStage, NetworkOutcome, NetworkStatus, ServiceOutcome, ServiceStatus};
