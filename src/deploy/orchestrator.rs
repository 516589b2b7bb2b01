//! Sequential deployment of a manifest against a runtime

use super::report::{DeployReport, DeployStage, NetworkOutcome, NetworkStatus, ServiceOutcome};
use crate::compose::{ComposeParser, Manifest, ManifestTranslator, ServiceSpec};
use crate::error::Result;
use crate::runtime::{NetworkCreation, RuntimeClient};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tracing::{error, info, warn};

/// Reason recorded for services left over after cancellation
pub const CANCELLED_REASON: &str = "deployment cancelled";

/// Deploys networks, then services in declaration order.
///
/// A failing service never stops the ones after it, and nothing is rolled
/// back: a container whose start fails stays created.
pub struct Orchestrator {
    runtime: Arc<dyn RuntimeClient>,
    translator: ManifestTranslator,
    cancel: Option<Arc<AtomicBool>>,
}

impl Orchestrator {
    /// Create a new orchestrator
    pub fn new(runtime: Arc<dyn RuntimeClient>, translator: ManifestTranslator) -> Self {
        Self {
            runtime,
            translator,
            cancel: None,
        }
    }

    /// Stop before the next service once `flag` is set
    pub fn with_cancel(mut self, flag: Arc<AtomicBool>) -> Self {
        self.cancel = Some(flag);
        self
    }

    /// Parse `content` and deploy it. A parse error means no runtime call
    /// was made.
    pub async fn deploy_str(&self, content: &str) -> Result<DeployReport> {
        let manifest = ComposeParser::parse_str(content)?;
        Ok(self.deploy(&manifest).await)
    }

    /// Deploy a parsed manifest
    pub async fn deploy(&self, manifest: &Manifest) -> DeployReport {
        let mut report = DeployReport::new(self.translator.project_name());
        info!(
            "Deploying project {} ({} networks, {} services)",
            report.project,
            manifest.networks.len(),
            manifest.services.len()
        );

        self.create_networks(manifest, &mut report).await;

        for (name, service) in &manifest.services {
            let container_name = service.container_name_or(name);
            if self.is_cancelled() {
                warn!("Skipping service {}: {}", name, CANCELLED_REASON);
                report
                    .services
                    .push(ServiceOutcome::skipped(name, container_name, CANCELLED_REASON));
                continue;
            }

            let outcome = self.deploy_service(name, service).await;
            report.services.push(outcome);
        }

        report.finish();
        info!("Project {}: {}", report.project, report.summary());
        report
    }

    async fn create_networks(&self, manifest: &Manifest, report: &mut DeployReport) {
        for spec in self.translator.translate_networks(manifest) {
            let status = match self.runtime.create_network(&spec).await {
                Ok(NetworkCreation::Created) => {
                    info!("Created network {}", spec.name);
                    NetworkStatus::Created
                }
                Ok(NetworkCreation::AlreadyExists) => {
                    info!("Network {} already exists", spec.name);
                    NetworkStatus::AlreadyExists
                }
                Err(e) => {
                    error!("Failed to create network {}: {}", spec.name, e);
                    NetworkStatus::Failed {
                        error: e.to_string(),
                    }
                }
            };

            report.networks.push(NetworkOutcome {
                network: spec.name,
                status,
            });
        }
    }

    async fn deploy_service(&self, name: &str, service: &ServiceSpec) -> ServiceOutcome {
        let container_name = service.container_name_or(name);

        let Some(image) = service.image() else {
            warn!("Service {} has no image, skipping", name);
            return ServiceOutcome::skipped(name, container_name, "no image specified");
        };

        info!("Pulling image {} for service {}", image, name);
        if let Err(e) = self.runtime.pull_image(image).await {
            error!("Service {}: pull of {} failed: {}", name, image, e);
            return ServiceOutcome::failed(name, container_name, DeployStage::Pull, e, None);
        }

        let config = match self.translator.translate_service(name, service) {
            Ok(config) => config,
            Err(e) => {
                error!("Service {}: {}", name, e);
                return ServiceOutcome::failed(name, container_name, DeployStage::Translate, e, None);
            }
        };

        info!("Creating container {}", config.name);
        let container_id = match self.runtime.create_container(&config.name, &config).await {
            Ok(id) => id,
            Err(e) => {
                error!("Service {}: create failed: {}", name, e);
                return ServiceOutcome::failed(name, &config.name, DeployStage::Create, e, None);
            }
        };

        info!("Starting container {}", config.name);
        if let Err(e) = self.runtime.start_container(&container_id).await {
            error!("Service {}: start failed: {}", name, e);
            return ServiceOutcome::failed(
                name,
                &config.name,
                DeployStage::Start,
                e,
                Some(container_id),
            );
        }

        info!("Service {} is running", name);
        ServiceOutcome::started(name, &config.name, container_id)
    }

    fn is_cancelled(&self) -> bool {
        self.cancel
            .as_ref()
            .is_some_and(|flag| flag.load(Ordering::SeqCst))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{EntryPolicy, TranslateConfig};
    use crate::deploy::report::ServiceStatus;
    use crate::error::StackError;
    use crate::runtime::testing::{container_id, Call, RecordingRuntime};
    use serde_json::json;

    fn orchestrator(runtime: &Arc<RecordingRuntime>) -> Orchestrator {
        orchestrator_with(runtime, TranslateConfig {
            project_labels: false,
            ..Default::default()
        })
    }

    fn orchestrator_with(runtime: &Arc<RecordingRuntime>, options: TranslateConfig) -> Orchestrator {
        let runtime: Arc<dyn RuntimeClient> = runtime.clone();
        Orchestrator::new(runtime, ManifestTranslator::new("demo", options))
    }

    const WEB: &str = r#"
networks:
  app-net:
    driver: bridge
services:
  web:
    image: "nginx:alpine"
    ports: ["8080:80"]
    volumes: ["data:/usr/share/nginx/html"]
    networks: ["app-net"]
"#;

    const THREE: &str = r#"
services:
  one:
    image: alpine:1
  two:
    image: alpine:2
  three:
    image: alpine:3
"#;

    #[tokio::test]
    async fn test_web_scenario_call_sequence() {
        let runtime = Arc::new(RecordingRuntime::new());
        let report = orchestrator(&runtime).deploy_str(WEB).await.unwrap();

        assert_eq!(
            runtime.calls(),
            vec![
                Call::CreateNetwork("app-net".into()),
                Call::Pull("nginx:alpine".into()),
                Call::Create("web".into()),
                Call::Start(container_id("web")),
            ]
        );
        assert!(report.is_success());
        assert_eq!(report.networks[0].status, NetworkStatus::Created);

        let configs = runtime.configs();
        assert_eq!(
            serde_json::to_value(&configs[0]).unwrap(),
            json!({
                "Image": "nginx:alpine",
                "Env": [],
                "ExposedPorts": {"80/tcp": {}},
                "HostConfig": {
                    "PortBindings": {"80/tcp": [{"HostPort": "8080"}]},
                    "Binds": ["data:/usr/share/nginx/html:rw,Z"]
                },
                "NetworkingConfig": {"EndpointsConfig": {"app-net": {}}}
            })
        );
    }

    #[tokio::test]
    async fn test_existing_network_still_deploys_services() {
        let yaml = r#"
networks:
  front:
  back:
services:
  web:
    image: nginx
    networks: [front, back]
"#;
        let runtime = Arc::new(RecordingRuntime::new().with_existing_network("back"));
        let report = orchestrator(&runtime).deploy_str(yaml).await.unwrap();

        assert_eq!(
            &runtime.calls()[..3],
            &[
                Call::CreateNetwork("front".into()),
                Call::CreateNetwork("back".into()),
                Call::Pull("nginx".into()),
            ]
        );
        assert_eq!(report.networks[0].status, NetworkStatus::Created);
        assert_eq!(report.networks[1].status, NetworkStatus::AlreadyExists);
        assert!(report.service("web").unwrap().is_started());
        assert!(report.is_success());
    }

    #[tokio::test]
    async fn test_network_failure_does_not_abort() {
        let runtime = Arc::new(RecordingRuntime::new().failing_network("app-net"));
        let report = orchestrator(&runtime).deploy_str(WEB).await.unwrap();

        assert!(matches!(report.networks[0].status, NetworkStatus::Failed { .. }));
        assert!(report.service("web").unwrap().is_started());
        assert!(!report.is_success());
    }

    #[tokio::test]
    async fn test_pull_failure_is_isolated() {
        let runtime = Arc::new(RecordingRuntime::new().failing_pull("alpine:2"));
        let report = orchestrator(&runtime).deploy_str(THREE).await.unwrap();

        assert_eq!(
            runtime.calls(),
            vec![
                Call::Pull("alpine:1".into()),
                Call::Create("one".into()),
                Call::Start(container_id("one")),
                Call::Pull("alpine:2".into()),
                Call::Pull("alpine:3".into()),
                Call::Create("three".into()),
                Call::Start(container_id("three")),
            ]
        );
        assert_eq!(
            report.service("two").unwrap().failed_stage(),
            Some(DeployStage::Pull)
        );
        assert_eq!(report.started().count(), 2);
        assert!(!report.is_success());
    }

    #[tokio::test]
    async fn test_invalid_yaml_makes_no_calls() {
        let runtime = Arc::new(RecordingRuntime::new());
        let result = orchestrator(&runtime)
            .deploy_str("services:\n  web: [unclosed\n")
            .await;

        assert!(matches!(result, Err(StackError::ManifestParse(_))));
        assert!(runtime.calls().is_empty());
    }

    #[tokio::test]
    async fn test_start_failure_keeps_container() {
        let runtime = Arc::new(RecordingRuntime::new().failing_start("two"));
        let report = orchestrator(&runtime).deploy_str(THREE).await.unwrap();

        assert_eq!(
            report.service("two").unwrap().status,
            ServiceStatus::Failed {
                stage: DeployStage::Start,
                error: "Timeout: start-container after 10s".into(),
                container_id: Some(container_id("two")),
            }
        );
        assert!(report.service("three").unwrap().is_started());
        // no removal call follows the failed start
        assert_eq!(runtime.calls().len(), 9);
    }

    #[tokio::test]
    async fn test_create_failure_skips_start() {
        let runtime = Arc::new(RecordingRuntime::new().failing_create("one"));
        let report = orchestrator(&runtime).deploy_str(THREE).await.unwrap();

        assert_eq!(
            report.service("one").unwrap().failed_stage(),
            Some(DeployStage::Create)
        );
        assert!(!runtime.calls().contains(&Call::Start(container_id("one"))));
        assert_eq!(report.started().count(), 2);
    }

    #[tokio::test]
    async fn test_invalid_duration_fails_only_that_service() {
        let yaml = r#"
services:
  api:
    image: node:20
    healthcheck:
      test: curl -f http://localhost
      interval: 10x
  web:
    image: nginx
"#;
        let runtime = Arc::new(RecordingRuntime::new());
        let report = orchestrator(&runtime).deploy_str(yaml).await.unwrap();

        assert_eq!(
            report.service("api").unwrap().failed_stage(),
            Some(DeployStage::Translate)
        );
        assert!(!runtime.calls().contains(&Call::Create("api".into())));
        assert!(report.service("web").unwrap().is_started());
    }

    #[tokio::test]
    async fn test_malformed_healthcheck_values_fail_only_their_service() {
        for block in [
            "interval: 1.5",
            "interval: -5",
            "timeout: true",
            "retries: many",
            "test: 123",
        ] {
            let yaml = format!(
                "services:\n  ok:\n    image: nginx\n  api:\n    image: node\n    healthcheck:\n      {}\n",
                block
            );
            let runtime = Arc::new(RecordingRuntime::new());
            let report = orchestrator(&runtime).deploy_str(&yaml).await.unwrap();

            assert!(report.service("ok").unwrap().is_started(), "{}", block);
            assert_eq!(
                report.service("api").unwrap().failed_stage(),
                Some(DeployStage::Translate),
                "{}",
                block
            );
            assert!(!runtime.calls().contains(&Call::Create("api".into())));
        }
    }

    #[tokio::test]
    async fn test_strict_policy_fails_service_at_translate() {
        let yaml = "services:\n  web:\n    image: nginx\n    volumes: [/cache]\n";
        let runtime = Arc::new(RecordingRuntime::new());
        let report = orchestrator_with(
            &runtime,
            TranslateConfig {
                entry_policy: EntryPolicy::Strict,
                ..Default::default()
            },
        )
        .deploy_str(yaml)
        .await
        .unwrap();

        assert_eq!(
            report.service("web").unwrap().failed_stage(),
            Some(DeployStage::Translate)
        );
    }

    #[tokio::test]
    async fn test_service_without_image_is_skipped() {
        let yaml = r#"
services:
  tools:
    command: sleep infinity
  web:
    image: nginx
    container_name: frontend
"#;
        let runtime = Arc::new(RecordingRuntime::new());
        let report = orchestrator(&runtime).deploy_str(yaml).await.unwrap();

        assert!(matches!(
            report.service("tools").unwrap().status,
            ServiceStatus::Skipped { .. }
        ));
        assert_eq!(
            runtime.calls(),
            vec![
                Call::Pull("nginx".into()),
                Call::Create("frontend".into()),
                Call::Start(container_id("frontend")),
            ]
        );
        assert!(report.is_success());
    }

    #[tokio::test]
    async fn test_empty_manifest_is_noop() {
        let runtime = Arc::new(RecordingRuntime::new());
        let report = orchestrator(&runtime).deploy_str("services: {}\n").await.unwrap();

        assert!(runtime.calls().is_empty());
        assert!(report.services.is_empty());
        assert!(report.is_success());
        assert!(report.finished_at.is_some());
    }

    #[tokio::test]
    async fn test_cancellation_between_services() {
        let flag = Arc::new(AtomicBool::new(false));
        let runtime = Arc::new(RecordingRuntime::new().cancel_on_pull("alpine:1", flag.clone()));
        let report = orchestrator(&runtime)
            .with_cancel(flag)
            .deploy_str(THREE)
            .await
            .unwrap();

        // the in-flight service still completes
        assert!(report.service("one").unwrap().is_started());
        for name in ["two", "three"] {
            assert_eq!(
                report.service(name).unwrap().status,
                ServiceStatus::Skipped {
                    reason: CANCELLED_REASON.into()
                }
            );
        }
        assert_eq!(runtime.calls().len(), 3);
    }
}
