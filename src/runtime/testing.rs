//! In-memory runtime that records every call

use super::{NetworkCreation, RuntimeClient};
use crate::container::ContainerConfig;
use crate::error::{Result, StackError};
use crate::network::NetworkSpec;
use async_trait::async_trait;
use std::collections::HashSet;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Call {
    CreateNetwork(String),
    Pull(String),
    Create(String),
    Start(String),
}

#[derive(Default)]
pub struct RecordingRuntime {
    calls: Mutex<Vec<Call>>,
    configs: Mutex<Vec<ContainerConfig>>,
    existing_networks: HashSet<String>,
    failing_networks: HashSet<String>,
    failing_pulls: HashSet<String>,
    failing_creates: HashSet<String>,
    failing_starts: HashSet<String>,
    cancel_on_pull: Option<(String, Arc<AtomicBool>)>,
}

impl RecordingRuntime {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_existing_network(mut self, name: &str) -> Self {
        self.existing_networks.insert(name.to_string());
        self
    }

    pub fn failing_network(mut self, name: &str) -> Self {
        self.failing_networks.insert(name.to_string());
        self
    }

    pub fn failing_pull(mut self, image: &str) -> Self {
        self.failing_pulls.insert(image.to_string());
        self
    }

    pub fn failing_create(mut self, container: &str) -> Self {
        self.failing_creates.insert(container.to_string());
        self
    }

    pub fn failing_start(mut self, container: &str) -> Self {
        self.failing_starts.insert(container.to_string());
        self
    }

    /// Raise `flag` once `image` has been pulled
    pub fn cancel_on_pull(mut self, image: &str, flag: Arc<AtomicBool>) -> Self {
        self.cancel_on_pull = Some((image.to_string(), flag));
        self
    }

    pub fn calls(&self) -> Vec<Call> {
        self.calls.lock().unwrap().clone()
    }

    pub fn configs(&self) -> Vec<ContainerConfig> {
        self.configs.lock().unwrap().clone()
    }

    fn record(&self, call: Call) {
        self.calls.lock().unwrap().push(call);
    }
}

/// Container IDs handed out by the recording runtime
pub fn container_id(name: &str) -> String {
    format!("id-{}", name)
}

#[async_trait]
impl RuntimeClient for RecordingRuntime {
    async fn create_network(&self, spec: &NetworkSpec) -> Result<NetworkCreation> {
        self.record(Call::CreateNetwork(spec.name.clone()));
        if self.failing_networks.contains(&spec.name) {
            return Err(StackError::runtime("create-network", Some(500), "driver failure"));
        }
        if self.existing_networks.contains(&spec.name) {
            return Ok(NetworkCreation::AlreadyExists);
        }
        Ok(NetworkCreation::Created)
    }

    async fn pull_image(&self, reference: &str) -> Result<()> {
        self.record(Call::Pull(reference.to_string()));
        if let Some((image, flag)) = &self.cancel_on_pull {
            if image == reference {
                flag.store(true, Ordering::SeqCst);
            }
        }
        if self.failing_pulls.contains(reference) {
            return Err(StackError::runtime("pull-image", Some(404), "manifest unknown"));
        }
        Ok(())
    }

    async fn create_container(&self, name: &str, config: &ContainerConfig) -> Result<String> {
        self.record(Call::Create(name.to_string()));
        if self.failing_creates.contains(name) {
            return Err(StackError::runtime("create-container", Some(409), "name in use"));
        }
        self.configs.lock().unwrap().push(config.clone());
        Ok(container_id(name))
    }

    async fn start_container(&self, id: &str) -> Result<()> {
        self.record(Call::Start(id.to_string()));
        if self
            .failing_starts
            .iter()
            .any(|name| container_id(name) == id)
        {
            return Err(StackError::Timeout("start-container after 10s".to_string()));
        }
        Ok(())
    }
}
