//! Engine API client over HTTP
//!
//! Talks to a Docker-compatible REST endpoint (Docker, or Podman's compat
//! service) such as `http://host:2375`.

use super::{NetworkCreation, RuntimeClient};
use crate::config::RuntimeConfig;
use crate::container::ContainerConfig;
use crate::error::{Result, StackError};
use crate::network::NetworkSpec;
use async_trait::async_trait;
use reqwest::{Client, RequestBuilder, Response, StatusCode};
use serde::Deserialize;
use std::time::Duration;
use tracing::{debug, info, warn};

/// Container create response
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct ContainerCreateResponse {
    id: String,
    #[serde(default)]
    warnings: Option<Vec<String>>,
}

/// Error body returned by the engine
#[derive(Debug, Deserialize)]
struct ErrorResponse {
    message: String,
}

/// One line of the image pull progress stream
#[derive(Debug, Deserialize)]
struct PullProgress {
    #[serde(default)]
    error: Option<String>,
    #[serde(default)]
    status: Option<String>,
}

/// Runtime client for a Docker-compatible engine API
pub struct HttpRuntime {
    config: RuntimeConfig,
    client: Client,
}

impl HttpRuntime {
    /// Create a new client for the configured endpoint
    pub fn new(config: RuntimeConfig) -> Result<Self> {
        let client = Client::builder()
            .connect_timeout(config.request_timeout())
            .build()
            .map_err(|e| StackError::Http(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self { config, client })
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.config.url.trim_end_matches('/'), path)
    }

    async fn send(
        &self,
        operation: &'static str,
        request: RequestBuilder,
        timeout: Duration,
    ) -> Result<Response> {
        request.timeout(timeout).send().await.map_err(|e| {
            if e.is_timeout() {
                StackError::Timeout(format!("{} after {}s", operation, timeout.as_secs()))
            } else {
                StackError::runtime(operation, None, e.to_string())
            }
        })
    }

    async fn read_body(operation: &'static str, response: Response) -> Result<String> {
        response.text().await.map_err(|e| {
            if e.is_timeout() {
                StackError::Timeout(format!("{} while reading response", operation))
            } else {
                StackError::runtime(operation, None, e.to_string())
            }
        })
    }

    /// Turn an unsuccessful response into a runtime error
    async fn failure(operation: &'static str, response: Response) -> StackError {
        let status = response.status();
        let body = response.text().await.unwrap_or_default();
        StackError::runtime(operation, Some(status.as_u16()), error_message(&body))
    }
}

/// Prefer the engine's `{"message": ...}` over the raw body
fn error_message(body: &str) -> String {
    serde_json::from_str::<ErrorResponse>(body)
        .map(|e| e.message)
        .unwrap_or_else(|_| body.trim().to_string())
}

#[async_trait]
impl RuntimeClient for HttpRuntime {
    async fn create_network(&self, spec: &NetworkSpec) -> Result<NetworkCreation> {
        const OP: &str = "create-network";
        debug!("POST /networks/create {}", serde_json::to_string(spec)?);

        let request = self.client.post(self.url("/networks/create")).json(spec);
        let response = self.send(OP, request, self.config.request_timeout()).await?;

        match response.status() {
            StatusCode::OK | StatusCode::CREATED => Ok(NetworkCreation::Created),
            StatusCode::CONFLICT => Ok(NetworkCreation::AlreadyExists),
            status => {
                let message = error_message(&response.text().await.unwrap_or_default());
                if message.contains("already exists") {
                    Ok(NetworkCreation::AlreadyExists)
                } else {
                    Err(StackError::runtime(OP, Some(status.as_u16()), message))
                }
            }
        }
    }

    async fn pull_image(&self, reference: &str) -> Result<()> {
        const OP: &str = "pull-image";
        let request = self
            .client
            .post(self.url("/images/create"))
            .query(&[("fromImage", reference)]);
        let response = self.send(OP, request, self.config.pull_timeout()).await?;

        if !response.status().is_success() {
            return Err(Self::failure(OP, response).await);
        }

        // A 200 can still carry a failure inside the progress stream
        let body = Self::read_body(OP, response).await?;
        let mut last_status = None;
        for line in body.lines().filter(|l| !l.trim().is_empty()) {
            match serde_json::from_str::<PullProgress>(line) {
                Ok(PullProgress {
                    error: Some(error), ..
                }) => return Err(StackError::runtime(OP, None, error)),
                Ok(PullProgress { status, .. }) => last_status = status.or(last_status),
                Err(_) => debug!("Ignoring pull progress line: {}", line),
            }
        }

        if let Some(status) = last_status {
            debug!("Pull of {} finished: {}", reference, status);
        }
        Ok(())
    }

    async fn create_container(&self, name: &str, config: &ContainerConfig) -> Result<String> {
        const OP: &str = "create-container";
        debug!(
            "POST /containers/create?name={} {}",
            name,
            serde_json::to_string(config)?
        );

        let request = self
            .client
            .post(self.url("/containers/create"))
            .query(&[("name", name)])
            .json(config);
        let response = self.send(OP, request, self.config.request_timeout()).await?;

        if !response.status().is_success() {
            return Err(Self::failure(OP, response).await);
        }

        let body = Self::read_body(OP, response).await?;
        let created: ContainerCreateResponse = serde_json::from_str(&body)
            .map_err(|e| StackError::runtime(OP, None, format!("Unexpected response: {}", e)))?;

        for warning in created.warnings.unwrap_or_default() {
            warn!("Runtime warning for container '{}': {}", name, warning);
        }
        info!("Container '{}' created: {}", name, short_id(&created.id));
        Ok(created.id)
    }

    async fn start_container(&self, id: &str) -> Result<()> {
        const OP: &str = "start-container";
        let request = self.client.post(self.url(&format!("/containers/{}/start", id)));
        let response = self.send(OP, request, self.config.request_timeout()).await?;

        match response.status() {
            StatusCode::NO_CONTENT | StatusCode::OK => Ok(()),
            StatusCode::NOT_MODIFIED => {
                debug!("Container {} was already running", short_id(id));
                Ok(())
            }
            _ => Err(Self::failure(OP, response).await),
        }
    }
}

/// First 12 characters of a container ID
pub fn short_id(id: &str) -> &str {
    id.get(..12).unwrap_or(id)
}
