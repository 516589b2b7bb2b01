//! Error types for stackup

use thiserror::Error;

/// Result type for stackup operations
pub type Result<T> = std::result::Result<T, StackError>;

/// stackup error types
#[derive(Error, Debug)]
pub enum StackError {
    #[error("Compose file parse error: {0}")]
    ManifestParse(String),

    #[error("Invalid duration: {0}")]
    InvalidDuration(String),

    #[error("Service '{service}' has a malformed {field} entry: {entry}")]
    MalformedEntry {
        service: String,
        field: &'static str,
        entry: String,
    },

    #[error("Invalid healthcheck: {0}")]
    InvalidHealthcheck(String),

    #[error("Service '{0}' has no image")]
    MissingImage(String),

    #[error(
        "Runtime {} failed{}: {}",
        .operation,
        .status.map(|s| format!(" ({})", s)).unwrap_or_default(),
        .message
    )]
    Runtime {
        operation: &'static str,
        status: Option<u16>,
        message: String,
    },

    #[error("Timeout: {0}")]
    Timeout(String),

    #[error("HTTP error: {0}")]
    Http(String),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
}

impl StackError {
    /// Build a runtime call error
    pub fn runtime(operation: &'static str, status: Option<u16>, message: impl Into<String>) -> Self {
        StackError::Runtime {
            operation,
            status,
            message: message.into(),
        }
    }

    /// Whether this error came from a runtime call (including timeouts)
    pub fn is_runtime_call(&self) -> bool {
        matches!(
            self,
            StackError::Runtime { .. } | StackError::Timeout(_) | StackError::Http(_)
        )
    }
}
