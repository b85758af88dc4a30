//! Unified error types for the gateway core.

use axum::response::{IntoResponse, Response};
use serde::Serialize;
use thiserror::Error;
use zai_gateway_types::{ConfigError, ProxyError};

/// Main error type for gateway operations.
#[derive(Error, Debug)]
#[non_exhaustive]
pub enum AppError {
    /// Network request failed (HTTP client).
    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    /// File system I/O operation failed.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization/deserialization failed.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Request could not be served.
    #[error(transparent)]
    Proxy(#[from] ProxyError),

    /// Configuration loading or validation failed.
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),
}

impl Serialize for AppError {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(self.to_string().as_str())
    }
}

/// Result type alias for gateway operations.
pub type AppResult<T> = Result<T, AppError>;

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let error = self.into_proxy_error();
        tracing::debug!("Responding with error: {}", error);
        crate::proxy::handlers::error_response(&error)
    }
}

impl AppError {
    /// Collapse into the proxy taxonomy for client-facing reporting.
    pub fn into_proxy_error(self) -> ProxyError {
        match self {
            AppError::Proxy(e) => e,
            AppError::Network(e) => ProxyError::Transport { message: e.to_string() },
            other => ProxyError::Internal { message: other.to_string() },
        }
    }
}
