//! Proxy-related errors.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors that can occur while serving a chat completion.
#[derive(Debug, Clone, Error, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "type", content = "details")]
pub enum ProxyError {
    /// Missing or invalid inbound bearer key
    #[error("Unauthorized: {message}")]
    Unauthorized { message: String },

    /// The credential pool has nothing usable
    #[error("No usable credential: {reason}")]
    CredentialExhausted { reason: String },

    /// Upstream answered 400
    #[error("Upstream rejected request (400): {body}")]
    UpstreamBadRequest { body: String },

    /// Connection, timeout or body read failure
    #[error("Transport error: {message}")]
    Transport { message: String },

    /// Upstream answered with any other non-200 status
    #[error("Upstream error: {status}")]
    UpstreamStatus { status: u16, message: String },

    /// A malformed SSE line (recovered locally, never surfaced)
    #[error("Malformed upstream event: {message}")]
    Translation { message: String },

    /// Inconsistent tool-call fragment indices (recovered locally)
    #[error("Tool-call reconstruction issue: {message}")]
    ToolAccumulation { message: String },

    /// Inbound request failed validation
    #[error("Invalid request: {message}")]
    InvalidRequest { message: String },

    /// Internal gateway error (bugs, unexpected states)
    #[error("Internal gateway error: {message}")]
    Internal { message: String },
}

impl ProxyError {
    /// Whether the attempt orchestrator may retry after this error.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::UpstreamBadRequest { .. } | Self::Transport { .. })
    }

    /// Errors that are handled where they occur and never reach the client.
    pub fn is_locally_recovered(&self) -> bool {
        matches!(self, Self::Translation { .. } | Self::ToolAccumulation { .. })
    }

    /// HTTP status used when the error is surfaced before streaming starts.
    pub fn http_status_code(&self) -> u16 {
        match self {
            Self::Unauthorized { .. } => 401,
            Self::InvalidRequest { .. } => 400,
            Self::UpstreamStatus { status, .. } => *status,
            _ => 500,
        }
    }

    /// The `error.type` tag used in the in-band error envelope.
    pub fn error_type(&self) -> &'static str {
        match self {
            Self::Unauthorized { .. } => "authentication_error",
            Self::CredentialExhausted { .. } => "credential_error",
            Self::UpstreamBadRequest { .. } | Self::UpstreamStatus { .. } => "upstream_error",
            Self::Transport { .. } => "stream_error",
            Self::InvalidRequest { .. } => "invalid_request_error",
            Self::Translation { .. } | Self::ToolAccumulation { .. } | Self::Internal { .. } => {
                "server_error"
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_retryable_classes() {
        assert!(ProxyError::UpstreamBadRequest { body: String::new() }.is_retryable());
        assert!(ProxyError::Transport { message: "reset".into() }.is_retryable());
        assert!(!ProxyError::UpstreamStatus { status: 500, message: String::new() }
            .is_retryable());
        assert!(!ProxyError::CredentialExhausted { reason: String::new() }.is_retryable());
    }

    #[test]
    fn test_status_mapping() {
        assert_eq!(ProxyError::Unauthorized { message: String::new() }.http_status_code(), 401);
        assert_eq!(
            ProxyError::CredentialExhausted { reason: String::new() }.http_status_code(),
            500
        );
        assert_eq!(
            ProxyError::UpstreamStatus { status: 503, message: String::new() }.http_status_code(),
            503
        );
    }

    #[test]
    fn test_error_type_tags() {
        assert_eq!(ProxyError::UpstreamBadRequest { body: String::new() }.error_type(), "upstream_error");
        assert_eq!(ProxyError::Transport { message: String::new() }.error_type(), "stream_error");
        assert!(ProxyError::Translation { message: String::new() }.is_locally_recovered());
    }
}
