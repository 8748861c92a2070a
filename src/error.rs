//! Unified error types for Portico.
//!
//! Defines [`PorticoError`] (startup, CLI and config failures),
//! [`ValidationError`] for config validation problems, and [`ProxyError`]
//! for failures inside a single request-handling flow. Every
//! [`ProxyError`] is turned into the uniform `{"error": "..."}` payload by
//! [`respond_error`], which is the only place a failure becomes a response.

use std::path::PathBuf;

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize)]
pub struct ValidationError {
    pub key: String,
    pub message: String,
    pub suggestion: Option<String>,
}

impl std::fmt::Display for ValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "  {}: {}", self.key, self.message)?;
        if let Some(ref suggestion) = self.suggestion {
            write!(f, " ({suggestion})")?;
        }
        Ok(())
    }
}

impl std::error::Error for ValidationError {}

fn format_errors(errors: &[ValidationError]) -> String {
    use std::fmt::Write;
    let mut buf = String::new();
    for (i, e) in errors.iter().enumerate() {
        if i > 0 {
            buf.push('\n');
        }
        // write! to String is infallible (only fails on OOM which is unrecoverable)
        let _ = write!(buf, "{e}");
    }
    buf
}

#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum PorticoError {
    #[error("No config source found.\n\n  {hint}")]
    NoConfigSource { hint: String },

    #[error("Config file not found: {}", path.display())]
    ConfigFileNotFound { path: PathBuf },

    #[error("Config parse error in {path}:\n  {source}")]
    ConfigParse {
        path: String,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    #[error("Config validation failed:\n{}", format_errors(.errors))]
    ConfigValidation { errors: Vec<ValidationError> },

    #[error("Unsupported config format: '{0}'")]
    UnsupportedFormat(String),

    #[error("Invalid address: {0}")]
    AddressParse(#[from] std::net::AddrParseError),

    #[error("Invalid URI: {source}")]
    UriParse {
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    #[error("HTTP request failed: {source}")]
    HttpRequest {
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    #[error("File already exists: {}", path.display())]
    FileExists { path: PathBuf },

    #[error("{0}")]
    Io(#[from] std::io::Error),

    #[error("Health check failed with status {0}")]
    HealthCheckFailed(hyper::StatusCode),
}

/// Failure of the outbound exchange with a backend.
///
/// A backend that answers with any status code, 4xx and 5xx included, is
/// not a transport failure.
#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    #[error("upstream request to {url} timed out after {timeout_ms} ms")]
    Timeout { url: String, timeout_ms: u64 },

    #[error("upstream request to {url} failed: {reason}")]
    Connect { url: String, reason: String },

    #[error("failed to read upstream response from {url}: {reason}")]
    Body { url: String, reason: String },

    #[error("upstream response from {url} exceeds {limit} bytes")]
    BodyTooLarge { url: String, limit: usize },
}

#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum ProxyError {
    #[error("Invalid path: an endpoint name is required")]
    InvalidPath,

    #[error("Endpoint not found: {0}")]
    UnknownEndpoint(String),

    #[error("No route for path: {0}")]
    OutsideMount(String),

    #[error("Service '{service}' for endpoint '{endpoint}' is not configured")]
    MissingServiceConfig { endpoint: String, service: String },

    #[error("Invalid target URL '{url}': {reason}")]
    InvalidTargetUrl { url: String, reason: String },

    #[error("Method not allowed: {0}")]
    UnsupportedMethod(String),

    #[error("Failed to read request body: {0}")]
    BodyRead(String),

    #[error("Request body exceeds {limit} bytes")]
    PayloadTooLarge { limit: usize },

    #[error(transparent)]
    Transport(#[from] TransportError),
}

impl ProxyError {
    #[must_use]
    pub const fn status(&self) -> StatusCode {
        match self {
            Self::InvalidPath | Self::BodyRead(_) => StatusCode::BAD_REQUEST,
            Self::UnknownEndpoint(_) | Self::OutsideMount(_) => StatusCode::NOT_FOUND,
            Self::UnsupportedMethod(_) => StatusCode::METHOD_NOT_ALLOWED,
            Self::PayloadTooLarge { .. } => StatusCode::PAYLOAD_TOO_LARGE,
            Self::MissingServiceConfig { .. } | Self::InvalidTargetUrl { .. } => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
            Self::Transport(TransportError::Timeout { .. }) => StatusCode::GATEWAY_TIMEOUT,
            Self::Transport(_) => StatusCode::BAD_GATEWAY,
        }
    }
}

impl IntoResponse for ProxyError {
    fn into_response(self) -> Response {
        respond_error(self.status(), self.to_string())
    }
}

/// Body of every error response emitted by the gateway.
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorBody {
    pub error: String,
}

/// Build a `{"error": "<message>"}` response with `Content-Type: application/json`.
pub fn respond_error(status: StatusCode, message: impl Into<String>) -> Response {
    let body = ErrorBody {
        error: message.into(),
    };
    (status, Json(body)).into_response()
}

#[cfg(test)]
mod tests {
    use super::*;
    use http_body_util::BodyExt;

    #[test]
    fn routing_errors_map_to_client_statuses() {
        assert_eq!(ProxyError::InvalidPath.status(), StatusCode::BAD_REQUEST);
        assert_eq!(
            ProxyError::UnknownEndpoint("x".into()).status(),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            ProxyError::UnsupportedMethod("PATCH".into()).status(),
            StatusCode::METHOD_NOT_ALLOWED
        );
    }

    #[test]
    fn config_inconsistency_is_a_server_error() {
        let err = ProxyError::MissingServiceConfig {
            endpoint: "login".into(),
            service: "users".into(),
        };
        assert_eq!(err.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[test]
    fn timeout_is_distinguished_from_connect_failure() {
        let timeout = ProxyError::from(TransportError::Timeout {
            url: "http://a".into(),
            timeout_ms: 10,
        });
        let refused = ProxyError::from(TransportError::Connect {
            url: "http://a".into(),
            reason: "connection refused".into(),
        });
        assert_eq!(timeout.status(), StatusCode::GATEWAY_TIMEOUT);
        assert_eq!(refused.status(), StatusCode::BAD_GATEWAY);
    }

    #[test]
    fn unknown_endpoint_message_names_the_endpoint() {
        let err = ProxyError::UnknownEndpoint("unknown".into());
        assert_eq!(err.to_string(), "Endpoint not found: unknown");
    }

    #[tokio::test]
    async fn respond_error_writes_json_payload() {
        let response = respond_error(StatusCode::NOT_FOUND, "Endpoint not found: unknown");
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        assert_eq!(
            response.headers().get("content-type").unwrap(),
            "application/json"
        );

        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        let body: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(body, serde_json::json!({"error": "Endpoint not found: unknown"}));
    }

    #[test]
    fn validation_error_display_includes_suggestion() {
        let err = ValidationError {
            key: "endpoints.login".into(),
            message: "service 'Users' is not declared".into(),
            suggestion: Some("did you mean 'users'?".into()),
        };
        assert_eq!(
            err.to_string(),
            "  endpoints.login: service 'Users' is not declared (did you mean 'users'?)"
        );
    }
}
