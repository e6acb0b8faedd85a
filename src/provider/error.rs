//! # Gateway Errors
//!
//! Errors returned by [`super::CloudGateway`] implementations.
//!
//! GCP REST APIs report failures in a standard envelope
//! (`{"error": {"code", "message", "status"}}`). Conflict and not-found are
//! split out because the pipeline treats them differently from every other
//! failure.

use serde::Deserialize;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum GatewayError {
    /// HTTP 404 / `NOT_FOUND`
    #[error("not found: {message}")]
    NotFound { message: String },

    /// HTTP 409 / `ALREADY_EXISTS`
    #[error("already exists: {message}")]
    Conflict { message: String },

    /// Any other error status reported by the API
    #[error("GCP API error: {message} (code: {code}, status: {status})")]
    Api {
        code: u16,
        status: String,
        message: String,
    },

    /// Could not obtain an access token
    #[error("authentication failed: {0}")]
    Auth(String),

    /// Request never produced an HTTP response
    #[error("HTTP transport error: {0}")]
    Transport(#[from] reqwest::Error),

    /// Response body did not have the expected shape
    #[error("unexpected response from {operation}: {message}")]
    Decode {
        operation: &'static str,
        message: String,
    },
}

#[derive(Debug, Deserialize)]
struct GcpErrorResponse {
    error: GcpErrorBody,
}

#[derive(Debug, Deserialize)]
struct GcpErrorBody {
    #[serde(default)]
    code: u16,
    #[serde(default)]
    message: String,
    #[serde(default)]
    status: String,
}

impl GatewayError {
    /// Classify an error response by status code and body
    #[must_use]
    pub fn from_response(status: u16, body: &str) -> Self {
        let (code, api_status, message) =
            match serde_json::from_str::<GcpErrorResponse>(body) {
                Ok(parsed) => {
                    let code = if parsed.error.code == 0 {
                        status
                    } else {
                        parsed.error.code
                    };
                    (code, parsed.error.status, parsed.error.message)
                }
                // Not the standard envelope, keep the raw text for diagnostics
                Err(_) => (status, String::new(), body.trim().to_string()),
            };

        match code {
            404 => Self::NotFound { message },
            409 => Self::Conflict { message },
            _ => Self::Api {
                code,
                status: api_status,
                message,
            },
        }
    }

    #[must_use]
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }

    #[must_use]
    pub fn is_conflict(&self) -> bool {
        matches!(self, Self::Conflict { .. })
    }

    /// Short label for metrics
    #[must_use]
    pub fn kind(&self) -> &'static str {
        match self {
            Self::NotFound { .. } => "not_found",
            Self::Conflict { .. } => "conflict",
            Self::Api { .. } => "api",
            Self::Auth(_) => "auth",
            Self::Transport(_) => "transport",
            Self::Decode { .. } => "decode",
        }
    }
}
