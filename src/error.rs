//! Domain-specific error types for logo-verify

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;
use thiserror::Error;

/// Main error type for the logo-verify service
#[derive(Error, Debug)]
pub enum LogoVerifyError {
    #[error("Configuration error: {message}")]
    Config { message: String },

    #[error("Validation error: {message}")]
    Validation { message: String },

    #[error("Payload too large: {message}")]
    PayloadTooLarge { message: String },

    #[error("Inference error: {message}")]
    Inference { message: String },

    #[error("Store error: {message}")]
    Store { message: String },

    #[error("Serialization error: {message}")]
    Serialization { message: String },

    #[error("I/O error: {message}")]
    Io { message: String },

    #[error("Internal error: {message}")]
    Internal { message: String },
}

impl LogoVerifyError {
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
        }
    }

    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation {
            message: message.into(),
        }
    }

    pub fn payload_too_large(message: impl Into<String>) -> Self {
        Self::PayloadTooLarge {
            message: message.into(),
        }
    }

    pub fn inference(message: impl Into<String>) -> Self {
        Self::Inference {
            message: message.into(),
        }
    }

    pub fn store(message: impl Into<String>) -> Self {
        Self::Store {
            message: message.into(),
        }
    }
}

impl From<anyhow::Error> for LogoVerifyError {
    fn from(err: anyhow::Error) -> Self {
        LogoVerifyError::Internal {
            message: err.to_string(),
        }
    }
}

impl From<serde_json::Error> for LogoVerifyError {
    fn from(err: serde_json::Error) -> Self {
        LogoVerifyError::Serialization {
            message: err.to_string(),
        }
    }
}

impl From<surrealdb::Error> for LogoVerifyError {
    fn from(err: surrealdb::Error) -> Self {
        LogoVerifyError::Store {
            message: err.to_string(),
        }
    }
}

impl From<reqwest::Error> for LogoVerifyError {
    fn from(err: reqwest::Error) -> Self {
        LogoVerifyError::Inference {
            message: format!("HTTP request failed: {}", err),
        }
    }
}

impl From<std::io::Error> for LogoVerifyError {
    fn from(err: std::io::Error) -> Self {
        LogoVerifyError::Io {
            message: err.to_string(),
        }
    }
}

/// Convert LogoVerifyError to an HTTP response with a `{ "error": ... }` body.
///
/// Validation and configuration messages are returned verbatim. Failures of
/// external calls are logged in full and replaced by a generic message.
impl IntoResponse for LogoVerifyError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            LogoVerifyError::Validation { message } => (StatusCode::BAD_REQUEST, message),
            LogoVerifyError::PayloadTooLarge { message } => (StatusCode::PAYLOAD_TOO_LARGE, message),
            LogoVerifyError::Config { message } => {
                tracing::error!("Configuration error: {}", message);
                (StatusCode::INTERNAL_SERVER_ERROR, message)
            }
            LogoVerifyError::Inference { message } => {
                tracing::error!("Logo analysis failed: {}", message);
                (
                    StatusCode::BAD_GATEWAY,
                    "Failed to analyze the logo. Please try again.".to_string(),
                )
            }
            LogoVerifyError::Store { message } => {
                tracing::error!("Report write failed: {}", message);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Failed to submit the report. Please try again.".to_string(),
                )
            }
            LogoVerifyError::Serialization { message }
            | LogoVerifyError::Io { message }
            | LogoVerifyError::Internal { message } => {
                tracing::error!("Internal error: {}", message);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Internal server error".to_string(),
                )
            }
        };

        (status, Json(json!({ "error": message }))).into_response()
    }
}

/// Result type alias for logo-verify operations
pub type Result<T> = std::result::Result<T, LogoVerifyError>;
