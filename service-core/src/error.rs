use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::{Value, json};
use std::collections::BTreeMap;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum AppError {
    #[error("Validation error: {0}")]
    ValidationError(#[from] validator::ValidationErrors),

    /// Request body could not be parsed.
    #[error("Malformed request: {0}")]
    MalformedRequest(String),

    #[error("Unsupported media type: {0}")]
    UnsupportedMediaType(String),

    #[error("Payload too large: {0}")]
    PayloadTooLarge(String),

    #[error("Bad request: {0}")]
    BadRequest(anyhow::Error),

    #[error("Invalid host header: {0}")]
    DisallowedHost(String),

    #[error("Service unavailable: {detail}")]
    ServiceUnavailable { detail: String, code: &'static str },

    #[error("Internal server error: {0}")]
    InternalError(#[from] anyhow::Error),

    #[error("Configuration error: {0}")]
    ConfigError(anyhow::Error),
}

impl From<config::ConfigError> for AppError {
    fn from(err: config::ConfigError) -> Self {
        AppError::ConfigError(anyhow::Error::new(err))
    }
}

impl From<std::io::Error> for AppError {
    fn from(err: std::io::Error) -> Self {
        AppError::InternalError(anyhow::Error::new(err))
    }
}

/// Generic body for failures whose cause must stay server-side.
pub const SERVER_ERROR_DETAIL: &str = "A server error occurred.";

/// Render validation failures as `{ field: [messages] }`.
pub fn field_error_map(errors: &validator::ValidationErrors) -> BTreeMap<String, Vec<String>> {
    errors
        .field_errors()
        .into_iter()
        .map(|(field, errs)| {
            let messages = errs
                .iter()
                .map(|e| {
                    e.message
                        .as_ref()
                        .map(|m| m.to_string())
                        .unwrap_or_else(|| e.code.to_string())
                })
                .collect();
            (field.to_string(), messages)
        })
        .collect()
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, body): (StatusCode, Value) = match self {
            AppError::ValidationError(err) => {
                (StatusCode::BAD_REQUEST, json!(field_error_map(&err)))
            }
            AppError::MalformedRequest(msg) => (
                StatusCode::BAD_REQUEST,
                json!({ "detail": format!("JSON parse error - {}", msg) }),
            ),
            AppError::UnsupportedMediaType(msg) => {
                (StatusCode::UNSUPPORTED_MEDIA_TYPE, json!({ "detail": msg }))
            }
            AppError::PayloadTooLarge(msg) => {
                (StatusCode::PAYLOAD_TOO_LARGE, json!({ "detail": msg }))
            }
            AppError::BadRequest(err) => {
                (StatusCode::BAD_REQUEST, json!({ "error": err.to_string() }))
            }
            AppError::DisallowedHost(host) => {
                tracing::warn!(host = %host, "Rejected request with disallowed host");
                (
                    StatusCode::BAD_REQUEST,
                    json!({ "detail": "Invalid host header." }),
                )
            }
            AppError::ServiceUnavailable { detail, code } => (
                StatusCode::SERVICE_UNAVAILABLE,
                json!({ "detail": detail, "code": code }),
            ),
            AppError::InternalError(err) => {
                tracing::error!(error = ?err, "Internal server error");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    json!({ "detail": SERVER_ERROR_DETAIL }),
                )
            }
            AppError::ConfigError(err) => {
                tracing::error!(error = %err, "Configuration error");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    json!({ "detail": SERVER_ERROR_DETAIL }),
                )
            }
        };

        (status, Json(body)).into_response()
    }
}
