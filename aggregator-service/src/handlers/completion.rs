//! `POST /api/endpoint/`: validate, dispatch, answer.

use crate::dtos::{CompletionRequest, CompletionResponse};
use crate::services::{dispatch, DispatchError};
use crate::startup::AppState;
use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::http::{header, HeaderMap, StatusCode};
use axum::{Extension, Json};
use serde_json::Value;
use service_core::error::AppError;
use service_core::middleware::tracing::RequestId;

/// Machine-readable code attached to every provider failure.
pub const AI_SERVICE_UNAVAILABLE: &str = "ai_service_unavailable";

impl From<DispatchError> for AppError {
    fn from(err: DispatchError) -> Self {
        match err {
            DispatchError::UnknownModel { .. } => AppError::BadRequest(anyhow::Error::new(err)),
            DispatchError::Provider(e) => AppError::ServiceUnavailable {
                detail: e.to_string(),
                code: AI_SERVICE_UNAVAILABLE,
            },
        }
    }
}

pub async fn create_completion(
    State(state): State<AppState>,
    Extension(request_id): Extension<RequestId>,
    headers: HeaderMap,
    payload: Result<Json<Value>, JsonRejection>,
) -> Result<Json<CompletionResponse>, AppError> {
    let Json(payload) = payload.map_err(|rejection| body_error(&headers, rejection))?;

    let request = CompletionRequest::from_payload(&payload, &state.registry).map_err(|e| {
        tracing::info!(errors = %e, "Rejected completion request");
        e
    })?;

    let response = dispatch(&state.registry, &request.model, &request.prompt)
        .await
        .map_err(|e| {
            tracing::warn!(
                request_id = %request_id.0,
                model = %request.model,
                error = %e,
                "Completion failed"
            );
            e
        })?;

    Ok(Json(CompletionResponse {
        model: request.model,
        response,
    }))
}

fn body_error(headers: &HeaderMap, rejection: JsonRejection) -> AppError {
    match rejection {
        JsonRejection::MissingJsonContentType(_) => {
            let content_type = headers
                .get(header::CONTENT_TYPE)
                .and_then(|v| v.to_str().ok())
                .unwrap_or("");
            AppError::UnsupportedMediaType(format!(
                "Unsupported media type \"{}\" in request.",
                content_type
            ))
        }
        JsonRejection::JsonSyntaxError(e) => AppError::MalformedRequest(e.body_text()),
        other if other.status() == StatusCode::PAYLOAD_TOO_LARGE => {
            AppError::PayloadTooLarge(other.body_text())
        }
        other => AppError::MalformedRequest(other.body_text()),
    }
}
