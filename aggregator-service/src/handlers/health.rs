use crate::services::metrics::get_metrics;
use crate::services::providers::TextProvider;
use crate::services::ModelId;
use crate::startup::AppState;
use axum::{extract::State, http::header, http::StatusCode, response::IntoResponse, Json};
use serde_json::{json, Map, Value};

/// Liveness probe. Lists the models and whether each has a credential.
pub async fn health_check(State(state): State<AppState>) -> impl IntoResponse {
    let models: Map<String, Value> = ModelId::ALL
        .iter()
        .map(|id| {
            let adapter = state.registry.get(*id);
            (
                id.as_str().to_string(),
                json!({
                    "provider": adapter.name(),
                    "model": adapter.model(),
                    "configured": adapter.is_configured(),
                }),
            )
        })
        .collect();

    (
        StatusCode::OK,
        Json(json!({
            "status": "ok",
            "service": "aggregator-service",
            "version": env!("CARGO_PKG_VERSION"),
            "models": models,
        })),
    )
}

/// Readiness probe. The service holds no connections, so it is ready once
/// it is serving.
pub async fn readiness_check() -> impl IntoResponse {
    StatusCode::OK
}

pub async fn metrics_handler() -> impl IntoResponse {
    (
        [(header::CONTENT_TYPE, "text/plain; version=0.0.4")],
        get_metrics(),
    )
}
