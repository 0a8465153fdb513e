//! Completion dispatch.
//!
//! Resolves a public model name through the registry and makes exactly one
//! call to its adapter, recording the outcome.

use super::metrics::record_completion;
use super::providers::{ProviderError, TextProvider};
use super::registry::ModelRegistry;
use std::time::Instant;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum DispatchError {
    #[error("Unsupported model: {name}. Supported models are: {}", .supported.join(", "))]
    UnknownModel {
        name: String,
        supported: Vec<&'static str>,
    },

    #[error(transparent)]
    Provider(#[from] ProviderError),
}

/// Route `prompt` to the adapter registered for `model_name`.
///
/// Adapter errors pass through with their kind intact.
#[tracing::instrument(name = "dispatch", skip(registry, prompt), fields(prompt_len = prompt.len()))]
pub async fn dispatch(
    registry: &ModelRegistry,
    model_name: &str,
    prompt: &str,
) -> Result<String, DispatchError> {
    let Some(adapter) = registry.lookup(model_name) else {
        tracing::warn!("Dispatch requested for unsupported model");
        return Err(DispatchError::UnknownModel {
            name: model_name.to_string(),
            supported: registry.list_supported(),
        });
    };

    let model = model_name.to_lowercase();
    let started = Instant::now();
    let result = adapter.call(prompt).await;

    let outcome = match &result {
        Ok(_) => "success",
        Err(ProviderError::NotConfigured(_)) => "not_configured",
        Err(ProviderError::Api(_)) => "provider_error",
        Err(ProviderError::Unexpected { .. }) => "unexpected",
    };
    record_completion(&model, outcome, started.elapsed());

    tracing::info!(
        provider = adapter.name(),
        provider_model = adapter.model(),
        outcome,
        elapsed_ms = started.elapsed().as_millis() as u64,
        "Completion dispatched"
    );

    result.map_err(DispatchError::from)
}
