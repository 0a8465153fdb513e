//! AI provider adapters.
//!
//! Each provider hides one vendor's completion API behind [`TextProvider`]:
//! a prompt goes in, trimmed plain text comes out. Every failure is
//! classified into a [`ProviderError`] before it leaves the adapter.

pub mod anthropic;
pub mod gemini;
pub mod openai;

pub use anthropic::AnthropicTextProvider;
pub use gemini::GeminiTextProvider;
pub use openai::OpenAiTextProvider;

use async_trait::async_trait;
use reqwest::{RequestBuilder, StatusCode};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use thiserror::Error;

/// Error type for provider operations.
#[derive(Error, Debug)]
pub enum ProviderError {
    /// The provider's credential is absent. No request was sent.
    #[error("{0}")]
    NotConfigured(String),

    /// The provider answered with an error, a refusal or an empty payload.
    #[error("{0}")]
    Api(String),

    /// Transport failure or a body that could not be decoded. The message is
    /// generic; the cause stays in `source` and in the logs.
    #[error("An unexpected error occurred with {provider}.")]
    Unexpected {
        provider: &'static str,
        source: anyhow::Error,
    },
}

/// Uniform completion contract over one vendor API.
#[async_trait]
pub trait TextProvider: Send + Sync {
    /// Human-readable vendor name used in messages and logs.
    fn name(&self) -> &'static str;

    /// Underlying vendor model the prompt is sent to.
    fn model(&self) -> &str;

    /// Whether a credential is present. Calls fail fast when it is not.
    fn is_configured(&self) -> bool;

    /// Send `prompt` once and return the completion without surrounding
    /// whitespace.
    async fn call(&self, prompt: &str) -> Result<String, ProviderError>;
}

/// The closed set of adapters the registry can hold.
pub enum ProviderAdapter {
    OpenAi(OpenAiTextProvider),
    Gemini(GeminiTextProvider),
    Anthropic(AnthropicTextProvider),
}

impl ProviderAdapter {
    fn inner(&self) -> &dyn TextProvider {
        match self {
            ProviderAdapter::OpenAi(p) => p,
            ProviderAdapter::Gemini(p) => p,
            ProviderAdapter::Anthropic(p) => p,
        }
    }
}

#[async_trait]
impl TextProvider for ProviderAdapter {
    fn name(&self) -> &'static str {
        self.inner().name()
    }

    fn model(&self) -> &str {
        self.inner().model()
    }

    fn is_configured(&self) -> bool {
        self.inner().is_configured()
    }

    async fn call(&self, prompt: &str) -> Result<String, ProviderError> {
        self.inner().call(prompt).await
    }
}

impl std::fmt::Debug for ProviderAdapter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProviderAdapter")
            .field("provider", &self.name())
            .field("model", &self.model())
            .finish()
    }
}

pub(crate) fn not_configured(provider: &'static str) -> ProviderError {
    tracing::warn!(provider, "Rejected call: API key not configured");
    ProviderError::NotConfigured(format!("{} API key not configured.", provider))
}

/// Classify a transport or decoding failure. The URL is dropped before the
/// error is kept or logged.
pub(crate) fn unexpected(provider: &'static str, err: reqwest::Error) -> ProviderError {
    let err = err.without_url();
    tracing::error!(provider, error = %err, "Provider call failed unexpectedly");
    ProviderError::Unexpected {
        provider,
        source: anyhow::Error::new(err),
    }
}

/// Refusals, blocks and unusable payloads.
pub(crate) fn rejected(provider: &'static str, message: String) -> ProviderError {
    tracing::warn!(provider, %message, "Provider returned no usable completion");
    ProviderError::Api(message)
}

/// Error envelope shared by the supported vendors: `{"error": {"message": ..}}`.
#[derive(Debug, Deserialize)]
struct ErrorEnvelope {
    error: ErrorDetail,
}

#[derive(Debug, Deserialize)]
struct ErrorDetail {
    #[serde(default)]
    message: Option<String>,
}

const MAX_ERROR_BODY_CHARS: usize = 300;

pub(crate) fn api_error(provider: &'static str, status: StatusCode, body: &str) -> ProviderError {
    let detail = serde_json::from_str::<ErrorEnvelope>(body)
        .ok()
        .and_then(|e| e.error.message)
        .unwrap_or_else(|| body.trim().chars().take(MAX_ERROR_BODY_CHARS).collect());

    tracing::warn!(provider, status = status.as_u16(), %detail, "Provider API error");

    if detail.is_empty() {
        ProviderError::Api(format!("{} API error: {}", provider, status.as_u16()))
    } else {
        ProviderError::Api(format!(
            "{} API error {}: {}",
            provider,
            status.as_u16(),
            detail
        ))
    }
}

/// Send `request` once and decode a successful JSON body into `T`.
pub(crate) async fn send_json<T: DeserializeOwned>(
    provider: &'static str,
    request: RequestBuilder,
) -> Result<T, ProviderError> {
    let response = request
        .send()
        .await
        .map_err(|e| unexpected(provider, e))?;

    let status = response.status();
    if !status.is_success() {
        let body = response.text().await.unwrap_or_default();
        return Err(api_error(provider, status, &body));
    }

    response.json::<T>().await.map_err(|e| unexpected(provider, e))
}

/// Trim a completion, rejecting one that is empty afterwards.
pub(crate) fn finish(provider: &'static str, text: &str) -> Result<String, ProviderError> {
    let text = text.trim();
    if text.is_empty() {
        return Err(rejected(
            provider,
            format!("{} returned an empty completion.", provider),
        ));
    }
    Ok(text.to_string())
}
