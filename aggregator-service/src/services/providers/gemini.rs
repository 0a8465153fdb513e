//! Gemini AI provider implementation.
//!
//! Implements text generation using Google's Gemini `generateContent` API.
//! The API key travels in the `x-goog-api-key` header so it never appears in
//! a URL, and therefore never in a logged transport error.

use super::{not_configured, rejected, send_json, ProviderError, TextProvider};
use crate::config::{exposed, GeminiSettings};
use async_trait::async_trait;
use reqwest::Client;
use secrecy::Secret;
use serde::{Deserialize, Serialize};

const PROVIDER: &str = "Gemini";

/// Finish reasons meaning the candidate was withheld rather than completed.
const BLOCKED_FINISH_REASONS: &[&str] = &[
    "SAFETY",
    "RECITATION",
    "BLOCKLIST",
    "PROHIBITED_CONTENT",
    "SPII",
];

/// Gemini text provider.
pub struct GeminiTextProvider {
    settings: GeminiSettings,
    api_key: Option<Secret<String>>,
    client: Client,
}

impl GeminiTextProvider {
    pub fn new(settings: GeminiSettings, api_key: Option<Secret<String>>, client: Client) -> Self {
        Self {
            settings,
            api_key,
            client,
        }
    }

    /// Build the API URL for the configured model and the given method.
    fn api_url(&self, method: &str) -> String {
        format!(
            "{}/models/{}:{}",
            self.settings.base_url.trim_end_matches('/'),
            self.settings.model,
            method
        )
    }
}

#[async_trait]
impl TextProvider for GeminiTextProvider {
    fn name(&self) -> &'static str {
        PROVIDER
    }

    fn model(&self) -> &str {
        &self.settings.model
    }

    fn is_configured(&self) -> bool {
        exposed(&self.api_key).is_some()
    }

    async fn call(&self, prompt: &str) -> Result<String, ProviderError> {
        let api_key = exposed(&self.api_key).ok_or_else(|| not_configured(PROVIDER))?;

        let request = GenerateContentRequest {
            contents: vec![RequestContent {
                role: "user",
                parts: vec![RequestPart { text: prompt }],
            }],
        };

        tracing::debug!(
            model = %self.settings.model,
            prompt_len = prompt.len(),
            "Sending request to Gemini API"
        );

        let response: GenerateContentResponse = send_json(
            PROVIDER,
            self.client
                .post(self.api_url("generateContent"))
                .header("x-goog-api-key", api_key)
                .json(&request),
        )
        .await?;

        extract_text(response)
    }
}

fn extract_text(response: GenerateContentResponse) -> Result<String, ProviderError> {
    let block_reason = response
        .prompt_feedback
        .and_then(|feedback| feedback.block_reason);

    let Some(candidate) = response.candidates.into_iter().next() else {
        return Err(match block_reason {
            Some(reason) => rejected(PROVIDER, format!("Gemini request blocked: {}", reason)),
            None => unexpected_structure(),
        });
    };

    if let Some(reason) = candidate
        .finish_reason
        .as_deref()
        .filter(|r| BLOCKED_FINISH_REASONS.contains(r))
    {
        return Err(rejected(
            PROVIDER,
            format!("Gemini response blocked: {}", reason),
        ));
    }

    // Concatenate text parts the way the SDK's `text` accessor does,
    // leaving out thought summaries.
    let text: String = candidate
        .content
        .map(|content| content.parts)
        .unwrap_or_default()
        .into_iter()
        .filter(|part| !part.thought.unwrap_or(false))
        .filter_map(|part| part.text)
        .collect();

    let text = text.trim();
    if text.is_empty() {
        return Err(unexpected_structure());
    }
    Ok(text.to_string())
}

fn unexpected_structure() -> ProviderError {
    rejected(
        PROVIDER,
        "Unexpected response structure from Gemini.".to_string(),
    )
}

// ============================================================================
// Gemini API Request/Response Types
// ============================================================================

#[derive(Debug, Serialize)]
struct GenerateContentRequest<'a> {
    contents: Vec<RequestContent<'a>>,
}

#[derive(Debug, Serialize)]
struct RequestContent<'a> {
    role: &'a str,
    parts: Vec<RequestPart<'a>>,
}

#[derive(Debug, Serialize)]
struct RequestPart<'a> {
    text: &'a str,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GenerateContentResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
    #[serde(default)]
    prompt_feedback: Option<PromptFeedback>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Candidate {
    #[serde(default)]
    content: Option<ResponseContent>,
    #[serde(default)]
    finish_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ResponseContent {
    #[serde(default)]
    parts: Vec<ResponsePart>,
}

#[derive(Debug, Deserialize)]
struct ResponsePart {
    #[serde(default)]
    text: Option<String>,
    #[serde(default)]
    thought: Option<bool>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PromptFeedback {
    #[serde(default)]
    block_reason: Option<String>,
}
