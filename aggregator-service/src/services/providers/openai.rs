//! OpenAI chat completions provider.

use super::{finish, not_configured, rejected, send_json, ProviderError, TextProvider};
use crate::config::{exposed, OpenAiSettings};
use async_trait::async_trait;
use reqwest::Client;
use secrecy::Secret;
use serde::{Deserialize, Serialize};

const PROVIDER: &str = "OpenAI";
const SYSTEM_PROMPT: &str = "You are a helpful assistant.";

pub struct OpenAiTextProvider {
    settings: OpenAiSettings,
    api_key: Option<Secret<String>>,
    client: Client,
}

impl OpenAiTextProvider {
    pub fn new(settings: OpenAiSettings, api_key: Option<Secret<String>>, client: Client) -> Self {
        Self {
            settings,
            api_key,
            client,
        }
    }

    fn api_url(&self) -> String {
        format!(
            "{}/chat/completions",
            self.settings.base_url.trim_end_matches('/')
        )
    }
}

#[async_trait]
impl TextProvider for OpenAiTextProvider {
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

        let request = ChatCompletionRequest {
            model: &self.settings.model,
            messages: vec![
                ChatMessage {
                    role: "system",
                    content: SYSTEM_PROMPT,
                },
                ChatMessage {
                    role: "user",
                    content: prompt,
                },
            ],
        };

        tracing::debug!(
            model = %self.settings.model,
            prompt_len = prompt.len(),
            "Sending request to OpenAI API"
        );

        let response: ChatCompletionResponse = send_json(
            PROVIDER,
            self.client
                .post(self.api_url())
                .bearer_auth(api_key)
                .json(&request),
        )
        .await?;

        extract_text(response)
    }
}

fn extract_text(response: ChatCompletionResponse) -> Result<String, ProviderError> {
    let Some(choice) = response.choices.into_iter().next() else {
        return Err(invalid_structure());
    };

    if let Some(refusal) = choice.message.refusal.filter(|r| !r.trim().is_empty()) {
        return Err(rejected(
            PROVIDER,
            format!("OpenAI refused the request: {}", refusal.trim()),
        ));
    }

    if choice.finish_reason.as_deref() == Some("content_filter") {
        return Err(rejected(
            PROVIDER,
            "OpenAI response was filtered: content_filter".to_string(),
        ));
    }

    match choice.message.content {
        Some(content) => finish(PROVIDER, &content),
        None => Err(invalid_structure()),
    }
}

fn invalid_structure() -> ProviderError {
    rejected(
        PROVIDER,
        "Invalid response structure received from OpenAI.".to_string(),
    )
}

// ============================================================================
// OpenAI API Request/Response Types
// ============================================================================

#[derive(Debug, Serialize)]
struct ChatCompletionRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
}

#[derive(Debug, Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Debug, Deserialize)]
struct ChatCompletionResponse {
    #[serde(default)]
    choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: ResponseMessage,
    #[serde(default)]
    finish_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ResponseMessage {
    #[serde(default)]
    content: Option<String>,
    #[serde(default)]
    refusal: Option<String>,
}
