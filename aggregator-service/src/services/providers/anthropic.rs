//! Anthropic messages API provider.

use super::{finish, not_configured, rejected, send_json, ProviderError, TextProvider};
use crate::config::{exposed, AnthropicSettings};
use async_trait::async_trait;
use reqwest::Client;
use secrecy::Secret;
use serde::{Deserialize, Serialize};

const PROVIDER: &str = "Anthropic";
const ANTHROPIC_VERSION: &str = "2023-06-01";

pub struct AnthropicTextProvider {
    settings: AnthropicSettings,
    api_key: Option<Secret<String>>,
    client: Client,
}

impl AnthropicTextProvider {
    pub fn new(
        settings: AnthropicSettings,
        api_key: Option<Secret<String>>,
        client: Client,
    ) -> Self {
        Self {
            settings,
            api_key,
            client,
        }
    }

    fn api_url(&self) -> String {
        format!("{}/v1/messages", self.settings.base_url.trim_end_matches('/'))
    }
}

#[async_trait]
impl TextProvider for AnthropicTextProvider {
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

        let request = MessagesRequest {
            model: &self.settings.model,
            max_tokens: self.settings.max_tokens,
            messages: vec![Message {
                role: "user",
                content: prompt,
            }],
        };

        tracing::debug!(
            model = %self.settings.model,
            max_tokens = self.settings.max_tokens,
            prompt_len = prompt.len(),
            "Sending request to Anthropic API"
        );

        let response: MessagesResponse = send_json(
            PROVIDER,
            self.client
                .post(self.api_url())
                .header("x-api-key", api_key)
                .header("anthropic-version", ANTHROPIC_VERSION)
                .json(&request),
        )
        .await?;

        extract_text(response)
    }
}

fn extract_text(response: MessagesResponse) -> Result<String, ProviderError> {
    if response.stop_reason.as_deref() == Some("refusal") {
        return Err(rejected(
            PROVIDER,
            "Anthropic Claude refused the request.".to_string(),
        ));
    }

    let text = response.content.into_iter().find_map(|block| match block {
        ContentBlock::Text { text } => Some(text),
        ContentBlock::Other => None,
    });

    match text {
        Some(text) => finish(PROVIDER, &text),
        None => Err(rejected(
            PROVIDER,
            "Invalid response structure received from Anthropic.".to_string(),
        )),
    }
}

// ============================================================================
// Anthropic API Request/Response Types
// ============================================================================

#[derive(Debug, Serialize)]
struct MessagesRequest<'a> {
    model: &'a str,
    max_tokens: u32,
    messages: Vec<Message<'a>>,
}

#[derive(Debug, Serialize)]
struct Message<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Debug, Deserialize)]
struct MessagesResponse {
    #[serde(default)]
    content: Vec<ContentBlock>,
    #[serde(default)]
    stop_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum ContentBlock {
    Text {
        text: String,
    },
    #[serde(other)]
    Other,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ProvidersConfig;
    use serde_json::json;
    use wiremock::matchers::{body_partial_json, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn provider(base_url: &str, api_key: Option<&str>) -> AnthropicTextProvider {
        let mut settings = ProvidersConfig::default().anthropic;
        settings.base_url = base_url.to_string();
        AnthropicTextProvider::new(
            settings,
            api_key.map(|k| Secret::new(k.to_string())),
            Client::new(),
        )
    }

    #[tokio::test]
    async fn sends_versioned_request_and_returns_first_text_block() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v1/messages"))
            .and(header("x-api-key", "sk-ant"))
            .and(header("anthropic-version", "2023-06-01"))
            .and(body_partial_json(json!({
                "model": "claude-3-opus-20240229",
                "max_tokens": 1000,
                "messages": [{ "role": "user", "content": "hello" }]
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "id": "msg_1",
                "type": "message",
                "role": "assistant",
                "content": [
                    { "type": "thinking", "thinking": "..." },
                    { "type": "text", "text": "\n  Hello there!  " }
                ],
                "stop_reason": "end_turn"
            })))
            .expect(1)
            .mount(&server)
            .await;

        let text = provider(&server.uri(), Some("sk-ant"))
            .call("hello")
            .await
            .unwrap();
        assert_eq!(text, "Hello there!");
    }

    #[tokio::test]
    async fn refusal_stop_reason_is_a_provider_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "content": [{ "type": "text", "text": "" }],
                "stop_reason": "refusal"
            })))
            .mount(&server)
            .await;

        let err = provider(&server.uri(), Some("sk-ant"))
            .call("hi")
            .await
            .unwrap_err();
        assert!(matches!(err, ProviderError::Api(_)));
        assert_eq!(err.to_string(), "Anthropic Claude refused the request.");
    }

    #[tokio::test]
    async fn no_text_block_is_invalid_structure() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "content": [],
                "stop_reason": "end_turn"
            })))
            .mount(&server)
            .await;

        let err = provider(&server.uri(), Some("sk-ant"))
            .call("hi")
            .await
            .unwrap_err();
        assert_eq!(
            err.to_string(),
            "Invalid response structure received from Anthropic."
        );
    }

    #[tokio::test]
    async fn overloaded_api_reports_vendor_message() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(529).set_body_json(json!({
                "type": "error",
                "error": { "type": "overloaded_error", "message": "Overloaded" }
            })))
            .mount(&server)
            .await;

        let err = provider(&server.uri(), Some("sk-ant"))
            .call("hi")
            .await
            .unwrap_err();
        assert_eq!(err.to_string(), "Anthropic API error 529: Overloaded");
    }

    #[tokio::test]
    async fn missing_key_fails_without_network() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200))
            .expect(0)
            .mount(&server)
            .await;

        let err = provider(&server.uri(), None).call("hi").await.unwrap_err();
        assert!(matches!(err, ProviderError::NotConfigured(_)));
        assert_eq!(err.to_string(), "Anthropic API key not configured.");
    }
}
