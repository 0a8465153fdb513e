//! Model registry.
//!
//! Maps public model names to provider adapters. Built once at startup and
//! read-only afterwards; every model stays registered whether or not its
//! provider has a credential.

use super::providers::{
    AnthropicTextProvider, GeminiTextProvider, OpenAiTextProvider, ProviderAdapter,
};
use crate::config::ProvidersConfig;
use reqwest::Client;
use std::fmt;

/// Public model names accepted by the API.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ModelId {
    ChatGpt,
    Gemini,
    Claude,
}

impl ModelId {
    /// Every model, in the order they are listed to clients.
    pub const ALL: [ModelId; 3] = [ModelId::ChatGpt, ModelId::Gemini, ModelId::Claude];

    pub fn as_str(&self) -> &'static str {
        match self {
            ModelId::ChatGpt => "chatgpt",
            ModelId::Gemini => "gemini",
            ModelId::Claude => "claude",
        }
    }

    /// Case-insensitive lookup of a public model name.
    pub fn from_name(name: &str) -> Option<Self> {
        let name = name.to_lowercase();
        Self::ALL.into_iter().find(|id| id.as_str() == name)
    }
}

impl fmt::Display for ModelId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug)]
pub struct ModelRegistry {
    chatgpt: ProviderAdapter,
    gemini: ProviderAdapter,
    claude: ProviderAdapter,
}

impl ModelRegistry {
    pub fn new(
        chatgpt: OpenAiTextProvider,
        gemini: GeminiTextProvider,
        claude: AnthropicTextProvider,
    ) -> Self {
        Self {
            chatgpt: ProviderAdapter::OpenAi(chatgpt),
            gemini: ProviderAdapter::Gemini(gemini),
            claude: ProviderAdapter::Anthropic(claude),
        }
    }

    /// Build all adapters over one shared HTTP client. Never fails on
    /// missing credentials.
    pub fn from_config(config: &ProvidersConfig) -> Self {
        let client = Client::new();
        let credentials = &config.credentials;

        Self::new(
            OpenAiTextProvider::new(
                config.openai.clone(),
                credentials.openai.clone(),
                client.clone(),
            ),
            GeminiTextProvider::new(
                config.gemini.clone(),
                credentials.gemini.clone(),
                client.clone(),
            ),
            AnthropicTextProvider::new(
                config.anthropic.clone(),
                credentials.anthropic.clone(),
                client,
            ),
        )
    }

    pub fn get(&self, id: ModelId) -> &ProviderAdapter {
        match id {
            ModelId::ChatGpt => &self.chatgpt,
            ModelId::Gemini => &self.gemini,
            ModelId::Claude => &self.claude,
        }
    }

    /// Case-insensitive lookup by public name.
    pub fn lookup(&self, name: &str) -> Option<&ProviderAdapter> {
        ModelId::from_name(name).map(|id| self.get(id))
    }

    pub fn contains(&self, name: &str) -> bool {
        self.lookup(name).is_some()
    }

    /// Supported names, for error messages.
    pub fn list_supported(&self) -> Vec<&'static str> {
        ModelId::ALL.iter().map(ModelId::as_str).collect()
    }
}
