use secrecy::{ExposeSecret, Secret};
use service_core::config as core_config;
use service_core::error::AppError;
use std::env;

pub const DEFAULT_OPENAI_BASE_URL: &str = "https://api.openai.com/v1";
pub const DEFAULT_GEMINI_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta";
pub const DEFAULT_ANTHROPIC_BASE_URL: &str = "https://api.anthropic.com";

const DEFAULT_OPENAI_MODEL: &str = "gpt-3.5-turbo";
const DEFAULT_GEMINI_MODEL: &str = "gemini-2.0-flash";
const DEFAULT_ANTHROPIC_MODEL: &str = "claude-3-opus-20240229";
const DEFAULT_ANTHROPIC_MAX_TOKENS: u32 = 1000;

#[derive(Debug, Clone)]
pub struct AggregatorConfig {
    pub common: core_config::Config,
    pub providers: ProvidersConfig,
}

/// Per-provider API keys. A missing key keeps the provider registered; its
/// calls fail at request time instead.
#[derive(Debug, Clone, Default)]
pub struct ProviderCredentials {
    pub openai: Option<Secret<String>>,
    pub gemini: Option<Secret<String>>,
    pub anthropic: Option<Secret<String>>,
}

impl ProviderCredentials {
    /// Names of providers without a usable key, for startup diagnostics.
    pub fn missing(&self) -> Vec<&'static str> {
        [
            ("OPENAI_API_KEY", &self.openai),
            ("GEMINI_API_KEY", &self.gemini),
            ("ANTHROPIC_API_KEY", &self.anthropic),
        ]
        .into_iter()
        .filter(|(_, key)| key.is_none())
        .map(|(name, _)| name)
        .collect()
    }
}

#[derive(Debug, Clone)]
pub struct OpenAiSettings {
    pub base_url: String,
    pub model: String,
}

#[derive(Debug, Clone)]
pub struct GeminiSettings {
    pub base_url: String,
    pub model: String,
}

#[derive(Debug, Clone)]
pub struct AnthropicSettings {
    pub base_url: String,
    pub model: String,
    pub max_tokens: u32,
}

#[derive(Debug, Clone)]
pub struct ProvidersConfig {
    pub credentials: ProviderCredentials,
    pub openai: OpenAiSettings,
    pub gemini: GeminiSettings,
    pub anthropic: AnthropicSettings,
}

impl Default for ProvidersConfig {
    fn default() -> Self {
        Self {
            credentials: ProviderCredentials::default(),
            openai: OpenAiSettings {
                base_url: DEFAULT_OPENAI_BASE_URL.to_string(),
                model: DEFAULT_OPENAI_MODEL.to_string(),
            },
            gemini: GeminiSettings {
                base_url: DEFAULT_GEMINI_BASE_URL.to_string(),
                model: DEFAULT_GEMINI_MODEL.to_string(),
            },
            anthropic: AnthropicSettings {
                base_url: DEFAULT_ANTHROPIC_BASE_URL.to_string(),
                model: DEFAULT_ANTHROPIC_MODEL.to_string(),
                max_tokens: DEFAULT_ANTHROPIC_MAX_TOKENS,
            },
        }
    }
}

impl AggregatorConfig {
    pub fn load() -> Result<Self, AppError> {
        let common = core_config::Config::load()?;
        let providers = ProvidersConfig::from_lookup(|key| env::var(key).ok())?;

        Ok(AggregatorConfig { common, providers })
    }
}

impl ProvidersConfig {
    /// Read provider settings through `lookup`, falling back to defaults.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, AppError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str, default: &str| {
            lookup(key)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
                .unwrap_or_else(|| default.to_string())
        };
        let secret = |key: &str| {
            lookup(key)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
                .map(Secret::new)
        };

        let max_tokens = get(
            "ANTHROPIC_MAX_TOKENS",
            &DEFAULT_ANTHROPIC_MAX_TOKENS.to_string(),
        );
        let max_tokens = max_tokens.parse::<u32>().map_err(|e| {
            AppError::ConfigError(anyhow::anyhow!(
                "ANTHROPIC_MAX_TOKENS must be a positive integer, got '{}': {}",
                max_tokens,
                e
            ))
        })?;

        Ok(ProvidersConfig {
            credentials: ProviderCredentials {
                openai: secret("OPENAI_API_KEY"),
                gemini: secret("GEMINI_API_KEY"),
                anthropic: secret("ANTHROPIC_API_KEY"),
            },
            openai: OpenAiSettings {
                base_url: get("OPENAI_BASE_URL", DEFAULT_OPENAI_BASE_URL),
                model: get("OPENAI_MODEL", DEFAULT_OPENAI_MODEL),
            },
            gemini: GeminiSettings {
                base_url: get("GEMINI_BASE_URL", DEFAULT_GEMINI_BASE_URL),
                model: get("GEMINI_MODEL", DEFAULT_GEMINI_MODEL),
            },
            anthropic: AnthropicSettings {
                base_url: get("ANTHROPIC_BASE_URL", DEFAULT_ANTHROPIC_BASE_URL),
                model: get("ANTHROPIC_MODEL", DEFAULT_ANTHROPIC_MODEL),
                max_tokens,
            },
        })
    }
}

/// Borrow a configured key, treating a blank secret as absent.
pub(crate) fn exposed(key: &Option<Secret<String>>) -> Option<&str> {
    key.as_ref()
        .map(|k| k.expose_secret().as_str())
        .filter(|k| !k.is_empty())
}
