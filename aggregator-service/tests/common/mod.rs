#![allow(dead_code)]

use aggregator_service::config::{AggregatorConfig, ProvidersConfig};
use aggregator_service::startup::Application;
use secrecy::Secret;
use service_core::config::Config as CoreConfig;
use wiremock::MockServer;

pub struct TestApp {
    pub address: String,
    /// Stands in for all three vendor APIs; their paths do not overlap.
    pub provider_server: MockServer,
    pub client: reqwest::Client,
}

impl TestApp {
    /// Spawn with every provider credential set.
    pub async fn spawn() -> Self {
        Self::spawn_with(|_| {}).await
    }

    /// Spawn after letting the caller adjust the provider settings.
    pub async fn spawn_with(customize: impl FnOnce(&mut ProvidersConfig)) -> Self {
        let provider_server = MockServer::start().await;

        let mut providers = ProvidersConfig::default();
        providers.openai.base_url = provider_server.uri();
        providers.gemini.base_url = provider_server.uri();
        providers.anthropic.base_url = provider_server.uri();
        providers.credentials.openai = Some(Secret::new("test-openai-key".to_string()));
        providers.credentials.gemini = Some(Secret::new("test-gemini-key".to_string()));
        providers.credentials.anthropic = Some(Secret::new("test-anthropic-key".to_string()));
        customize(&mut providers);

        let config = AggregatorConfig {
            common: CoreConfig {
                port: 0, // Random port for testing
                ..CoreConfig::default()
            },
            providers,
        };

        let app = Application::build(config)
            .await
            .expect("Failed to build test application");

        let port = app.port();
        let address = format!("http://127.0.0.1:{}", port);

        tokio::spawn(async move {
            app.run_until_stopped().await.ok();
        });

        // Wait for HTTP server to be ready by polling health endpoint
        let client = reqwest::Client::new();
        let health_url = format!("{}/health", address);
        for _ in 0..50 {
            if client.get(&health_url).send().await.is_ok() {
                break;
            }
            tokio::time::sleep(tokio::time::Duration::from_millis(50)).await;
        }

        TestApp {
            address,
            provider_server,
            client,
        }
    }

    pub async fn post_completion(&self, body: &serde_json::Value) -> reqwest::Response {
        self.client
            .post(format!("{}/api/endpoint/", self.address))
            .json(body)
            .send()
            .await
            .expect("Failed to send request")
    }
}
