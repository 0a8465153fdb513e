use aggregator_service::config::AggregatorConfig;
use aggregator_service::services::metrics::init_metrics;
use aggregator_service::startup::Application;
use service_core::observability::init_tracing;

#[tokio::main]
async fn main() -> std::io::Result<()> {
    let config = AggregatorConfig::load().map_err(|e| {
        eprintln!("Failed to load configuration: {}", e);
        std::io::Error::other(format!("Configuration error: {}", e))
    })?;

    // Initialize tracing
    let otlp_endpoint = std::env::var("OTLP_ENDPOINT").ok();
    init_tracing(
        "aggregator-service",
        config.common.log_level(),
        config.common.debug,
        otlp_endpoint.as_deref(),
    );

    if let Err(e) = init_metrics() {
        tracing::warn!("Metrics disabled: {}", e);
    }

    let missing = config.providers.credentials.missing();
    if !missing.is_empty() {
        tracing::warn!(
            missing = ?missing,
            "Some provider API keys are not set; their models will answer 503"
        );
    }

    let app = Application::build(config).await.map_err(|e| {
        tracing::error!("Failed to build application: {}", e);
        std::io::Error::other(format!("Startup error: {}", e))
    })?;

    app.run_until_stopped().await
}
