//! EEG Seizure Detection Server - entry point

use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::Context;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use eeg_seizure_service::{
    classifier, config::Config, create_router, inference::SeizureDetector, AppState,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load configuration
    dotenvy::dotenv().ok();
    let config = Config::from_env();

    // Initialize logging
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "eeg_seizure_service=debug,tower_http=debug".into());
    let registry = tracing_subscriber::registry().with(filter);
    if config.json_logs {
        registry.with(tracing_subscriber::fmt::layer().json()).init();
    } else {
        registry.with(tracing_subscriber::fmt::layer()).init();
    }

    tracing::info!("EEG Seizure Server starting...");
    tracing::info!("Environment: {}", config.environment);
    if config.is_production() && config.allows_any_origin() {
        tracing::warn!("CORS accepts any origin in production");
    }

    // Load the classifier once; failure here aborts startup
    let model = classifier::load(&config.model_path, &config)?;

    let state = AppState {
        config: config.clone(),
        detector: Arc::new(SeizureDetector::new(model)),
    };

    let app = create_router(state)?;

    let addr: SocketAddr = format!("{}:{}", config.host, config.port)
        .parse()
        .with_context(|| format!("Invalid bind address {}:{}", config.host, config.port))?;
    tracing::info!("🚀 Server listening on http://{}", addr);
    tracing::info!("CORS origin: {}", config.allowed_origin);

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind {}", addr))?;
    axum::serve(listener, app).await?;

    Ok(())
}
