//! EEG Seizure Detection - Inference API Server
//!
//! Serves a pre-trained seizure classifier over HTTP.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                  EEG SEIZURE SERVICE                        │
//! ├─────────────────────────────────────────────────────────────┤
//! │  POST /predict                                              │
//! │     │  {"features": [...]}                                  │
//! │     ▼                                                       │
//! │  ┌─────────────┐   ┌─────────────┐   ┌──────────────────┐  │
//! │  │ Coerce to   │──▶│ Frame       │──▶│ Classifier       │  │
//! │  │ 178 values  │   │ X1..X178    │   │ (tree / ONNX)    │  │
//! │  └─────────────┘   └─────────────┘   └────────┬─────────┘  │
//! │                                               ▼             │
//! │                        {"prediction", "status"} / {"error"} │
//! └─────────────────────────────────────────────────────────────┘
//! ```

pub mod classifier;
pub mod config;
pub mod error;
pub mod handlers;
pub mod inference;
pub mod models;

use std::sync::Arc;

use anyhow::Context;
use axum::{
    Router,
    http::{header, HeaderValue, Method},
    routing::{get, post},
};
use tower_http::{
    cors::{AllowOrigin, CorsLayer},
    trace::TraceLayer,
    compression::CompressionLayer,
};

pub use error::{AppError, AppResult};

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    pub config: config::Config,
    pub detector: Arc<inference::SeizureDetector>,
}

/// Create the main router with all routes
pub fn create_router(state: AppState) -> anyhow::Result<Router> {
    let cors = cors_layer(&state.config)?;

    let router = Router::new()
        .route("/health", get(handlers::health::check))
        .route("/predict", post(handlers::predict::predict))
        .layer(CompressionLayer::new())
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state);

    Ok(router)
}

/// CORS restricted to the configured origin
fn cors_layer(config: &config::Config) -> anyhow::Result<CorsLayer> {
    let origin = if config.allows_any_origin() {
        AllowOrigin::any()
    } else {
        let value = HeaderValue::from_str(config.allowed_origin.trim())
            .with_context(|| format!("Invalid ALLOWED_ORIGIN: {}", config.allowed_origin))?;
        AllowOrigin::list([value])
    };

    Ok(CorsLayer::new()
        .allow_origin(origin)
        .allow_methods([Method::GET, Method::POST])
        .allow_headers([header::CONTENT_TYPE]))
}
