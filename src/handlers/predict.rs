//! Prediction handler

use axum::{
    body::Bytes,
    extract::State,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::Value;
use uuid::Uuid;

use crate::models::{FeatureVector, Prediction};
use crate::{AppResult, AppState};

/// Classify one EEG window.
///
/// The body is parsed here rather than through the `Json` extractor so that
/// malformed bodies take the same error path as every other failure.
pub async fn predict(State(state): State<AppState>, body: Bytes) -> Response {
    let request_id = Uuid::new_v4();

    match run(&state, &body) {
        Ok(prediction) => {
            tracing::debug!(
                %request_id,
                prediction = prediction.prediction,
                status = %prediction.status,
                "Prediction served"
            );
            Json(prediction).into_response()
        }
        Err(err) => {
            tracing::error!(%request_id, "Error: {}", err);
            err.into_response_with(state.config.status_policy)
        }
    }
}

fn run(state: &AppState, body: &[u8]) -> AppResult<Prediction> {
    let body: Value = serde_json::from_slice(body)?;
    let features = FeatureVector::from_request_body(&body)?;
    state.detector.detect(&features)
}
