//! Error handling

use axum::{
    response::{IntoResponse, Response},
    http::StatusCode,
    Json,
};
use serde_json::json;

use crate::classifier::ClassifierError;

pub type AppResult<T> = Result<T, AppError>;

#[derive(Debug, thiserror::Error)]
pub enum AppError {
    /// Body could not be turned into a feature vector
    #[error("{0}")]
    InvalidInput(String),

    /// Classifier rejected the frame or failed to run
    #[error(transparent)]
    Inference(#[from] ClassifierError),
}

/// Mapping from error kind to HTTP status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum StatusPolicy {
    /// Every failure is a 500
    #[default]
    Uniform,
    /// Input errors are 400, inference errors 500
    Strict,
}

impl AppError {
    pub fn status_code(&self, policy: StatusPolicy) -> StatusCode {
        match (self, policy) {
            (AppError::InvalidInput(_), StatusPolicy::Strict) => StatusCode::BAD_REQUEST,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Render as `{"error": "<message>"}` using the given status policy.
    ///
    /// The message is surfaced verbatim to the caller.
    pub fn into_response_with(self, policy: StatusPolicy) -> Response {
        let status = self.status_code(policy);
        let body = Json(json!({
            "error": self.to_string(),
        }));

        (status, body).into_response()
    }
}

impl From<serde_json::Error> for AppError {
    fn from(err: serde_json::Error) -> Self {
        AppError::InvalidInput(err.to_string())
    }
}
