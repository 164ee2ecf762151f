//! Configuration module

use std::env;

use crate::error::StatusPolicy;

/// Application configuration
#[derive(Debug, Clone)]
pub struct Config {
    /// Bind address
    pub host: String,

    /// Server port
    pub port: u16,

    /// Path to the persisted classifier artifact (`.json` tree or `.onnx`)
    pub model_path: String,

    /// Single origin allowed by CORS, `*` for any
    pub allowed_origin: String,

    /// Intra-op threads for the ONNX backend
    pub onnx_threads: usize,

    /// How prediction errors map to HTTP status codes
    pub status_policy: StatusPolicy,

    /// Emit JSON log lines instead of plain text
    pub json_logs: bool,

    /// Environment (development, production)
    pub environment: String,
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Self {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build configuration from an arbitrary key lookup
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        Self {
            host: lookup("HOST")
                .unwrap_or_else(|| "0.0.0.0".to_string()),

            port: lookup("PORT")
                .and_then(|p| p.parse().ok())
                .unwrap_or(5000),

            model_path: lookup("MODEL_PATH")
                .unwrap_or_else(|| "decision_tree_model.json".to_string()),

            allowed_origin: lookup("ALLOWED_ORIGIN")
                .unwrap_or_else(|| "https://kanishk1420.github.io".to_string()),

            onnx_threads: lookup("ONNX_THREADS")
                .and_then(|t| t.parse::<usize>().ok())
                .filter(|t| *t > 0)
                .unwrap_or(1),

            status_policy: match lookup("STRICT_STATUS_CODES").and_then(|v| parse_flag(&v)) {
                Some(true) => StatusPolicy::Strict,
                _ => StatusPolicy::Uniform,
            },

            json_logs: lookup("LOG_FORMAT")
                .map(|f| f.eq_ignore_ascii_case("json"))
                .unwrap_or(false),

            environment: lookup("ENVIRONMENT")
                .unwrap_or_else(|| "development".to_string()),
        }
    }

    /// Check if running in production
    pub fn is_production(&self) -> bool {
        self.environment == "production"
    }

    /// Whether CORS should accept any origin
    pub fn allows_any_origin(&self) -> bool {
        self.allowed_origin.trim() == "*"
    }
}

fn parse_flag(value: &str) -> Option<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}
