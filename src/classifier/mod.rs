//! Classifier Module - persisted model backends
//!
//! The service treats the trained model as an opaque, read-only classifier.
//! Two artifact formats are supported:
//!
//! - `.json`: a fitted decision tree exported node by node, evaluated natively
//! - `.onnx`: any ONNX graph with a label output, evaluated by ONNX Runtime
//!
//! Loading happens once at startup; a missing or corrupt artifact is fatal.

pub mod onnx;
pub mod tree;

use std::path::Path;
use std::sync::Arc;

use anyhow::Context;
use chrono::{DateTime, Utc};
use serde::Serialize;
use sha2::{Digest, Sha256};

use crate::config::Config;
use crate::models::FeatureFrame;

pub use onnx::OnnxClassifier;
pub use tree::DecisionTree;

// ============================================================================
// ERROR HANDLING
// ============================================================================

#[derive(Debug, thiserror::Error)]
pub enum ClassifierError {
    /// Frame width differs from the fitted feature count
    #[error("X has {got} features, but {model} is expecting {expected} features as input.")]
    FeatureCount {
        model: &'static str,
        got: usize,
        expected: usize,
    },

    /// Frame columns differ from the names seen during fit
    #[error("The feature names should match those that were passed during fit.")]
    FeatureNames,

    /// Value overflows or is not finite once narrowed to float32
    #[error("Input X contains infinity or a value too large for dtype('float32').")]
    NonFinite,

    /// Model produced no label for the frame
    #[error("Classifier returned no prediction")]
    EmptyOutput,

    /// Backend runtime failure
    #[error("{0}")]
    Backend(String),
}

/// Narrow the frame to float32, rejecting values that do not survive the cast
pub fn float32_row_major(frame: &FeatureFrame) -> Result<Vec<f32>, ClassifierError> {
    frame
        .rows()
        .iter()
        .flatten()
        .map(|v| {
            let x = *v as f32;
            if x.is_finite() { Ok(x) } else { Err(ClassifierError::NonFinite) }
        })
        .collect()
}

// ============================================================================
// CLASSIFIER TRAIT
// ============================================================================

/// Trait for classifier backends (decision tree, ONNX, test doubles)
pub trait Classifier: Send + Sync {
    /// One label per frame row
    fn predict(&self, frame: &FeatureFrame) -> Result<Vec<i64>, ClassifierError>;

    fn info(&self) -> &ModelInfo;
}

/// Artifact format
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ModelKind {
    DecisionTree,
    Onnx,
}

impl ModelKind {
    /// Pick the backend from the artifact file extension
    pub fn from_path(path: &Path) -> Self {
        match path.extension().and_then(|e| e.to_str()) {
            Some(ext) if ext.eq_ignore_ascii_case("onnx") => ModelKind::Onnx,
            _ => ModelKind::DecisionTree,
        }
    }
}

/// Model metadata
#[derive(Debug, Clone, Serialize)]
pub struct ModelInfo {
    pub path: String,
    pub kind: ModelKind,
    pub sha256: String,
    /// Expected feature count, when the artifact declares one
    pub n_features: Option<usize>,
    pub loaded_at: DateTime<Utc>,
}

impl ModelInfo {
    pub fn new(path: impl Into<String>, kind: ModelKind, bytes: &[u8], n_features: Option<usize>) -> Self {
        Self {
            path: path.into(),
            kind,
            sha256: checksum(bytes),
            n_features,
            loaded_at: Utc::now(),
        }
    }
}

/// Hex SHA-256 of the artifact bytes
pub fn checksum(bytes: &[u8]) -> String {
    hex::encode(Sha256::digest(bytes))
}

// ============================================================================
// LOADING
// ============================================================================

/// Load the configured artifact into a shared classifier
pub fn load(path: impl AsRef<Path>, config: &Config) -> anyhow::Result<Arc<dyn Classifier>> {
    let path = path.as_ref();
    let kind = ModelKind::from_path(path);

    tracing::info!("Loading {:?} model from: {}", kind, path.display());

    let bytes = std::fs::read(path)
        .with_context(|| format!("Model not found: {}", path.display()))?;

    let classifier: Arc<dyn Classifier> = match kind {
        ModelKind::DecisionTree => Arc::new(
            DecisionTree::from_json_bytes(&path.display().to_string(), &bytes)
                .with_context(|| format!("Failed to load decision tree from {}", path.display()))?,
        ),
        ModelKind::Onnx => Arc::new(
            OnnxClassifier::from_bytes(&path.display().to_string(), &bytes, config.onnx_threads)
                .with_context(|| format!("Failed to load ONNX model from {}", path.display()))?,
        ),
    };

    let info = classifier.info();
    tracing::info!(
        kind = ?info.kind,
        sha256 = %info.sha256,
        n_features = ?info.n_features,
        "Model loaded successfully"
    );

    Ok(classifier)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tokio_test::assert_ok;

    #[test]
    fn test_kind_from_extension() {
        assert_eq!(ModelKind::from_path(Path::new("m/tree.onnx")), ModelKind::Onnx);
        assert_eq!(ModelKind::from_path(Path::new("m/tree.ONNX")), ModelKind::Onnx);
        assert_eq!(ModelKind::from_path(Path::new("m/tree.json")), ModelKind::DecisionTree);
        assert_eq!(ModelKind::from_path(Path::new("m/tree")), ModelKind::DecisionTree);
    }

    #[test]
    fn test_checksum_is_sha256_hex() {
        assert_eq!(
            checksum(b"abc"),
            "ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad"
        );
    }

    #[test]
    fn test_float32_narrowing() {
        let frame = |v: f64| FeatureFrame::with_columns(vec!["x".into()], vec![vec![v]]).unwrap();

        assert_eq!(assert_ok!(float32_row_major(&frame(0.5))), vec![0.5f32]);
        assert_eq!(assert_ok!(float32_row_major(&frame(-3.0e38))), vec![-3.0e38f32]);
        for bad in [1e39, -1e39, f64::INFINITY, f64::NAN] {
            assert!(matches!(float32_row_major(&frame(bad)), Err(ClassifierError::NonFinite)));
        }
    }

    #[test]
    fn test_missing_artifact_is_fatal() {
        let config = Config::from_lookup(|_| None);
        let err = load("/nonexistent/decision_tree_model.json", &config)
            .err()
            .expect("load should fail");
        assert!(err.to_string().contains("Model not found"));
    }

    #[test]
    fn test_corrupt_artifact_is_fatal() {
        let mut file = tempfile::Builder::new().suffix(".json").tempfile().unwrap();
        file.write_all(b"{ not json").unwrap();

        let config = Config::from_lookup(|_| None);
        assert!(load(file.path(), &config).is_err());
    }

    #[test]
    fn test_loads_tree_artifact() {
        let mut file = tempfile::Builder::new().suffix(".json").tempfile().unwrap();
        file.write_all(tree::tests::STUMP_JSON.as_bytes()).unwrap();

        let config = Config::from_lookup(|_| None);
        let classifier = assert_ok!(load(file.path(), &config));
        let info = classifier.info();

        assert_eq!(info.kind, ModelKind::DecisionTree);
        assert_eq!(info.n_features, Some(2));
        assert_eq!(info.sha256, checksum(tree::tests::STUMP_JSON.as_bytes()));
    }
}
