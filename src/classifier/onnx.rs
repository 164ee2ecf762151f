//! ONNX backend
//!
//! Runs a classifier exported to ONNX (e.g. with `skl2onnx`). The graph takes
//! one `[rows, features]` float tensor and emits an int64 label tensor.

use ndarray::Array2;
use ort::session::{Session, builder::GraphOptimizationLevel};
use ort::value::Tensor;
use parking_lot::Mutex;

use super::{float32_row_major, Classifier, ClassifierError, ModelInfo, ModelKind};
use crate::models::FeatureFrame;

/// ONNX Runtime classifier
pub struct OnnxClassifier {
    /// Running a session needs exclusive access
    session: Mutex<Session>,
    input_name: String,
    label_output: String,
    info: ModelInfo,
}

impl OnnxClassifier {
    /// Build a session from the artifact bytes
    pub fn from_bytes(path: &str, bytes: &[u8], intra_threads: usize) -> Result<Self, ClassifierError> {
        let session = Session::builder()
            .map_err(|e| ClassifierError::Backend(format!("Failed to create session builder: {}", e)))?
            .with_optimization_level(GraphOptimizationLevel::Level3)
            .map_err(|e| ClassifierError::Backend(format!("Failed to set optimization: {}", e)))?
            .with_intra_threads(intra_threads)
            .map_err(|e| ClassifierError::Backend(format!("Failed to set threads: {}", e)))?
            .commit_from_memory(bytes)
            .map_err(|e| ClassifierError::Backend(format!("Failed to load model: {}", e)))?;

        let input_name = session.inputs().first()
            .map(|i| i.name().to_string())
            .ok_or_else(|| ClassifierError::Backend("No input defined".to_string()))?;

        let label_output = pick_label_output(session.outputs().iter().map(|o| o.name()))
            .ok_or_else(|| ClassifierError::Backend("No output defined".to_string()))?;

        tracing::info!(
            input = %input_name,
            output = %label_output,
            threads = intra_threads,
            "ONNX session ready"
        );

        Ok(Self {
            session: Mutex::new(session),
            input_name,
            label_output,
            info: ModelInfo::new(path, ModelKind::Onnx, bytes, None),
        })
    }
}

impl Classifier for OnnxClassifier {
    fn predict(&self, frame: &FeatureFrame) -> Result<Vec<i64>, ClassifierError> {
        let data = float32_row_major(frame)?;
        let input_array = Array2::<f32>::from_shape_vec((frame.height(), frame.width()), data)
            .map_err(|e| ClassifierError::Backend(format!("Array error: {}", e)))?;

        let input_tensor = Tensor::from_array(input_array)
            .map_err(|e| ClassifierError::Backend(format!("Tensor error: {}", e)))?;

        let mut session = self.session.lock();
        let outputs = session
            .run(ort::inputs![self.input_name.as_str() => input_tensor])
            .map_err(|e| ClassifierError::Backend(format!("Inference failed: {}", e)))?;

        let output = outputs.get(self.label_output.as_str())
            .ok_or_else(|| ClassifierError::Backend(format!("Missing output `{}`", self.label_output)))?;

        let (_, labels) = output.try_extract_tensor::<i64>()
            .map_err(|e| ClassifierError::Backend(format!("Extract error: {}", e)))?;

        Ok(labels.to_vec())
    }

    fn info(&self) -> &ModelInfo {
        &self.info
    }
}

/// First output named like a label, otherwise the first output
fn pick_label_output<'a>(names: impl Iterator<Item = &'a str> + Clone) -> Option<String> {
    names.clone()
        .find(|n| n.contains("label"))
        .or_else(|| names.clone().next())
        .map(str::to_string)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{FeatureVector, FEATURE_COUNT};
    use tokio_test::{assert_err, assert_ok};

    /// `float_input [N, 178]` -> ArgMax(axis=1) -> `output_label [N]` (int64)
    const ARGMAX_MODEL: &[u8] = include_bytes!("../../tests/fixtures/argmax_label.onnx");

    fn argmax_classifier() -> OnnxClassifier {
        assert_ok!(OnnxClassifier::from_bytes("argmax_label.onnx", ARGMAX_MODEL, 1))
    }

    #[test]
    fn test_session_returns_int64_labels() {
        let classifier = argmax_classifier();
        assert_eq!(classifier.info().kind, ModelKind::Onnx);

        let quiet = FeatureFrame::from_vector(&FeatureVector::new());
        assert_eq!(assert_ok!(classifier.predict(&quiet)), vec![0]);

        let mut samples = vec![0.0; FEATURE_COUNT];
        samples[1] = 250.0;
        let spike = FeatureFrame::from_vector(&FeatureVector::from_slice(&samples));
        assert_eq!(assert_ok!(classifier.predict(&spike)), vec![1]);
    }

    #[test]
    fn test_session_rejects_overflowing_input() {
        let classifier = argmax_classifier();
        let frame = FeatureFrame::from_vector(&FeatureVector::from_slice(&[1e39]));
        let err = assert_err!(classifier.predict(&frame));
        assert!(matches!(err, ClassifierError::NonFinite));
    }

    #[test]
    fn test_session_reports_shape_mismatch() {
        let classifier = argmax_classifier();
        let frame = FeatureFrame::with_columns(vec!["X1".to_string()], vec![vec![1.0]]).unwrap();
        let err = assert_err!(classifier.predict(&frame));
        assert!(matches!(err, ClassifierError::Backend(_)));
    }

    #[test]
    fn test_prefers_label_output() {
        let names = ["output_probability", "output_label"];
        assert_eq!(pick_label_output(names.iter().copied()).as_deref(), Some("output_label"));
    }

    #[test]
    fn test_falls_back_to_first_output() {
        let names = ["variable", "probabilities"];
        assert_eq!(pick_label_output(names.iter().copied()).as_deref(), Some("variable"));
        assert_eq!(pick_label_output(std::iter::empty()), None);
    }
}
