//! Seizure detector - the injected inference service
//!
//! Built once at startup around a loaded classifier and shared read-only by
//! every request.

use std::sync::Arc;

use crate::classifier::{Classifier, ClassifierError, ModelInfo};
use crate::models::{FeatureFrame, FeatureVector, Prediction};
use crate::AppResult;

pub struct SeizureDetector {
    classifier: Arc<dyn Classifier>,
}

impl SeizureDetector {
    pub fn new(classifier: Arc<dyn Classifier>) -> Self {
        Self { classifier }
    }

    /// Frame the vector, run the classifier, shape the verdict
    pub fn detect(&self, features: &FeatureVector) -> AppResult<Prediction> {
        let frame = FeatureFrame::from_vector(features);

        let label = self.classifier
            .predict(&frame)?
            .first()
            .copied()
            .ok_or(ClassifierError::EmptyOutput)?;

        Ok(Prediction::from_label(label))
    }

    pub fn model_info(&self) -> &ModelInfo {
        self.classifier.info()
    }
}
