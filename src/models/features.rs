//! Feature vector and frame - model input structures
//!
//! A request carries an arbitrary-length list of EEG amplitudes. The
//! classifier was fitted on exactly [`FEATURE_COUNT`] columns named
//! `X1`..`X178`, so every request is coerced into that shape:
//!
//! - shorter lists are zero-padded on the right
//! - longer lists are cut to the first [`FEATURE_COUNT`] values
//!
//! Only the kept prefix is converted to numbers; trailing entries are
//! discarded before they are ever looked at. Booleans count as `1`/`0`.

use serde_json::Value;

use crate::{AppError, AppResult};

/// Number of samples per EEG window the model was trained on
pub const FEATURE_COUNT: usize = 178;

/// Request field holding the raw samples
pub const FEATURES_FIELD: &str = "features";

// ============================================================================
// FEATURE VECTOR
// ============================================================================

/// Fixed-length EEG feature vector
#[derive(Debug, Clone, PartialEq)]
pub struct FeatureVector {
    values: [f64; FEATURE_COUNT],
}

impl FeatureVector {
    /// Zeroed vector
    pub fn new() -> Self {
        Self {
            values: [0.0; FEATURE_COUNT],
        }
    }

    /// Create from a slice of any length (pads or truncates)
    pub fn from_slice(samples: &[f64]) -> Self {
        let mut vector = Self::new();
        for (slot, value) in vector.values.iter_mut().zip(samples) {
            *slot = *value;
        }
        vector
    }

    /// Extract and coerce the `features` array of a request body
    pub fn from_request_body(body: &Value) -> AppResult<Self> {
        let object = body.as_object().ok_or_else(|| {
            AppError::InvalidInput(format!(
                "request body must be a JSON object, got {}",
                json_type_name(body)
            ))
        })?;

        let features = object
            .get(FEATURES_FIELD)
            .ok_or_else(|| AppError::InvalidInput(format!("missing field `{}`", FEATURES_FIELD)))?;

        let samples = features.as_array().ok_or_else(|| {
            AppError::InvalidInput(format!(
                "`{}` must be an array, got {}",
                FEATURES_FIELD,
                json_type_name(features)
            ))
        })?;

        Self::from_json_samples(samples)
    }

    /// Coerce raw JSON samples; only the first [`FEATURE_COUNT`] are inspected
    pub fn from_json_samples(samples: &[Value]) -> AppResult<Self> {
        let prefix = samples
            .iter()
            .take(FEATURE_COUNT)
            .enumerate()
            .map(|(i, sample)| {
                sample_as_f64(sample).ok_or_else(|| {
                    AppError::InvalidInput(format!(
                        "could not convert element {} to float: {}",
                        i, sample
                    ))
                })
            })
            .collect::<AppResult<Vec<f64>>>()?;

        Ok(Self::from_slice(&prefix))
    }

    /// Get values as slice
    pub fn as_slice(&self) -> &[f64] {
        &self.values
    }
}

impl Default for FeatureVector {
    fn default() -> Self {
        Self::new()
    }
}

fn sample_as_f64(sample: &Value) -> Option<f64> {
    match sample {
        Value::Bool(b) => Some(if *b { 1.0 } else { 0.0 }),
        other => other.as_f64(),
    }
}

fn json_type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

// ============================================================================
// FEATURE FRAME
// ============================================================================

/// Positional column name for a zero-based feature index (`X1`..`X178`)
pub fn column_name(index: usize) -> String {
    format!("X{}", index + 1)
}

/// Column names of the training schema, in order
pub fn column_names() -> Vec<String> {
    (0..FEATURE_COUNT).map(column_name).collect()
}

/// Row-major table with named columns, as handed to a classifier
#[derive(Debug, Clone, PartialEq)]
pub struct FeatureFrame {
    columns: Vec<String>,
    rows: Vec<Vec<f64>>,
}

impl FeatureFrame {
    /// Single-row frame over the `X1`..`X178` schema
    pub fn from_vector(vector: &FeatureVector) -> Self {
        Self {
            columns: column_names(),
            rows: vec![vector.as_slice().to_vec()],
        }
    }

    /// Frame with explicit columns; every row must be as wide as `columns`
    pub fn with_columns(columns: Vec<String>, rows: Vec<Vec<f64>>) -> Option<Self> {
        if rows.iter().any(|row| row.len() != columns.len()) {
            return None;
        }
        Some(Self { columns, rows })
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn rows(&self) -> &[Vec<f64>] {
        &self.rows
    }

    pub fn width(&self) -> usize {
        self.columns.len()
    }

    pub fn height(&self) -> usize {
        self.rows.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use tokio_test::{assert_err, assert_ok};

    fn body_with(len: usize) -> Value {
        let samples: Vec<f64> = (0..len).map(|i| i as f64 + 0.5).collect();
        json!({ "features": samples })
    }

    #[test]
    fn test_short_input_is_zero_padded() {
        let vector = assert_ok!(FeatureVector::from_request_body(&json!({
            "features": [0.1, 0.2, 0.3]
        })));

        assert_eq!(vector.as_slice().len(), FEATURE_COUNT);
        assert_eq!(&vector.as_slice()[..3], &[0.1, 0.2, 0.3]);
        assert!(vector.as_slice()[3..].iter().all(|v| *v == 0.0));
    }

    #[test]
    fn test_padding_keeps_prefix_for_every_short_length() {
        for len in [1, 17, 100, FEATURE_COUNT - 1] {
            let vector = assert_ok!(FeatureVector::from_request_body(&body_with(len)));
            for i in 0..FEATURE_COUNT {
                let expected = if i < len { i as f64 + 0.5 } else { 0.0 };
                assert_eq!(vector.as_slice()[i], expected, "len {} index {}", len, i);
            }
        }
    }

    #[test]
    fn test_empty_input_is_all_zero() {
        let vector = assert_ok!(FeatureVector::from_request_body(&json!({ "features": [] })));
        assert_eq!(vector, FeatureVector::new());
    }

    #[test]
    fn test_exact_length_is_unchanged() {
        let body = body_with(FEATURE_COUNT);
        let vector = assert_ok!(FeatureVector::from_request_body(&body));
        let expected: Vec<f64> = (0..FEATURE_COUNT).map(|i| i as f64 + 0.5).collect();
        assert_eq!(vector.as_slice(), expected.as_slice());
    }

    #[test]
    fn test_long_input_is_truncated() {
        let vector = assert_ok!(FeatureVector::from_request_body(&body_with(500)));
        assert_eq!(vector.as_slice().len(), FEATURE_COUNT);
        assert_eq!(vector.as_slice()[FEATURE_COUNT - 1], 177.5);
    }

    #[test]
    fn test_garbage_past_the_cut_is_ignored() {
        let mut samples: Vec<Value> = (0..FEATURE_COUNT).map(|i| json!(i)).collect();
        samples.push(json!("not a number"));
        samples.push(Value::Null);

        let vector = assert_ok!(FeatureVector::from_json_samples(&samples));
        assert_eq!(vector.as_slice()[5], 5.0);
    }

    #[test]
    fn test_non_numeric_element_is_rejected() {
        for bad in [json!("abc"), json!("1.5"), Value::Null, json!([1]), json!({"v": 1})] {
            let body = json!({ "features": [1.0, 2.0, bad] });
            let err = assert_err!(FeatureVector::from_request_body(&body));
            assert!(matches!(err, AppError::InvalidInput(_)));
            assert!(err.to_string().contains("element 2"));
        }
    }

    #[test]
    fn test_missing_or_malformed_field() {
        let err = assert_err!(FeatureVector::from_request_body(&json!({ "samples": [1] })));
        assert_eq!(err.to_string(), "missing field `features`");

        let err = assert_err!(FeatureVector::from_request_body(&json!({ "features": 3 })));
        assert!(err.to_string().contains("must be an array"));

        let err = assert_err!(FeatureVector::from_request_body(&json!([1, 2, 3])));
        assert!(err.to_string().contains("JSON object"));
    }

    #[test]
    fn test_booleans_count_as_one_and_zero() {
        let vector = assert_ok!(FeatureVector::from_request_body(&json!({
            "features": [true, 0, false, 2.5]
        })));
        assert_eq!(&vector.as_slice()[..4], &[1.0, 0.0, 0.0, 2.5]);
    }

    #[test]
    fn test_integers_are_accepted() {
        let vector = assert_ok!(FeatureVector::from_request_body(&json!({
            "features": [-300, 0, 12]
        })));
        assert_eq!(&vector.as_slice()[..3], &[-300.0, 0.0, 12.0]);
    }

    #[test]
    fn test_frame_uses_positional_column_names() {
        let vector = FeatureVector::from_slice(&[4.0, 5.0]);
        let frame = FeatureFrame::from_vector(&vector);

        assert_eq!(frame.height(), 1);
        assert_eq!(frame.width(), FEATURE_COUNT);
        assert_eq!(frame.columns()[0], "X1");
        assert_eq!(frame.columns()[FEATURE_COUNT - 1], "X178");
        assert_eq!(frame.columns()[1], "X2");
        assert_eq!(frame.rows()[0][1], 5.0);
        assert_eq!(frame.rows()[0][2], 0.0);
        assert_eq!(frame.rows()[0].as_slice(), vector.as_slice());
    }

    #[test]
    fn test_frame_rejects_ragged_rows() {
        let columns = vec!["a".to_string(), "b".to_string()];
        assert!(FeatureFrame::with_columns(columns.clone(), vec![vec![1.0]]).is_none());
        assert!(FeatureFrame::with_columns(columns, vec![vec![1.0, 2.0]]).is_some());
    }
}
