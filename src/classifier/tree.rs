//! Decision tree backend
//!
//! Evaluates a fitted scikit-learn `DecisionTreeClassifier` exported as JSON.
//! The export mirrors the fitted `tree_` arrays, one entry per node:
//!
//! ```json
//! {
//!   "n_features_in": 178,
//!   "feature_names_in": ["X1", "X2", "..."],
//!   "classes": [0, 1],
//!   "children_left":  [1, -1, -1],
//!   "children_right": [2, -1, -1],
//!   "feature":        [42, -2, -2],
//!   "threshold":      [-12.5, -2.0, -2.0],
//!   "value":          [[10.0, 4.0], [9.0, 0.0], [1.0, 4.0]]
//! }
//! ```
//!
//! Node tables are validated once at load so prediction never has to.

use serde::Deserialize;

use super::{float32_row_major, Classifier, ClassifierError, ModelInfo, ModelKind};
use crate::models::FeatureFrame;

/// Marker used by the exporter for "no child"
pub const TREE_LEAF: i64 = -1;

const MODEL_NAME: &str = "DecisionTreeClassifier";

#[derive(Debug, thiserror::Error)]
pub enum TreeError {
    #[error("invalid tree JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("tree has no nodes")]
    Empty,

    #[error("tree has no classes")]
    NoClasses,

    #[error("tree declares no input features")]
    NoFeatures,

    #[error("node arrays disagree in length: {0}")]
    Ragged(String),

    #[error("node {node}: {reason}")]
    BadNode { node: usize, reason: String },

    #[error("feature_names_in has {got} names, expected {expected}")]
    FeatureNames { got: usize, expected: usize },
}

/// Serialized form of a fitted tree
#[derive(Debug, Clone, Deserialize)]
struct TreeExport {
    n_features_in: usize,
    #[serde(default)]
    feature_names_in: Option<Vec<String>>,
    classes: Vec<i64>,
    children_left: Vec<i64>,
    children_right: Vec<i64>,
    feature: Vec<i64>,
    threshold: Vec<f64>,
    value: Vec<Vec<f64>>,
}

#[derive(Debug, Clone)]
enum Node {
    Split {
        feature: usize,
        threshold: f64,
        left: usize,
        right: usize,
    },
    Leaf {
        class_index: usize,
    },
}

/// Validated, immutable decision tree
#[derive(Debug, Clone)]
pub struct DecisionTree {
    n_features: usize,
    feature_names: Option<Vec<String>>,
    classes: Vec<i64>,
    nodes: Vec<Node>,
    info: ModelInfo,
}

impl DecisionTree {
    /// Parse and validate an exported tree
    pub fn from_json_bytes(path: &str, bytes: &[u8]) -> Result<Self, TreeError> {
        let export: TreeExport = serde_json::from_slice(bytes)?;
        let info = ModelInfo::new(path, ModelKind::DecisionTree, bytes, Some(export.n_features_in));
        Self::from_export(export, info)
    }

    fn from_export(export: TreeExport, info: ModelInfo) -> Result<Self, TreeError> {
        let count = export.children_left.len();
        if count == 0 {
            return Err(TreeError::Empty);
        }
        if export.classes.is_empty() {
            return Err(TreeError::NoClasses);
        }
        if export.n_features_in == 0 {
            return Err(TreeError::NoFeatures);
        }

        let lengths = [
            ("children_right", export.children_right.len()),
            ("feature", export.feature.len()),
            ("threshold", export.threshold.len()),
            ("value", export.value.len()),
        ];
        if let Some((name, len)) = lengths.iter().find(|(_, len)| *len != count) {
            return Err(TreeError::Ragged(format!(
                "children_left has {} entries, {} has {}",
                count, name, len
            )));
        }

        if let Some(names) = &export.feature_names_in {
            if names.len() != export.n_features_in {
                return Err(TreeError::FeatureNames {
                    got: names.len(),
                    expected: export.n_features_in,
                });
            }
        }

        let mut nodes = Vec::with_capacity(count);
        for node in 0..count {
            let bad = |reason: String| TreeError::BadNode { node, reason };

            let weights = &export.value[node];
            if weights.len() != export.classes.len() {
                return Err(bad(format!(
                    "{} class weights for {} classes",
                    weights.len(),
                    export.classes.len()
                )));
            }

            let left = export.children_left[node];
            let right = export.children_right[node];

            if left == TREE_LEAF {
                if right != TREE_LEAF {
                    return Err(bad("leaf has a right child".to_string()));
                }
                nodes.push(Node::Leaf {
                    class_index: argmax(weights),
                });
                continue;
            }

            // Children point strictly forward, so traversal terminates
            let child = |c: i64| -> Result<usize, TreeError> {
                match usize::try_from(c) {
                    Ok(c) if c > node && c < count => Ok(c),
                    _ => Err(bad(format!("child index {} out of range", c))),
                }
            };
            let left = child(left)?;
            let right = child(right)?;

            let feature = match usize::try_from(export.feature[node]) {
                Ok(f) if f < export.n_features_in => f,
                _ => {
                    return Err(bad(format!(
                        "feature index {} out of range",
                        export.feature[node]
                    )))
                }
            };

            nodes.push(Node::Split {
                feature,
                threshold: export.threshold[node],
                left,
                right,
            });
        }

        Ok(Self {
            n_features: export.n_features_in,
            feature_names: export.feature_names_in,
            classes: export.classes,
            nodes,
            info,
        })
    }

    fn check_schema(&self, frame: &FeatureFrame) -> Result<(), ClassifierError> {
        if frame.width() != self.n_features {
            return Err(ClassifierError::FeatureCount {
                model: MODEL_NAME,
                got: frame.width(),
                expected: self.n_features,
            });
        }
        if let Some(names) = &self.feature_names {
            if names.as_slice() != frame.columns() {
                return Err(ClassifierError::FeatureNames);
            }
        }
        Ok(())
    }

    fn predict_row(&self, row: &[f32]) -> i64 {
        let mut index = 0;
        loop {
            match &self.nodes[index] {
                Node::Leaf { class_index } => return self.classes[*class_index],
                Node::Split { feature, threshold, left, right } => {
                    let x = row[*feature] as f64;
                    index = if x <= *threshold { *left } else { *right };
                }
            }
        }
    }
}

impl Classifier for DecisionTree {
    fn predict(&self, frame: &FeatureFrame) -> Result<Vec<i64>, ClassifierError> {
        self.check_schema(frame)?;
        // fitted on float32 inputs
        let values = float32_row_major(frame)?;
        Ok(values.chunks(self.n_features).map(|row| self.predict_row(row)).collect())
    }

    fn info(&self) -> &ModelInfo {
        &self.info
    }
}

/// Index of the first maximal weight
fn argmax(weights: &[f64]) -> usize {
    let mut best = 0;
    for (i, w) in weights.iter().enumerate() {
        if *w > weights[best] {
            best = i;
        }
    }
    best
}
