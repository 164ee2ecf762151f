//! Prediction model

use serde::{Deserialize, Serialize};

/// Label the classifier emits for seizure activity
pub const SEIZURE_LABEL: i64 = 1;

/// Human-readable verdict derived from a raw label
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SeizureStatus {
    #[serde(rename = "Normal")]
    Normal,
    #[serde(rename = "Possible Seizure Activity")]
    PossibleSeizureActivity,
}

impl SeizureStatus {
    /// Label `1` is seizure activity; every other label is normal
    pub fn from_label(label: i64) -> Self {
        if label == SEIZURE_LABEL {
            SeizureStatus::PossibleSeizureActivity
        } else {
            SeizureStatus::Normal
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            SeizureStatus::Normal => "Normal",
            SeizureStatus::PossibleSeizureActivity => "Possible Seizure Activity",
        }
    }
}

impl std::fmt::Display for SeizureStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Successful `/predict` payload
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Prediction {
    pub prediction: i64,
    pub status: SeizureStatus,
}

impl Prediction {
    pub fn from_label(label: i64) -> Self {
        Self {
            prediction: label,
            status: SeizureStatus::from_label(label),
        }
    }
}
