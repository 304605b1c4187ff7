//! Fitted preprocessing transform for the yield model.
//!
//! The yield regressor was trained on a transformed design matrix, not on
//! raw rows: numeric columns are standardized with training-time statistics
//! and the two free-form text columns (Area, Item) are one-hot expanded over
//! frozen vocabularies. This transform is part of the yield model handle's
//! contract — the feature codec hands over the raw [`YieldRow`] untouched.
//!
//! Output column order: scaled numerics (Year, rainfall, pesticides,
//! avg_temp), then the Area block, then the Item block. A label absent from
//! a vocabulary produces an all-zero block, matching the ignore-unknown
//! setting the transform was fitted with.

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::codec::{FeatureVector, YieldRow};
use crate::{AgrogateError, Result};

/// Training-time standardization statistics for one numeric column.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NumericScaler {
    pub column: String,
    pub mean: f64,
    pub scale: f64,
}

impl NumericScaler {
    fn apply(&self, value: f64) -> f64 {
        // Constant columns are exported with scale 1.0 by the training job,
        // but guard anyway.
        if self.scale == 0.0 {
            value - self.mean
        } else {
            (value - self.mean) / self.scale
        }
    }
}

/// The fitted yield preprocessing transform.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct YieldPreprocessor {
    /// Scalers for the numeric columns, in output order.
    pub numeric: Vec<NumericScaler>,
    /// Frozen one-hot vocabulary for Area, in output order.
    pub area_vocabulary: Vec<String>,
    /// Frozen one-hot vocabulary for Item, in output order.
    pub item_vocabulary: Vec<String>,
}

impl YieldPreprocessor {
    /// Load the transform from a JSON artifact file.
    pub fn load(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path).map_err(|e| {
            AgrogateError::Configuration(format!(
                "Failed to read preprocessor artifact {path:?}: {e}"
            ))
        })?;
        let preprocessor: YieldPreprocessor = serde_json::from_str(&content).map_err(|e| {
            AgrogateError::Configuration(format!(
                "Failed to parse preprocessor artifact {path:?}: {e}"
            ))
        })?;
        if preprocessor.numeric.len() != 4 {
            return Err(AgrogateError::Configuration(format!(
                "Preprocessor artifact {path:?} has {} numeric scalers, expected 4",
                preprocessor.numeric.len()
            )));
        }
        Ok(preprocessor)
    }

    /// Number of output columns the transform produces.
    pub fn output_arity(&self) -> usize {
        self.numeric.len() + self.area_vocabulary.len() + self.item_vocabulary.len()
    }

    /// Transform a raw row into the regressor's input vector.
    pub fn transform(&self, row: &YieldRow) -> FeatureVector {
        let raw = [
            row.year as f64,
            row.average_rain_fall_mm_per_year,
            row.pesticides_tonnes,
            row.avg_temp,
        ];

        let mut values = Vec::with_capacity(self.output_arity());
        for (scaler, value) in self.numeric.iter().zip(raw) {
            values.push(scaler.apply(value));
        }
        for label in &self.area_vocabulary {
            values.push(if *label == row.area { 1.0 } else { 0.0 });
        }
        for label in &self.item_vocabulary {
            values.push(if *label == row.item { 1.0 } else { 0.0 });
        }
        FeatureVector::new(values)
    }
}
