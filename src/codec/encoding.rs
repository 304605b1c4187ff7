//! Frozen category encodings.
//!
//! Each [`CategoryEncoding`] is a label↔code table fixed at training time
//! and loaded from the encoder artifact at startup; immutable thereafter.
//! Codes are positions in the frozen label list (the training job sorts
//! labels before assigning codes, so artifact order is authoritative here).
//!
//! Lookup of an unknown label is a `None`, surfaced by callers as a typed
//! error — never a default code.

use std::collections::HashMap;
use std::fs;
use std::path::Path;

use serde::Deserialize;

use crate::{AgrogateError, Result};

/// A fixed label↔code mapping for one categorical domain.
#[derive(Debug, Clone)]
pub struct CategoryEncoding {
    labels: Vec<String>,
    codes: HashMap<String, usize>,
}

impl CategoryEncoding {
    /// Build an encoding from the frozen, ordered label list.
    pub fn new(labels: Vec<String>) -> Self {
        let codes = labels
            .iter()
            .enumerate()
            .map(|(code, label)| (label.clone(), code))
            .collect();
        Self { labels, codes }
    }

    /// Code for a label, `None` if the label was never seen at training time.
    pub fn code_for(&self, label: &str) -> Option<usize> {
        self.codes.get(label).copied()
    }

    /// Reverse lookup: label for a code.
    pub fn label_for(&self, code: usize) -> Option<&str> {
        self.labels.get(code).map(String::as_str)
    }

    /// All labels, in code order.
    pub fn labels(&self) -> &[String] {
        &self.labels
    }

    pub fn len(&self) -> usize {
        self.labels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }
}

/// On-disk shape of the encoder artifact.
///
/// Domain keys carry the training-time column names.
#[derive(Debug, Deserialize)]
struct EncodingArtifact {
    #[serde(rename = "Soil_Type")]
    soil_type: Vec<String>,
    #[serde(rename = "Crop_Type")]
    crop_type: Vec<String>,
    #[serde(rename = "Fertilizer")]
    fertilizer: Vec<String>,
}

/// The full set of category encodings the fertilizer path needs.
#[derive(Debug, Clone)]
pub struct CategoryEncodings {
    pub soil: CategoryEncoding,
    pub crop: CategoryEncoding,
    pub fertilizer: CategoryEncoding,
}

impl CategoryEncodings {
    /// Load encodings from a JSON artifact file.
    pub fn load(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path).map_err(|e| {
            AgrogateError::Configuration(format!("Failed to read encoder artifact {path:?}: {e}"))
        })?;
        let artifact: EncodingArtifact = serde_json::from_str(&content).map_err(|e| {
            AgrogateError::Configuration(format!("Failed to parse encoder artifact {path:?}: {e}"))
        })?;
        Ok(Self {
            soil: CategoryEncoding::new(artifact.soil_type),
            crop: CategoryEncoding::new(artifact.crop_type),
            fertilizer: CategoryEncoding::new(artifact.fertilizer),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trip_every_label() {
        let enc = CategoryEncoding::new(vec![
            "Black".to_string(),
            "Clayey".to_string(),
            "Loamy".to_string(),
        ]);
        for label in enc.labels().to_vec() {
            let code = enc.code_for(&label).unwrap();
            assert_eq!(enc.label_for(code), Some(label.as_str()));
        }
    }

    #[test]
    fn unknown_label_is_none() {
        let enc = CategoryEncoding::new(vec!["Loamy".to_string()]);
        assert_eq!(enc.code_for("Martian"), None);
        assert_eq!(enc.label_for(7), None);
    }
}
