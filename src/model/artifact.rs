//! Serialized model artifacts and their inference walk.
//!
//! Artifacts are decision-tree ensembles exported from the offline training
//! job as JSON: a flat node arena per tree, a feature schema naming the
//! training columns in order, and (for classifiers) the class label table.
//! Training itself is out of scope here — artifacts are opaque, pre-fit
//! capabilities exposing a prediction call.

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::codec::FeatureVector;
use crate::{AgrogateError, Result};

/// One node in a decision tree's flat node arena.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum TreeNode {
    /// Branch left when `features[feature] <= threshold`, else right.
    Split {
        feature: usize,
        threshold: f64,
        left: usize,
        right: usize,
    },
    Leaf {
        value: f64,
    },
}

/// A single fitted decision tree.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DecisionTree {
    pub nodes: Vec<TreeNode>,
}

impl DecisionTree {
    /// Walk the tree for one feature row, returning the leaf value.
    ///
    /// Child indices and feature indices come from the artifact; a reference
    /// outside the arena or the schema means the artifact is malformed.
    pub fn evaluate(&self, features: &[f64]) -> Result<f64> {
        let mut index = 0usize;
        // A well-formed tree terminates in at most `nodes.len()` hops.
        for _ in 0..=self.nodes.len() {
            match self.nodes.get(index) {
                Some(TreeNode::Leaf { value }) => return Ok(*value),
                Some(TreeNode::Split {
                    feature,
                    threshold,
                    left,
                    right,
                }) => {
                    let value = features.get(*feature).ok_or_else(|| {
                        AgrogateError::Inference(format!(
                            "tree references feature {feature} beyond input arity {}",
                            features.len()
                        ))
                    })?;
                    index = if *value <= *threshold { *left } else { *right };
                }
                None => {
                    return Err(AgrogateError::Inference(format!(
                        "tree references node {index} beyond arena size {}",
                        self.nodes.len()
                    )));
                }
            }
        }
        Err(AgrogateError::Inference(
            "tree walk did not terminate (cyclic node references)".to_string(),
        ))
    }
}

/// A trained artifact: tree ensemble + feature schema (+ classes for
/// classifiers).
///
/// Loaded once at startup and read-only for the process lifetime.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelArtifact {
    /// Feature column names, in training order.
    pub schema: Vec<String>,
    pub trees: Vec<DecisionTree>,
    /// Class label table for classifiers; absent for regressors.
    #[serde(default)]
    pub classes: Option<Vec<String>>,
}

impl ModelArtifact {
    /// Load an artifact from a JSON file.
    pub fn load(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path).map_err(|e| {
            AgrogateError::Configuration(format!("Failed to read model artifact {path:?}: {e}"))
        })?;
        let artifact: ModelArtifact = serde_json::from_str(&content).map_err(|e| {
            AgrogateError::Configuration(format!("Failed to parse model artifact {path:?}: {e}"))
        })?;
        if artifact.trees.is_empty() {
            return Err(AgrogateError::Configuration(format!(
                "Model artifact {path:?} contains no trees"
            )));
        }
        Ok(artifact)
    }

    /// Regression prediction: mean of the ensemble's tree outputs.
    pub fn predict_value(&self, features: &FeatureVector) -> Result<f64> {
        self.check_arity(features)?;
        let mut sum = 0.0;
        for tree in &self.trees {
            sum += tree.evaluate(features.as_slice())?;
        }
        Ok(sum / self.trees.len() as f64)
    }

    /// Classification prediction: majority vote over tree outputs.
    ///
    /// Leaf values are class indices; ties break toward the lowest index.
    pub fn predict_class(&self, features: &FeatureVector) -> Result<usize> {
        self.check_arity(features)?;
        let mut votes: Vec<usize> = Vec::new();
        for tree in &self.trees {
            let raw = tree.evaluate(features.as_slice())?;
            if raw < 0.0 || raw.fract() != 0.0 {
                return Err(AgrogateError::Inference(format!(
                    "classifier leaf produced non-class value {raw}"
                )));
            }
            let class = raw as usize;
            if class >= votes.len() {
                votes.resize(class + 1, 0);
            }
            votes[class] += 1;
        }
        votes
            .iter()
            .enumerate()
            .max_by(|(ia, a), (ib, b)| a.cmp(b).then(ib.cmp(ia)))
            .map(|(class, _)| class)
            .ok_or_else(|| AgrogateError::Inference("empty ensemble".to_string()))
    }

    /// Classification prediction resolved through the class label table.
    pub fn predict_label(&self, features: &FeatureVector) -> Result<String> {
        let classes = self.classes.as_ref().ok_or_else(|| {
            AgrogateError::Inference("artifact has no class label table".to_string())
        })?;
        let class = self.predict_class(features)?;
        classes
            .get(class)
            .cloned()
            .ok_or_else(|| AgrogateError::Inference(format!(
                "class index {class} beyond label table size {}",
                classes.len()
            )))
    }

    fn check_arity(&self, features: &FeatureVector) -> Result<()> {
        if features.len() != self.schema.len() {
            return Err(AgrogateError::Inference(format!(
                "expected {} features, got {}",
                self.schema.len(),
                features.len()
            )));
        }
        Ok(())
    }
}
