//! Load-once registry of the predictive artifacts.
//!
//! The registry is constructed at process startup and passed by reference
//! to the pipeline; artifacts are read-only for the process lifetime, so
//! concurrent unsynchronized reads are safe. Any load failure is fatal to
//! startup (no partial service).

use std::path::Path;

use tracing::info;

use crate::codec::{CategoryEncodings, FeatureVector, YieldRow};
use crate::{AgrogateError, Result};

use super::artifact::ModelArtifact;
use super::preprocess::YieldPreprocessor;

const CROP_MODEL_FILE: &str = "crop_model.json";
const FERTILIZER_MODEL_FILE: &str = "fertilizer_model.json";
const YIELD_MODEL_FILE: &str = "yield_model.json";
const YIELD_PREPROCESSOR_FILE: &str = "yield_preprocessor.json";
const ENCODINGS_FILE: &str = "encodings.json";

/// Uniform access to the loaded predictive artifacts.
#[derive(Debug)]
pub struct ModelRegistry {
    crop: ModelArtifact,
    fertilizer: ModelArtifact,
    yield_model: ModelArtifact,
    yield_preprocessor: YieldPreprocessor,
    encodings: CategoryEncodings,
}

impl ModelRegistry {
    /// Assemble a registry from already-loaded artifacts.
    ///
    /// Cross-artifact invariants are checked here: the crop classifier must
    /// carry its class label table, and the yield preprocessor's output
    /// arity must match the yield regressor's schema.
    pub fn new(
        crop: ModelArtifact,
        fertilizer: ModelArtifact,
        yield_model: ModelArtifact,
        yield_preprocessor: YieldPreprocessor,
        encodings: CategoryEncodings,
    ) -> Result<Self> {
        if crop.classes.is_none() {
            return Err(AgrogateError::Configuration(
                "crop model artifact has no class label table".to_string(),
            ));
        }
        if yield_preprocessor.output_arity() != yield_model.schema.len() {
            return Err(AgrogateError::Configuration(format!(
                "yield preprocessor produces {} columns but the yield model expects {}",
                yield_preprocessor.output_arity(),
                yield_model.schema.len()
            )));
        }
        Ok(Self {
            crop,
            fertilizer,
            yield_model,
            yield_preprocessor,
            encodings,
        })
    }

    /// Load every artifact from `dir`.
    ///
    /// One-time acquisition at startup; any missing or malformed artifact
    /// fails the whole load.
    pub fn load(dir: &Path) -> Result<Self> {
        let crop = ModelArtifact::load(&dir.join(CROP_MODEL_FILE))?;
        let fertilizer = ModelArtifact::load(&dir.join(FERTILIZER_MODEL_FILE))?;
        let yield_model = ModelArtifact::load(&dir.join(YIELD_MODEL_FILE))?;
        let yield_preprocessor = YieldPreprocessor::load(&dir.join(YIELD_PREPROCESSOR_FILE))?;
        let encodings = CategoryEncodings::load(&dir.join(ENCODINGS_FILE))?;

        let registry = Self::new(crop, fertilizer, yield_model, yield_preprocessor, encodings)?;
        info!(
            crop_trees = registry.crop.trees.len(),
            fertilizer_trees = registry.fertilizer.trees.len(),
            yield_trees = registry.yield_model.trees.len(),
            fertilizer_labels = registry.encodings.fertilizer.len(),
            "model artifacts loaded"
        );
        Ok(registry)
    }

    /// The frozen category encodings the fertilizer codec needs.
    pub fn encodings(&self) -> &CategoryEncodings {
        &self.encodings
    }

    /// Crop recommendation: classifier label for the feature vector.
    pub fn predict_crop(&self, features: &FeatureVector) -> Result<String> {
        self.crop.predict_label(features)
    }

    /// Fertilizer recommendation: class code decoded back through the
    /// `Fertilizer` encoding's reverse map.
    ///
    /// An out-of-range code means the artifact and encoder disagree; that
    /// is an invariant violation, not a client error.
    pub fn predict_fertilizer(&self, features: &FeatureVector) -> Result<String> {
        let code = self.fertilizer.predict_class(features)?;
        self.encodings
            .fertilizer
            .label_for(code)
            .map(str::to_string)
            .ok_or(AgrogateError::Decode { code: code as i64 })
    }

    /// Yield prediction: the raw row passes through the fitted
    /// preprocessing transform before the regressor sees it.
    pub fn predict_yield(&self, row: &YieldRow) -> Result<f64> {
        let input = self.yield_preprocessor.transform(row);
        self.yield_model.predict_value(&input)
    }
}
