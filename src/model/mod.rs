//! Loaded predictive artifacts and uniform prediction access.

mod artifact;
mod preprocess;
mod registry;

pub use artifact::{DecisionTree, ModelArtifact, TreeNode};
pub use preprocess::{NumericScaler, YieldPreprocessor};
pub use registry::ModelRegistry;
