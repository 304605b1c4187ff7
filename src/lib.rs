//! Agrogate - Authenticated agronomy prediction gateway
//!
//! This crate serves pre-trained agronomy models (crop recommendation,
//! fertilizer recommendation, yield prediction) and a generative farming
//! advisor over authenticated HTTP endpoints, persisting each prediction
//! against the requesting user.
//!
//! The core is the prediction pipeline: a request payload is validated and
//! encoded into the exact feature vector its target model was trained on,
//! dispatched through the [`ModelRegistry`], and the shaped result is
//! recorded before it is returned.
//!
//! # Example
//!
//! ```rust,no_run
//! use std::path::Path;
//! use std::sync::Arc;
//!
//! use agrogate::store::MemoryStore;
//! use agrogate::{ModelRegistry, PredictionPipeline};
//!
//! #[tokio::main]
//! async fn main() -> agrogate::Result<()> {
//!     let registry = Arc::new(ModelRegistry::load(Path::new("artifacts"))?);
//!     let pipeline = PredictionPipeline::new(registry, Arc::new(MemoryStore::new()));
//!
//!     let payload = serde_json::json!({
//!         "N": 90, "P": 42, "K": 43,
//!         "temperature": 20.8, "humidity": 82, "ph": 6.5, "rainfall": 202.9
//!     });
//!     let result = pipeline
//!         .predict_crop("user-1", payload.as_object().unwrap())
//!         .await?;
//!     println!("{}", result.recommended_crop);
//!     Ok(())
//! }
//! ```

pub mod advisor;
pub mod auth;
pub mod codec;
pub mod error;
pub mod model;
pub mod pipeline;
pub mod server;
pub mod store;
pub mod telemetry;

// Re-export main types at crate root
pub use error::{AgrogateError, Result};
pub use model::ModelRegistry;
pub use pipeline::PredictionPipeline;
