//! Prediction request pipeline.
//!
//! Orchestrates one request: encode the payload, dispatch to the model
//! registry, shape the result, and persist a record for the authenticated
//! user. Codec and inference failures short-circuit; persistence is
//! best-effort — a store failure is logged and counted but the caller
//! still gets their prediction.

use std::sync::Arc;
use std::time::Instant;

use serde::Serialize;
use serde_json::{Map, Value};
use tracing::warn;

use crate::codec;
use crate::model::ModelRegistry;
use crate::store::{self, PredictionStore};
use crate::telemetry;
use crate::Result;

/// Crop recommendation response body.
#[derive(Debug, Clone, Serialize)]
pub struct CropPrediction {
    pub recommended_crop: String,
}

/// Fertilizer recommendation response body.
#[derive(Debug, Clone, Serialize)]
pub struct FertilizerRecommendation {
    pub recommended_fertilizer: String,
}

/// Yield prediction response body; the value is rounded to 2 decimals.
#[derive(Debug, Clone, Serialize)]
pub struct YieldPrediction {
    pub prediction: f64,
}

/// Per-request orchestration over the model registry and the store.
pub struct PredictionPipeline {
    registry: Arc<ModelRegistry>,
    store: Arc<dyn PredictionStore>,
}

impl PredictionPipeline {
    pub fn new(registry: Arc<ModelRegistry>, store: Arc<dyn PredictionStore>) -> Self {
        Self { registry, store }
    }

    /// Recommend a crop for the seven soil/climate measurements.
    pub async fn predict_crop(
        &self,
        user_id: &str,
        payload: &Map<String, Value>,
    ) -> Result<CropPrediction> {
        let start = Instant::now();
        let outcome = codec::encode_crop_features(payload)
            .and_then(|vector| self.registry.predict_crop(&vector));
        record_outcome("crop", start, outcome.is_ok());
        let label = outcome?;

        let mut fields = Map::new();
        fields.insert("cropRecommendation".to_string(), label.clone().into());
        self.record_best_effort(store::CROP_PREDICTIONS, user_id, fields)
            .await;

        Ok(CropPrediction {
            recommended_crop: label,
        })
    }

    /// Recommend a fertilizer; the model's class code is decoded back to a
    /// human label before it leaves the pipeline.
    pub async fn predict_fertilizer(
        &self,
        user_id: &str,
        payload: &Map<String, Value>,
    ) -> Result<FertilizerRecommendation> {
        let start = Instant::now();
        let outcome = codec::encode_fertilizer_features(payload, self.registry.encodings())
            .and_then(|vector| self.registry.predict_fertilizer(&vector));
        record_outcome("fertilizer", start, outcome.is_ok());
        let label = outcome?;

        let mut fields = Map::new();
        fields.insert("fertilizerType".to_string(), label.clone().into());
        if let Some(crop) = payload.get("crop_type") {
            fields.insert("crop".to_string(), crop.clone());
        }
        self.record_best_effort(store::FERTILIZER_RECOMMENDATIONS, user_id, fields)
            .await;

        Ok(FertilizerRecommendation {
            recommended_fertilizer: label,
        })
    }

    /// Predict crop yield for the raw row; the response value carries
    /// exactly 2 decimal places, the record keeps the raw regression output.
    pub async fn predict_yield(
        &self,
        user_id: &str,
        payload: &Map<String, Value>,
    ) -> Result<YieldPrediction> {
        let start = Instant::now();
        let outcome = codec::encode_yield_features(payload)
            .and_then(|row| self.registry.predict_yield(&row).map(|value| (row, value)));
        record_outcome("yield", start, outcome.is_ok());
        let (row, value) = outcome?;

        let mut fields = payload.clone();
        fields.insert("predictedYield".to_string(), value.into());
        fields.insert("crop".to_string(), row.item.clone().into());
        self.record_best_effort(store::YIELD_PREDICTIONS, user_id, fields)
            .await;

        Ok(YieldPrediction {
            prediction: (value * 100.0).round() / 100.0,
        })
    }

    /// Persist a record without letting a store failure reach the caller.
    async fn record_best_effort(
        &self,
        collection: &'static str,
        user_id: &str,
        fields: Map<String, Value>,
    ) {
        if let Err(err) = self.store.record(collection, user_id, fields).await {
            warn!(collection, user_id, error = %err, "failed to persist prediction record");
            metrics::counter!(telemetry::RECORD_FAILURES_TOTAL, "collection" => collection)
                .increment(1);
        }
    }
}

fn record_outcome(kind: &'static str, start: Instant, ok: bool) {
    let status = if ok { "ok" } else { "error" };
    metrics::counter!(telemetry::PREDICTIONS_TOTAL, "kind" => kind, "status" => status)
        .increment(1);
    metrics::histogram!(telemetry::PREDICTION_DURATION_SECONDS, "kind" => kind)
        .record(start.elapsed().as_secs_f64());
}
