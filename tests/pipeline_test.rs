//! Integration tests for the prediction pipeline.

use std::sync::Arc;

use async_trait::async_trait;
use serde_json::{json, Map, Value};

use agrogate::codec::{CategoryEncoding, CategoryEncodings, CROP_FIELDS};
use agrogate::model::{
    DecisionTree, ModelArtifact, ModelRegistry, NumericScaler, TreeNode, YieldPreprocessor,
};
use agrogate::pipeline::PredictionPipeline;
use agrogate::store::{
    MemoryStore, PredictionRecord, PredictionStore, CROP_PREDICTIONS, FERTILIZER_RECOMMENDATIONS,
    YIELD_PREDICTIONS,
};
use agrogate::{AgrogateError, Result};

fn stump(feature: usize, threshold: f64, low: f64, high: f64) -> DecisionTree {
    DecisionTree {
        nodes: vec![
            TreeNode::Split {
                feature,
                threshold,
                left: 1,
                right: 2,
            },
            TreeNode::Leaf { value: low },
            TreeNode::Leaf { value: high },
        ],
    }
}

fn registry() -> Arc<ModelRegistry> {
    let crop = ModelArtifact {
        schema: CROP_FIELDS.iter().map(|f| f.to_string()).collect(),
        trees: vec![stump(0, 50.0, 0.0, 1.0)],
        classes: Some(vec!["chickpea".to_string(), "rice".to_string()]),
    };
    let fertilizer = ModelArtifact {
        schema: (0..8).map(|i| format!("col_{i}")).collect(),
        trees: vec![stump(3, 0.5, 0.0, 1.0)],
        classes: None,
    };
    let yield_model = ModelArtifact {
        schema: (0..8).map(|i| format!("col_{i}")).collect(),
        trees: vec![DecisionTree {
            nodes: vec![TreeNode::Leaf { value: 4.5678 }],
        }],
        classes: None,
    };
    let preprocessor = YieldPreprocessor {
        numeric: vec![
            NumericScaler {
                column: "Year".to_string(),
                mean: 2000.0,
                scale: 10.0,
            },
            NumericScaler {
                column: "average_rain_fall_mm_per_year".to_string(),
                mean: 1000.0,
                scale: 500.0,
            },
            NumericScaler {
                column: "pesticides_tonnes".to_string(),
                mean: 100.0,
                scale: 50.0,
            },
            NumericScaler {
                column: "avg_temp".to_string(),
                mean: 20.0,
                scale: 5.0,
            },
        ],
        area_vocabulary: vec!["Albania".to_string(), "India".to_string()],
        item_vocabulary: vec!["Maize".to_string(), "Potatoes".to_string()],
    };
    let encodings = CategoryEncodings {
        soil: CategoryEncoding::new(vec!["Clayey".to_string(), "Loamy".to_string()]),
        crop: CategoryEncoding::new(vec!["Maize".to_string(), "Paddy".to_string()]),
        fertilizer: CategoryEncoding::new(vec!["DAP".to_string(), "Urea".to_string()]),
    };
    Arc::new(ModelRegistry::new(crop, fertilizer, yield_model, preprocessor, encodings).unwrap())
}

fn obj(value: Value) -> Map<String, Value> {
    value.as_object().unwrap().clone()
}

fn crop_payload() -> Map<String, Value> {
    obj(json!({
        "N": 90, "P": 42, "K": 43,
        "temperature": 20.8, "humidity": 82, "ph": 6.5, "rainfall": 202.9
    }))
}

fn yield_payload() -> Map<String, Value> {
    obj(json!({
        "Year": 2013,
        "average_rain_fall_mm_per_year": 1485.0,
        "pesticides_tonnes": 121.0,
        "avg_temp": 16.37,
        "Area": "Albania",
        "Item": "Maize"
    }))
}

/// Store that always fails writes; listing stays empty.
struct FailingStore;

#[async_trait]
impl PredictionStore for FailingStore {
    async fn record(
        &self,
        _collection: &str,
        _user_id: &str,
        _fields: Map<String, Value>,
    ) -> Result<()> {
        Err(AgrogateError::Persistence("disk on fire".to_string()))
    }

    async fn list_for(&self, _collection: &str, _user_id: &str) -> Result<Vec<PredictionRecord>> {
        Ok(Vec::new())
    }
}

#[tokio::test]
async fn crop_prediction_is_recorded_for_the_user() {
    let store = Arc::new(MemoryStore::new());
    let pipeline = PredictionPipeline::new(registry(), store.clone());

    let result = pipeline.predict_crop("user-1", &crop_payload()).await.unwrap();
    assert_eq!(result.recommended_crop, "rice");

    let records = store.list_for(CROP_PREDICTIONS, "user-1").await.unwrap();
    assert_eq!(records.len(), 1);
    assert_eq!(records[0].fields["cropRecommendation"], "rice");
}

#[tokio::test]
async fn fertilizer_record_keeps_the_requested_crop() {
    let store = Arc::new(MemoryStore::new());
    let pipeline = PredictionPipeline::new(registry(), store.clone());

    let payload = obj(json!({
        "temperature": 26, "humidity": 52, "moisture": 38,
        "soil_type": "Loamy", "crop_type": "Maize",
        "nitrogen": 37, "potassium": 0, "phosphorous": 0
    }));
    let result = pipeline
        .predict_fertilizer("user-1", &payload)
        .await
        .unwrap();
    assert_eq!(result.recommended_fertilizer, "Urea");

    let records = store
        .list_for(FERTILIZER_RECOMMENDATIONS, "user-1")
        .await
        .unwrap();
    assert_eq!(records[0].fields["fertilizerType"], "Urea");
    assert_eq!(records[0].fields["crop"], "Maize");
}

#[tokio::test]
async fn yield_response_is_rounded_but_the_record_keeps_the_raw_value() {
    let store = Arc::new(MemoryStore::new());
    let pipeline = PredictionPipeline::new(registry(), store.clone());

    let result = pipeline
        .predict_yield("user-1", &yield_payload())
        .await
        .unwrap();
    assert_eq!(result.prediction, 4.57);

    let records = store.list_for(YIELD_PREDICTIONS, "user-1").await.unwrap();
    assert_eq!(records[0].fields["predictedYield"], 4.5678);
    assert_eq!(records[0].fields["crop"], "Maize");
    // The record also keeps the request fields.
    assert_eq!(records[0].fields["Area"], "Albania");
}

#[tokio::test]
async fn store_failure_does_not_fail_the_prediction() {
    let pipeline = PredictionPipeline::new(registry(), Arc::new(FailingStore));
    let result = pipeline.predict_crop("user-1", &crop_payload()).await.unwrap();
    assert_eq!(result.recommended_crop, "rice");
}

#[tokio::test]
async fn validation_failure_records_nothing() {
    let store = Arc::new(MemoryStore::new());
    let pipeline = PredictionPipeline::new(registry(), store.clone());

    let mut payload = crop_payload();
    payload.remove("K");
    let err = pipeline.predict_crop("user-1", &payload).await.unwrap_err();
    assert!(matches!(err, AgrogateError::Validation { .. }));

    assert!(store
        .list_for(CROP_PREDICTIONS, "user-1")
        .await
        .unwrap()
        .is_empty());
}
