//! Integration tests for model artifacts and the registry.

use std::fs;

use agrogate::codec::{CategoryEncoding, CategoryEncodings, FeatureVector, YieldRow, CROP_FIELDS};
use agrogate::model::{
    DecisionTree, ModelArtifact, ModelRegistry, NumericScaler, TreeNode, YieldPreprocessor,
};
use agrogate::AgrogateError;

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

fn constant(value: f64) -> DecisionTree {
    DecisionTree {
        nodes: vec![TreeNode::Leaf { value }],
    }
}

fn crop_artifact() -> ModelArtifact {
    ModelArtifact {
        schema: CROP_FIELDS.iter().map(|f| f.to_string()).collect(),
        trees: vec![stump(0, 50.0, 0.0, 1.0)],
        classes: Some(vec!["chickpea".to_string(), "rice".to_string()]),
    }
}

fn fertilizer_artifact() -> ModelArtifact {
    ModelArtifact {
        schema: vec![
            "Temparature".to_string(),
            "Humidity".to_string(),
            "Moisture".to_string(),
            "Soil_Type".to_string(),
            "Crop_Type".to_string(),
            "Nitrogen".to_string(),
            "Potassium".to_string(),
            "Phosphorous".to_string(),
        ],
        trees: vec![stump(3, 0.5, 0.0, 1.0)],
        classes: None,
    }
}

fn yield_artifact() -> ModelArtifact {
    ModelArtifact {
        schema: (0..8).map(|i| format!("col_{i}")).collect(),
        trees: vec![constant(4.5678)],
        classes: None,
    }
}

fn preprocessor() -> YieldPreprocessor {
    YieldPreprocessor {
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
    }
}

fn encodings() -> CategoryEncodings {
    CategoryEncodings {
        soil: CategoryEncoding::new(vec!["Clayey".to_string(), "Loamy".to_string()]),
        crop: CategoryEncoding::new(vec!["Maize".to_string(), "Paddy".to_string()]),
        fertilizer: CategoryEncoding::new(vec!["DAP".to_string(), "Urea".to_string()]),
    }
}

fn registry() -> ModelRegistry {
    ModelRegistry::new(
        crop_artifact(),
        fertilizer_artifact(),
        yield_artifact(),
        preprocessor(),
        encodings(),
    )
    .unwrap()
}

fn yield_row() -> YieldRow {
    YieldRow {
        year: 2013,
        average_rain_fall_mm_per_year: 1485.0,
        pesticides_tonnes: 121.0,
        avg_temp: 16.37,
        area: "Albania".to_string(),
        item: "Maize".to_string(),
    }
}

#[test]
fn crop_prediction_resolves_to_a_label() {
    let registry = registry();
    let high_n = FeatureVector::new(vec![90.0, 42.0, 43.0, 20.8, 82.0, 6.5, 202.9]);
    let low_n = FeatureVector::new(vec![10.0, 42.0, 43.0, 20.8, 82.0, 6.5, 202.9]);
    assert_eq!(registry.predict_crop(&high_n).unwrap(), "rice");
    assert_eq!(registry.predict_crop(&low_n).unwrap(), "chickpea");
}

#[test]
fn fertilizer_code_decodes_through_the_reverse_map() {
    let registry = registry();
    let clayey = FeatureVector::new(vec![26.0, 52.0, 38.0, 0.0, 0.0, 37.0, 0.0, 0.0]);
    let loamy = FeatureVector::new(vec![26.0, 52.0, 38.0, 1.0, 0.0, 37.0, 0.0, 0.0]);
    assert_eq!(registry.predict_fertilizer(&clayey).unwrap(), "DAP");
    assert_eq!(registry.predict_fertilizer(&loamy).unwrap(), "Urea");
}

#[test]
fn out_of_range_fertilizer_code_is_a_decode_error() {
    let mut fertilizer = fertilizer_artifact();
    fertilizer.trees = vec![constant(7.0)];
    let registry = ModelRegistry::new(
        crop_artifact(),
        fertilizer,
        yield_artifact(),
        preprocessor(),
        encodings(),
    )
    .unwrap();
    let vector = FeatureVector::new(vec![26.0, 52.0, 38.0, 0.0, 0.0, 37.0, 0.0, 0.0]);
    match registry.predict_fertilizer(&vector) {
        Err(AgrogateError::Decode { code }) => assert_eq!(code, 7),
        other => panic!("expected Decode error, got {other:?}"),
    }
}

#[test]
fn yield_prediction_runs_the_preprocessing_transform() {
    let registry = registry();
    assert_eq!(registry.predict_yield(&yield_row()).unwrap(), 4.5678);
}

#[test]
fn crop_artifact_without_classes_is_rejected() {
    let mut crop = crop_artifact();
    crop.classes = None;
    let err = ModelRegistry::new(
        crop,
        fertilizer_artifact(),
        yield_artifact(),
        preprocessor(),
        encodings(),
    )
    .unwrap_err();
    assert!(matches!(err, AgrogateError::Configuration(_)));
}

#[test]
fn preprocessor_arity_must_match_yield_schema() {
    let mut yield_model = yield_artifact();
    yield_model.schema.pop();
    let err = ModelRegistry::new(
        crop_artifact(),
        fertilizer_artifact(),
        yield_model,
        preprocessor(),
        encodings(),
    )
    .unwrap_err();
    assert!(matches!(err, AgrogateError::Configuration(_)));
}

#[test]
fn load_from_directory_round_trips_the_artifacts() {
    let dir = tempfile::tempdir().unwrap();
    write_artifacts(dir.path());

    let registry = ModelRegistry::load(dir.path()).unwrap();
    let vector = FeatureVector::new(vec![90.0, 42.0, 43.0, 20.8, 82.0, 6.5, 202.9]);
    assert_eq!(registry.predict_crop(&vector).unwrap(), "rice");
    assert_eq!(registry.predict_yield(&yield_row()).unwrap(), 4.5678);
}

#[test]
fn load_fails_when_an_artifact_is_missing() {
    let dir = tempfile::tempdir().unwrap();
    write_artifacts(dir.path());
    fs::remove_file(dir.path().join("fertilizer_model.json")).unwrap();

    let err = ModelRegistry::load(dir.path()).unwrap_err();
    assert!(matches!(err, AgrogateError::Configuration(_)));
}

fn write_artifacts(dir: &std::path::Path) {
    let write = |name: &str, content: String| fs::write(dir.join(name), content).unwrap();
    write(
        "crop_model.json",
        serde_json::to_string(&crop_artifact()).unwrap(),
    );
    write(
        "fertilizer_model.json",
        serde_json::to_string(&fertilizer_artifact()).unwrap(),
    );
    write(
        "yield_model.json",
        serde_json::to_string(&yield_artifact()).unwrap(),
    );
    write(
        "yield_preprocessor.json",
        serde_json::to_string(&preprocessor()).unwrap(),
    );
    write(
        "encodings.json",
        serde_json::json!({
            "Soil_Type": ["Clayey", "Loamy"],
            "Crop_Type": ["Maize", "Paddy"],
            "Fertilizer": ["DAP", "Urea"]
        })
        .to_string(),
    );
}
