//! Feature codec — raw JSON payloads to model-ready vectors.
//!
//! Each encoder produces a well-formed [`FeatureVector`] (or [`YieldRow`])
//! or fails fast with an error naming the offending field. Field order is
//! fixed per model and must match the training column order of the
//! corresponding artifact.
//!
//! Validation ordering differs intentionally between encoders: crop and
//! fertilizer fail on the first bad field during coercion, while the yield
//! encoder checks presence of all required fields up front (in required-field
//! order) before any numeric coercion. Clients depend on the yield encoder's
//! exact `Missing field: <name>` message.

mod encoding;

pub use encoding::{CategoryEncoding, CategoryEncodings};

use serde_json::{Map, Value};

use crate::{AgrogateError, Result};

/// Crop model input columns, in training order.
pub const CROP_FIELDS: [&str; 7] = [
    "N",
    "P",
    "K",
    "temperature",
    "humidity",
    "ph",
    "rainfall",
];

/// Yield model required fields, in the order presence is checked.
pub const YIELD_REQUIRED_FIELDS: [&str; 6] = [
    "Year",
    "average_rain_fall_mm_per_year",
    "pesticides_tonnes",
    "avg_temp",
    "Area",
    "Item",
];

/// Ordered numeric input to a predictive model.
///
/// The field count and order must exactly match the target model's training
/// schema; the model handle enforces arity at prediction time.
#[derive(Debug, Clone, PartialEq)]
pub struct FeatureVector {
    values: Vec<f64>,
}

impl FeatureVector {
    pub fn new(values: Vec<f64>) -> Self {
        Self { values }
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn as_slice(&self) -> &[f64] {
        &self.values
    }
}

impl From<Vec<f64>> for FeatureVector {
    fn from(values: Vec<f64>) -> Self {
        Self::new(values)
    }
}

/// Raw yield model input row.
///
/// The two string columns are passed through as categorical text; turning
/// them into numbers is the yield preprocessor's contract, not the codec's.
#[derive(Debug, Clone, PartialEq)]
pub struct YieldRow {
    pub year: i64,
    pub average_rain_fall_mm_per_year: f64,
    pub pesticides_tonnes: f64,
    pub avg_temp: f64,
    pub area: String,
    pub item: String,
}

/// Encode a crop recommendation payload.
///
/// Requires seven numeric fields (N, P, K, temperature, humidity, ph,
/// rainfall). Fails on the first missing or unparsable field.
pub fn encode_crop_features(payload: &Map<String, Value>) -> Result<FeatureVector> {
    let mut values = Vec::with_capacity(CROP_FIELDS.len());
    for field in CROP_FIELDS {
        values.push(numeric_field(payload, field)?);
    }
    Ok(FeatureVector::new(values))
}

/// Encode a fertilizer recommendation payload.
///
/// Categorical labels are looked up via the frozen [`CategoryEncodings`];
/// an unrecognized label is an [`AgrogateError::UnknownCategory`] naming the
/// request field, never a crash or a default code.
///
/// Output column order matches the fertilizer model's training schema:
/// temperature, humidity, moisture, soil code, crop code, nitrogen,
/// potassium, phosphorous.
pub fn encode_fertilizer_features(
    payload: &Map<String, Value>,
    encodings: &CategoryEncodings,
) -> Result<FeatureVector> {
    let soil_label = string_field(payload, "soil_type")?;
    let soil_code = encodings
        .soil
        .code_for(&soil_label)
        .ok_or_else(|| AgrogateError::UnknownCategory {
            domain: "soil_type".to_string(),
            label: soil_label.clone(),
        })?;

    let crop_label = string_field(payload, "crop_type")?;
    let crop_code = encodings
        .crop
        .code_for(&crop_label)
        .ok_or_else(|| AgrogateError::UnknownCategory {
            domain: "crop_type".to_string(),
            label: crop_label.clone(),
        })?;

    Ok(FeatureVector::new(vec![
        numeric_field(payload, "temperature")?,
        numeric_field(payload, "humidity")?,
        numeric_field(payload, "moisture")?,
        soil_code as f64,
        crop_code as f64,
        numeric_field(payload, "nitrogen")?,
        numeric_field(payload, "potassium")?,
        numeric_field(payload, "phosphorous")?,
    ]))
}

/// Encode a crop yield payload.
///
/// Presence of all six required fields is checked first, in
/// [`YIELD_REQUIRED_FIELDS`] order, before any numeric coercion is
/// attempted; the first missing field is reported.
pub fn encode_yield_features(payload: &Map<String, Value>) -> Result<YieldRow> {
    for field in YIELD_REQUIRED_FIELDS {
        if !payload.contains_key(field) {
            return Err(AgrogateError::MissingField {
                field: field.to_string(),
            });
        }
    }

    Ok(YieldRow {
        year: integer_field(payload, "Year")?,
        average_rain_fall_mm_per_year: numeric_field(payload, "average_rain_fall_mm_per_year")?,
        pesticides_tonnes: numeric_field(payload, "pesticides_tonnes")?,
        avg_temp: numeric_field(payload, "avg_temp")?,
        area: string_field(payload, "Area")?,
        item: string_field(payload, "Item")?,
    })
}

/// Extract a numeric field, accepting JSON numbers or numeric strings.
fn numeric_field(payload: &Map<String, Value>, field: &str) -> Result<f64> {
    let value = payload.get(field).ok_or_else(|| AgrogateError::Validation {
        field: field.to_string(),
    })?;
    let parsed = match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    };
    parsed
        .filter(|v| v.is_finite())
        .ok_or_else(|| AgrogateError::Validation {
            field: field.to_string(),
        })
}

/// Extract an integer field, truncating fractional JSON numbers.
fn integer_field(payload: &Map<String, Value>, field: &str) -> Result<i64> {
    let value = payload.get(field).ok_or_else(|| AgrogateError::Validation {
        field: field.to_string(),
    })?;
    let parsed = match value {
        Value::Number(n) => n.as_i64().or_else(|| n.as_f64().map(|f| f as i64)),
        Value::String(s) => s.trim().parse::<i64>().ok(),
        _ => None,
    };
    parsed.ok_or_else(|| AgrogateError::Validation {
        field: field.to_string(),
    })
}

/// Extract a string field.
fn string_field(payload: &Map<String, Value>, field: &str) -> Result<String> {
    match payload.get(field) {
        Some(Value::String(s)) => Ok(s.clone()),
        _ => Err(AgrogateError::Validation {
            field: field.to_string(),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn obj(value: Value) -> Map<String, Value> {
        value.as_object().unwrap().clone()
    }

    #[test]
    fn numeric_field_accepts_numbers_and_numeric_strings() {
        let payload = obj(json!({"a": 1.5, "b": "2.5"}));
        assert_eq!(numeric_field(&payload, "a").unwrap(), 1.5);
        assert_eq!(numeric_field(&payload, "b").unwrap(), 2.5);
    }

    #[test]
    fn numeric_field_rejects_missing_and_garbage() {
        let payload = obj(json!({"a": "soil", "b": null}));
        for field in ["a", "b", "c"] {
            match numeric_field(&payload, field) {
                Err(AgrogateError::Validation { field: f }) => assert_eq!(f, field),
                other => panic!("expected Validation error, got {other:?}"),
            }
        }
    }

    #[test]
    fn integer_field_truncates_like_the_training_job() {
        let payload = obj(json!({"Year": 2019.7}));
        assert_eq!(integer_field(&payload, "Year").unwrap(), 2019);
    }

    #[test]
    fn yield_presence_check_precedes_coercion() {
        // avg_temp is garbage, but Item is missing — presence wins.
        let payload = obj(json!({
            "Year": 2019,
            "average_rain_fall_mm_per_year": 1485.0,
            "pesticides_tonnes": 121.0,
            "avg_temp": "not-a-number"
        }));
        match encode_yield_features(&payload) {
            Err(AgrogateError::MissingField { field }) => assert_eq!(field, "Area"),
            other => panic!("expected MissingField, got {other:?}"),
        }
    }
}
