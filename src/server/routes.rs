//! HTTP route handlers and error mapping.
//!
//! Every prediction and history endpoint requires a bearer token; the gate's
//! three verification failure modes map to distinct 401 bodies. Codec and
//! inference failures map to 400 with the error message; anything else is a
//! generic 500 that does not leak internals.

use std::sync::Arc;

use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::http::{header, HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::Deserialize;
use serde_json::{json, Map, Value};
use tracing::warn;

use crate::advisor::AdvisorClient;
use crate::auth::AuthService;
use crate::pipeline::{CropPrediction, FertilizerRecommendation, PredictionPipeline, YieldPrediction};
use crate::store::{self, PredictionRecord, PredictionStore};
use crate::{AgrogateError, Result};

/// Shared state for all handlers.
#[derive(Clone)]
pub struct AppState {
    pub pipeline: Arc<PredictionPipeline>,
    pub store: Arc<dyn PredictionStore>,
    pub auth: Arc<AuthService>,
    /// Absent when no advisor is configured; `/ask` degrades gracefully.
    pub advisor: Option<Arc<AdvisorClient>>,
}

/// Build the route table. Middleware layers are applied by the caller.
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/predict", post(predict_crop))
        .route("/fertilizer-predict", post(predict_fertilizer))
        .route("/cropyield-predict", post(predict_yield))
        .route("/api/crop-predictions", get(crop_history))
        .route("/api/fertilizer-recommendations", get(fertilizer_history))
        .route("/api/yield-predictions", get(yield_history))
        .route("/api/auth/register", post(register))
        .route("/api/auth/login", post(login))
        .route("/ask", post(ask))
        .with_state(state)
}

impl IntoResponse for AgrogateError {
    fn into_response(self) -> Response {
        let (status, body) = match &self {
            AgrogateError::MissingToken => (
                StatusCode::UNAUTHORIZED,
                json!({
                    "error": "Missing or invalid JWT",
                    "message": "Missing Authorization Header"
                }),
            ),
            AgrogateError::InvalidToken(message) => (
                StatusCode::UNAUTHORIZED,
                json!({"error": "Invalid JWT token", "message": message}),
            ),
            AgrogateError::ExpiredToken => (
                StatusCode::UNAUTHORIZED,
                json!({"error": "JWT token expired"}),
            ),
            AgrogateError::InvalidCredentials => (
                StatusCode::UNAUTHORIZED,
                json!({"error": self.to_string()}),
            ),
            AgrogateError::UserExists => {
                (StatusCode::CONFLICT, json!({"msg": self.to_string()}))
            }
            err if err.is_client_error() => {
                (StatusCode::BAD_REQUEST, json!({"error": self.to_string()}))
            }
            _ => {
                warn!(error = %self, "request failed");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    json!({"error": "Internal server error"}),
                )
            }
        };
        (status, Json(body)).into_response()
    }
}

fn bearer(headers: &HeaderMap) -> Option<&str> {
    headers
        .get(header::AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
}

/// Require a JSON object body; anything else is a malformed request.
fn object_body(payload: std::result::Result<Json<Value>, JsonRejection>) -> Result<Map<String, Value>> {
    let Json(value) = payload.map_err(|e| AgrogateError::MalformedRequest(e.to_string()))?;
    match value {
        Value::Object(map) => Ok(map),
        _ => Err(AgrogateError::MalformedRequest(
            "request body must be a JSON object".to_string(),
        )),
    }
}

async fn predict_crop(
    State(state): State<AppState>,
    headers: HeaderMap,
    payload: std::result::Result<Json<Value>, JsonRejection>,
) -> Result<Json<CropPrediction>> {
    let user_id = state.auth.gate().identity_for(bearer(&headers))?;
    let payload = object_body(payload)?;
    let result = state.pipeline.predict_crop(&user_id, &payload).await?;
    Ok(Json(result))
}

async fn predict_fertilizer(
    State(state): State<AppState>,
    headers: HeaderMap,
    payload: std::result::Result<Json<Value>, JsonRejection>,
) -> Result<Json<FertilizerRecommendation>> {
    let user_id = state.auth.gate().identity_for(bearer(&headers))?;
    let payload = object_body(payload)?;
    let result = state.pipeline.predict_fertilizer(&user_id, &payload).await?;
    Ok(Json(result))
}

async fn predict_yield(
    State(state): State<AppState>,
    headers: HeaderMap,
    payload: std::result::Result<Json<Value>, JsonRejection>,
) -> Result<Json<YieldPrediction>> {
    let user_id = state.auth.gate().identity_for(bearer(&headers))?;
    let payload = object_body(payload)?;
    let result = state.pipeline.predict_yield(&user_id, &payload).await?;
    Ok(Json(result))
}

async fn crop_history(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<Json<Vec<Value>>> {
    history(&state, &headers, store::CROP_PREDICTIONS).await
}

async fn fertilizer_history(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<Json<Vec<Value>>> {
    history(&state, &headers, store::FERTILIZER_RECOMMENDATIONS).await
}

async fn yield_history(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<Json<Vec<Value>>> {
    history(&state, &headers, store::YIELD_PREDICTIONS).await
}

async fn history(
    state: &AppState,
    headers: &HeaderMap,
    collection: &str,
) -> Result<Json<Vec<Value>>> {
    let user_id = state.auth.gate().identity_for(bearer(headers))?;
    let records = state.store.list_for(collection, &user_id).await?;
    Ok(Json(records.iter().map(history_entry).collect()))
}

/// Serialize a record the way history clients expect: payload fields
/// flattened, `_id` as string, `createdAt` without a timezone suffix.
fn history_entry(record: &PredictionRecord) -> Value {
    let mut entry = record.fields.clone();
    entry.insert("_id".to_string(), record.id.to_string().into());
    entry.insert("userId".to_string(), record.user_id.clone().into());
    entry.insert(
        "createdAt".to_string(),
        record
            .created_at
            .format("%Y-%m-%dT%H:%M:%S")
            .to_string()
            .into(),
    );
    Value::Object(entry)
}

#[derive(Deserialize)]
struct RegisterRequest {
    #[serde(default)]
    name: Option<String>,
    email: String,
    password: String,
}

async fn register(
    State(state): State<AppState>,
    payload: std::result::Result<Json<RegisterRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<Value>)> {
    let Json(request) = payload.map_err(|e| AgrogateError::MalformedRequest(e.to_string()))?;
    state
        .auth
        .register(request.name.as_deref(), &request.email, &request.password)
        .await?;
    Ok((StatusCode::CREATED, Json(json!({"msg": "User created"}))))
}

#[derive(Deserialize)]
struct LoginRequest {
    email: String,
    password: String,
}

async fn login(
    State(state): State<AppState>,
    payload: std::result::Result<Json<LoginRequest>, JsonRejection>,
) -> Result<Json<Value>> {
    let Json(request) = payload.map_err(|e| AgrogateError::MalformedRequest(e.to_string()))?;
    let session = state.auth.login(&request.email, &request.password).await?;
    Ok(Json(json!({
        "token": session.token,
        "user": {"name": session.name, "email": session.email}
    })))
}

#[derive(Deserialize)]
struct AskRequest {
    #[serde(default)]
    message: String,
    #[serde(default = "default_language")]
    language: String,
}

fn default_language() -> String {
    "English".to_string()
}

/// The advisor endpoint keeps its friendly `{reply}` body on every path,
/// including failures.
async fn ask(
    State(state): State<AppState>,
    payload: std::result::Result<Json<AskRequest>, JsonRejection>,
) -> Response {
    let request = match payload {
        Ok(Json(request)) => request,
        Err(e) => return AgrogateError::MalformedRequest(e.to_string()).into_response(),
    };

    let message = request.message.trim();
    if message.is_empty() {
        return (
            StatusCode::BAD_REQUEST,
            Json(json!({"reply": "Please say or type something to get a response."})),
        )
            .into_response();
    }

    let Some(advisor) = &state.advisor else {
        warn!("advisor request received but no advisor is configured");
        return advisor_failure();
    };

    match advisor.generate(message, request.language.trim()).await {
        Ok(reply) => Json(json!({"reply": reply})).into_response(),
        Err(err) => {
            warn!(error = %err, "advisor request failed");
            advisor_failure()
        }
    }
}

fn advisor_failure() -> Response {
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        Json(json!({"reply": "Something went wrong while processing your request."})),
    )
        .into_response()
}
