//! Prediction persistence boundary.
//!
//! The pipeline persists one [`PredictionRecord`] per successful prediction
//! and the history endpoints read them back, newest first, scoped to the
//! owning user. Backends implement [`PredictionStore`] and are injected as
//! `Arc<dyn PredictionStore>`; [`MemoryStore`] is the in-process backend.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::{Map, Value};
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::Result;

/// Collection for crop recommendation records.
pub const CROP_PREDICTIONS: &str = "crop_predictions";
/// Collection for fertilizer recommendation records.
pub const FERTILIZER_RECOMMENDATIONS: &str = "fertilizer_recommendations";
/// Collection for yield prediction records.
pub const YIELD_PREDICTIONS: &str = "yield_predictions";

/// Durable record of one prediction, owned by a user identity.
///
/// Created once per successful prediction; never mutated.
#[derive(Debug, Clone, Serialize)]
pub struct PredictionRecord {
    pub id: Uuid,
    pub user_id: String,
    pub collection: String,
    /// Kind-specific payload fields, frozen at creation time.
    pub fields: Map<String, Value>,
    pub created_at: DateTime<Utc>,
}

/// Collaborator interface for persisting and listing prediction records.
#[async_trait]
pub trait PredictionStore: Send + Sync {
    /// Persist a new record in `collection` for `user_id`, stamped with the
    /// current UTC time.
    async fn record(&self, collection: &str, user_id: &str, fields: Map<String, Value>)
        -> Result<()>;

    /// Records in `collection` belonging to `user_id`, newest first.
    async fn list_for(&self, collection: &str, user_id: &str) -> Result<Vec<PredictionRecord>>;
}

/// In-memory prediction store.
#[derive(Default)]
pub struct MemoryStore {
    records: RwLock<Vec<PredictionRecord>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl PredictionStore for MemoryStore {
    async fn record(
        &self,
        collection: &str,
        user_id: &str,
        fields: Map<String, Value>,
    ) -> Result<()> {
        let record = PredictionRecord {
            id: Uuid::new_v4(),
            user_id: user_id.to_string(),
            collection: collection.to_string(),
            fields,
            created_at: Utc::now(),
        };
        self.records.write().await.push(record);
        Ok(())
    }

    async fn list_for(&self, collection: &str, user_id: &str) -> Result<Vec<PredictionRecord>> {
        let records = self.records.read().await;
        // Reverse insertion order before the stable sort so records sharing
        // a timestamp still come back newest-insertion-first.
        let mut matching: Vec<PredictionRecord> = records
            .iter()
            .rev()
            .filter(|r| r.collection == collection && r.user_id == user_id)
            .cloned()
            .collect();
        matching.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(matching)
    }
}
