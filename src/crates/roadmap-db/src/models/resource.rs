use serde::{Deserialize, Serialize};
use sqlx::FromRow;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResourceItem {
    pub title: String,
    pub url: String,
    pub kind: String,
}

/// Single-version: a new write deletes prior rows for the same
/// `(roadmap_id, concept_id)` (spec §3).
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct ResourceBundle {
    pub resource_id: String,
    pub roadmap_id: String,
    pub concept_id: String,
    pub status: String,
    pub resource_count: i64,
    /// JSON-encoded `Vec<ResourceItem>`.
    pub payload: String,
    pub created_at: String,
    pub updated_at: String,
}

impl ResourceBundle {
    pub fn items(&self) -> Vec<ResourceItem> {
        serde_json::from_str(&self.payload).unwrap_or_default()
    }
}
