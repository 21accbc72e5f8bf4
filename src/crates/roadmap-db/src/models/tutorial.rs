use serde::{Deserialize, Serialize};
use sqlx::FromRow;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Tutorial {
    pub tutorial_id: String,
    pub roadmap_id: String,
    pub concept_id: String,
    pub title: String,
    pub summary: Option<String>,
    pub status: String,
    pub content_version: i64,
    pub is_latest: bool,
    /// URL into the object store; the body itself never enters workflow state.
    pub body_url: Option<String>,
    pub estimated_minutes: Option<i64>,
    pub created_at: String,
    pub updated_at: String,
}
