//! Thin pass-through models for entities whose owning store is out of scope
//! (§1): the engine only needs the repository contract it reads through.

use serde::{Deserialize, Serialize};
use sqlx::FromRow;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct UserProfile {
    pub user_id: String,
    pub display_name: Option<String>,
    /// JSON-encoded opaque preferences blob.
    pub preferences: String,
    pub created_at: String,
    pub updated_at: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct ChatMessage {
    pub chat_id: String,
    pub task_id: String,
    pub role: String,
    pub content: String,
    pub created_at: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Note {
    pub note_id: String,
    pub roadmap_id: String,
    pub concept_id: Option<String>,
    pub body: String,
    pub created_at: String,
    pub updated_at: String,
}
