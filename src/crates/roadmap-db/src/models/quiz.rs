use serde::{Deserialize, Serialize};
use sqlx::FromRow;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QuizQuestion {
    pub prompt: String,
    pub choices: Vec<String>,
    pub correct_index: usize,
}

/// Single-version, like [`crate::models::resource::ResourceBundle`].
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Quiz {
    pub quiz_id: String,
    pub roadmap_id: String,
    pub concept_id: String,
    pub status: String,
    pub question_count: i64,
    /// JSON-encoded `Vec<QuizQuestion>`.
    pub payload: String,
    pub created_at: String,
    pub updated_at: String,
}

impl Quiz {
    pub fn questions(&self) -> Vec<QuizQuestion> {
        serde_json::from_str(&self.payload).unwrap_or_default()
    }
}
