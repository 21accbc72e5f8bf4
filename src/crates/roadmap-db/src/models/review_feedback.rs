use serde::{Deserialize, Serialize};
use sqlx::FromRow;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct HumanReviewFeedback {
    pub id: String,
    pub task_id: String,
    pub roadmap_id: String,
    pub review_round: i64,
    pub approved: bool,
    pub feedback: Option<String>,
    /// JSON-encoded [`super::roadmap::Framework`] snapshot at review time.
    pub framework_snapshot: String,
    pub created_at: String,
}
