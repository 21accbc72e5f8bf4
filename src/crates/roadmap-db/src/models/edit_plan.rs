use serde::{Deserialize, Serialize};
use sqlx::FromRow;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IntentType {
    Add,
    Remove,
    Modify,
    Reorder,
    Split,
    Merge,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IntentPriority {
    Could,
    Should,
    Must,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EditIntent {
    pub intent_type: IntentType,
    pub target_path: String,
    pub description: String,
    pub priority: IntentPriority,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EditPlan {
    pub feedback_summary: String,
    pub scope_analysis: String,
    pub preservation_requirements: Vec<String>,
    pub intents: Vec<EditIntent>,
    #[serde(default)]
    pub needs_clarification: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct EditPlanRecord {
    pub id: String,
    pub task_id: String,
    pub roadmap_id: String,
    /// `"validation_failed"` or `"human_review"`.
    pub edit_source: String,
    pub feedback_summary: Option<String>,
    pub scope_analysis: Option<String>,
    /// JSON-encoded `Vec<String>`.
    pub preservation_requirements: String,
    /// JSON-encoded `Vec<EditIntent>`.
    pub intents: String,
    pub needs_clarification: bool,
    pub created_at: String,
}

impl EditPlanRecord {
    pub fn intents_value(&self) -> Vec<EditIntent> {
        serde_json::from_str(&self.intents).unwrap_or_default()
    }
}
