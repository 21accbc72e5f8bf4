//! Plain, JSON-serializable data transferred across the agent boundary
//! (spec §6: "inputs and outputs are plain data"). Framework-tree types are
//! reused from `roadmap-db::models` rather than duplicated, since the
//! Curriculum/Editor agents operate directly on the same tree the
//! repositories persist.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LearningRequest {
    pub user_id: String,
    pub learning_goal: String,
    pub current_level: String,
    pub available_hours_per_week: f32,
    pub motivation: Option<String>,
    pub career_background: Option<String>,
    pub content_preference: Vec<String>,
    pub additional_context: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IntentAnalysis {
    pub tech_stack: Vec<String>,
    pub difficulty_profile: String,
    pub time_constraint_summary: String,
    pub skill_gaps: Vec<String>,
    pub recommendations: Vec<String>,
    pub summary: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ValidationOutcome {
    pub is_valid: bool,
    pub dimension_scores: Vec<roadmap_db::models::DimensionScore>,
    pub issues: Vec<roadmap_db::models::ValidationIssue>,
    pub improvement_suggestions: Vec<String>,
    pub summary: Option<String>,
}

/// Mirrors the `edit_source` column's two allowed values (spec §3).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EditSource {
    ValidationFailed,
    HumanReview,
}

impl EditSource {
    pub fn as_str(&self) -> &'static str {
        match self {
            EditSource::ValidationFailed => "validation_failed",
            EditSource::HumanReview => "human_review",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TutorialContent {
    pub title: String,
    pub summary: Option<String>,
    pub body_markdown: String,
    pub estimated_minutes: Option<i64>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CoverImageResult {
    pub url: String,
}
