use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use std::collections::HashMap;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskType {
    Creation,
    RetryTutorial,
    RetryResources,
    RetryQuiz,
    RetryBatch,
}

impl TaskType {
    pub fn as_str(&self) -> &'static str {
        match self {
            TaskType::Creation => "creation",
            TaskType::RetryTutorial => "retry_tutorial",
            TaskType::RetryResources => "retry_resources",
            TaskType::RetryQuiz => "retry_quiz",
            TaskType::RetryBatch => "retry_batch",
        }
    }
}

impl std::fmt::Display for TaskType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskStatus {
    Pending,
    Processing,
    HumanReviewPending,
    Completed,
    PartialFailure,
    Failed,
    Cancelled,
}

impl TaskStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            TaskStatus::Pending => "pending",
            TaskStatus::Processing => "processing",
            TaskStatus::HumanReviewPending => "human_review_pending",
            TaskStatus::Completed => "completed",
            TaskStatus::PartialFailure => "partial_failure",
            TaskStatus::Failed => "failed",
            TaskStatus::Cancelled => "cancelled",
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            TaskStatus::Completed | TaskStatus::PartialFailure | TaskStatus::Failed | TaskStatus::Cancelled
        )
    }
}

impl std::fmt::Display for TaskStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A failure record for a single concept, embedded in `Task::failed_concepts`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FailedConceptRecord {
    pub concept_id: String,
    pub reason: String,
    pub failed_at: DateTime<Utc>,
}

/// Counts of generated artifacts, set when a task reaches a terminal state.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ExecutionSummary {
    pub tutorials_generated: usize,
    pub resources_generated: usize,
    pub quizzes_generated: usize,
    pub concepts_completed: usize,
    pub concepts_failed: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Task {
    pub task_id: String,
    pub user_id: String,
    pub task_type: String,
    pub status: String,
    pub current_step: Option<String>,
    pub roadmap_id: Option<String>,
    /// Opaque JSON payload, e.g. `{user_id, goal, level}`.
    pub user_request: String,
    pub error_message: Option<String>,
    /// JSON-encoded `HashMap<String, FailedConceptRecord>`.
    pub failed_concepts: String,
    /// JSON-encoded `ExecutionSummary`, present once a terminal state is reached.
    pub execution_summary: Option<String>,
    pub celery_task_id: Option<String>,
    pub created_at: String,
    pub updated_at: String,
    pub completed_at: Option<String>,
}

impl Task {
    pub fn failed_concepts_map(&self) -> HashMap<String, FailedConceptRecord> {
        serde_json::from_str(&self.failed_concepts).unwrap_or_default()
    }

    pub fn execution_summary_value(&self) -> Option<ExecutionSummary> {
        self.execution_summary
            .as_deref()
            .and_then(|s| serde_json::from_str(s).ok())
    }
}

/// Cap on `Task.error_message` and other persisted/published failure
/// reasons, matching the teacher's `notification_service.py` convention of
/// truncating error text before it leaves the process.
pub const ERROR_MESSAGE_MAX_CHARS: usize = 200;

/// Truncates `message` to at most [`ERROR_MESSAGE_MAX_CHARS`] chars, cutting
/// on a char boundary rather than a byte offset.
pub fn truncate_error_message(message: &str) -> String {
    match message.char_indices().nth(ERROR_MESSAGE_MAX_CHARS) {
        Some((byte_idx, _)) => message[..byte_idx].to_string(),
        None => message.to_string(),
    }
}
