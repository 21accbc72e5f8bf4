use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Payload carried by a suspended workflow run, handed back to the caller
/// so it can be surfaced to a human reviewer and later replayed into
/// [`crate::executor::Executor::resume_after_human_review`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SuspendPayload {
    pub task_id: String,
    pub roadmap_id: String,
    pub node: String,
    pub message: String,
}

/// Errors surfaced by the workflow engine (C5-C10). Suspension is modeled
/// as a variant rather than a panic or a sentinel state value because the
/// executor needs to unwind the same way a hard failure would — stop
/// invoking further nodes — while still carrying a normal, structured
/// payload instead of a failure reason. This generalizes the teacher's
/// inline-interrupt unwinding (`GraphError::InlineInterrupt`) to a
/// cross-process pause that survives a worker restart via the checkpoint
/// store rather than a thread-local.
#[derive(Debug, Error)]
pub enum EngineError {
    #[error("suspended for human review: {0:?}")]
    Suspended(SuspendPayload),

    #[error("agent call failed: {0}")]
    Agent(#[from] roadmap_agents::AgentError),

    #[error("database error: {0}")]
    Db(#[from] roadmap_db::DbError),

    #[error("database query failed: {0}")]
    Sqlx(#[from] sqlx::Error),

    #[error(transparent)]
    Checkpoint(#[from] roadmap_checkpoint::CheckpointError),

    #[error("state error: {0}")]
    State(String),

    #[error("state schema error: {0}")]
    Schema(#[from] roadmap_core::state::StateError),

    #[error("{0} not found")]
    NotFound(String),

    #[error("content fan-out aborted: {0}")]
    FanOutAborted(String),

    #[error("structural validation could not run: {0}")]
    Validator(String),

    #[error("task {task_id} is not awaiting human review (status: {status})")]
    NotAwaitingReview { task_id: String, status: String },

    #[error("serialization error: {0}")]
    Serde(#[from] serde_json::Error),
}

impl EngineError {
    /// Short, stable variant name for the error, used as the exception-type
    /// field on failure log entries (spec §4.5(i)) rather than the full
    /// `Display` message.
    pub fn error_type(&self) -> &'static str {
        match self {
            EngineError::Suspended(_) => "Suspended",
            EngineError::Agent(_) => "AgentError",
            EngineError::Db(_) => "DbError",
            EngineError::Sqlx(_) => "SqlxError",
            EngineError::Checkpoint(_) => "CheckpointError",
            EngineError::State(_) => "StateError",
            EngineError::Schema(_) => "SchemaError",
            EngineError::NotFound(_) => "NotFoundError",
            EngineError::FanOutAborted(_) => "FanOutAborted",
            EngineError::Validator(_) => "ValidatorError",
            EngineError::NotAwaitingReview { .. } => "NotAwaitingReview",
            EngineError::Serde(_) => "SerdeError",
        }
    }
}

pub type Result<T> = std::result::Result<T, EngineError>;
