//! Agent failure is always signaled by error, never by panic (spec §6
//! "External Interfaces").

use thiserror::Error;

#[derive(Debug, Error)]
pub enum AgentError {
    #[error("agent call failed: {0}")]
    CallFailed(String),

    #[error("agent output failed schema validation: {0}")]
    SchemaValidation(String),

    #[error("tool use failed: {0}")]
    ToolFailure(String),

    #[error("agent call timed out")]
    Timeout,
}
