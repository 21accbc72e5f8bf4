use serde::{Deserialize, Serialize};
use sqlx::FromRow;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Debug,
    Info,
    Warning,
    Error,
}

impl LogLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            LogLevel::Debug => "debug",
            LogLevel::Info => "info",
            LogLevel::Warning => "warning",
            LogLevel::Error => "error",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogCategory {
    Workflow,
    Agent,
    Tool,
    Database,
}

impl LogCategory {
    pub fn as_str(&self) -> &'static str {
        match self {
            LogCategory::Workflow => "workflow",
            LogCategory::Agent => "agent",
            LogCategory::Tool => "tool",
            LogCategory::Database => "database",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct ExecutionLogRow {
    pub id: String,
    pub task_id: String,
    pub level: String,
    pub category: String,
    pub step: Option<String>,
    pub agent_name: Option<String>,
    pub concept_id: Option<String>,
    pub roadmap_id: Option<String>,
    pub message: String,
    pub details: Option<String>,
    pub duration_ms: Option<i64>,
    pub created_at: String,
}

/// One buffered record, not yet assigned an id or timestamp; built by
/// `roadmap-logger::ExecutionLogger` and flushed in a batch.
#[derive(Debug, Clone)]
pub struct NewExecutionLog {
    pub task_id: String,
    pub level: LogLevel,
    pub category: LogCategory,
    pub step: Option<String>,
    pub agent_name: Option<String>,
    pub concept_id: Option<String>,
    pub roadmap_id: Option<String>,
    pub message: String,
    pub details: Option<serde_json::Value>,
    pub duration_ms: Option<u64>,
}

#[derive(Debug, Clone, Default)]
pub struct LogSummary {
    pub total: i64,
    pub by_level: std::collections::HashMap<String, i64>,
    pub by_category: std::collections::HashMap<String, i64>,
    pub total_duration_ms: i64,
    pub earliest: Option<String>,
    pub latest: Option<String>,
}
