//! Buffered execution logger.
//!
//! Buffers records behind a `tokio::sync::Mutex<Vec<_>>` and batch-inserts on
//! [`ExecutionLogger::flush`], satisfying the "short-lived transaction"
//! requirement from the metadata repository contract by writing the whole
//! buffer as one multi-row insert instead of one `INSERT` per log call.
//! Each call also emits a matching `tracing` event so operators get
//! real-time process logs even though the durable record is batched.

use roadmap_db::connection::DbPool;
use roadmap_db::models::{LogCategory, LogLevel, LogSummary, NewExecutionLog};
use roadmap_db::repositories::ExecutionLogRepository;
use tokio::sync::Mutex;

/// Optional fields beyond `task_id`/`level`/`category`/`message`.
#[derive(Debug, Clone, Default)]
pub struct LogFields {
    pub step: Option<String>,
    pub agent_name: Option<String>,
    pub concept_id: Option<String>,
    pub roadmap_id: Option<String>,
    pub details: Option<serde_json::Value>,
    pub duration_ms: Option<u64>,
}

pub struct ExecutionLogger {
    pool: DbPool,
    buffer: Mutex<Vec<NewExecutionLog>>,
}

impl ExecutionLogger {
    pub fn new(pool: DbPool) -> Self {
        Self {
            pool,
            buffer: Mutex::new(Vec::new()),
        }
    }

    pub async fn debug(&self, task_id: &str, category: LogCategory, message: impl Into<String>) {
        self.log(task_id, LogLevel::Debug, category, message, LogFields::default()).await
    }

    pub async fn info(&self, task_id: &str, category: LogCategory, message: impl Into<String>) {
        self.log(task_id, LogLevel::Info, category, message, LogFields::default()).await
    }

    pub async fn warning(&self, task_id: &str, category: LogCategory, message: impl Into<String>) {
        self.log(task_id, LogLevel::Warning, category, message, LogFields::default()).await
    }

    pub async fn error(&self, task_id: &str, category: LogCategory, message: impl Into<String>) {
        self.log(task_id, LogLevel::Error, category, message, LogFields::default()).await
    }

    /// Full-fidelity log call used by the Workflow Brain (C5) for node
    /// start/complete/error entries, which always carry a `step` and often a
    /// `duration_ms`.
    pub async fn log(
        &self,
        task_id: &str,
        level: LogLevel,
        category: LogCategory,
        message: impl Into<String>,
        fields: LogFields,
    ) {
        let message = message.into();

        match level {
            LogLevel::Debug => tracing::debug!(
                task_id, step = fields.step.as_deref(), category = category.as_str(), %message,
            ),
            LogLevel::Info => tracing::info!(
                task_id, step = fields.step.as_deref(), category = category.as_str(), %message,
            ),
            LogLevel::Warning => tracing::warn!(
                task_id, step = fields.step.as_deref(), category = category.as_str(), %message,
            ),
            LogLevel::Error => tracing::error!(
                task_id, step = fields.step.as_deref(), category = category.as_str(), %message,
            ),
        }

        let record = NewExecutionLog {
            task_id: task_id.to_string(),
            level,
            category,
            step: fields.step,
            agent_name: fields.agent_name,
            concept_id: fields.concept_id,
            roadmap_id: fields.roadmap_id,
            message,
            details: fields.details,
            duration_ms: fields.duration_ms,
        };

        self.buffer.lock().await.push(record);
    }

    /// Flushes the buffer as a single batch insert. Safe to call even with
    /// an empty buffer; safe to call concurrently with more `log()` calls.
    pub async fn flush(&self) -> Result<(), sqlx::Error> {
        let batch = {
            let mut buffer = self.buffer.lock().await;
            std::mem::take(&mut *buffer)
        };
        ExecutionLogRepository::insert_batch(&self.pool, &batch).await
    }

    pub async fn summary(&self, task_id: &str) -> Result<LogSummary, sqlx::Error> {
        ExecutionLogRepository::summary_for_task(&self.pool, task_id).await
    }

    pub async fn history(
        &self,
        task_id: &str,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<roadmap_db::models::ExecutionLogRow>, sqlx::Error> {
        ExecutionLogRepository::list_for_task(&self.pool, task_id, limit, offset).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use roadmap_db::connection::MetadataDatabase;

    async fn test_db() -> MetadataDatabase {
        let db = MetadataDatabase::connect("sqlite::memory:").await.unwrap();
        db.run_migrations().await.unwrap();
        db
    }

    #[tokio::test]
    async fn buffers_until_flushed() {
        let db = test_db().await;
        let logger = ExecutionLogger::new(db.pool().clone());

        logger.info("t1", LogCategory::Workflow, "step started").await;
        logger.warning("t1", LogCategory::Agent, "slow response").await;

        let before_flush = logger.history("t1", 10, 0).await.unwrap();
        assert!(before_flush.is_empty());

        logger.flush().await.unwrap();

        let after_flush = logger.history("t1", 10, 0).await.unwrap();
        assert_eq!(after_flush.len(), 2);
    }

    #[tokio::test]
    async fn summary_aggregates_by_level_and_category() {
        let db = test_db().await;
        let logger = ExecutionLogger::new(db.pool().clone());

        logger.log(
            "t1",
            LogLevel::Error,
            LogCategory::Tool,
            "tool call failed",
            LogFields {
                step: Some("content_fanout".into()),
                duration_ms: Some(500),
                ..Default::default()
            },
        )
        .await;
        logger.flush().await.unwrap();

        let summary = logger.summary("t1").await.unwrap();
        assert_eq!(summary.total, 1);
        assert_eq!(summary.by_level.get("error"), Some(&1));
        assert_eq!(summary.by_category.get("tool"), Some(&1));
        assert_eq!(summary.total_duration_ms, 500);
    }

    #[tokio::test]
    async fn flush_with_empty_buffer_is_a_no_op() {
        let db = test_db().await;
        let logger = ExecutionLogger::new(db.pool().clone());
        logger.flush().await.unwrap();
        assert_eq!(logger.history("t1", 10, 0).await.unwrap().len(), 0);
    }
}
