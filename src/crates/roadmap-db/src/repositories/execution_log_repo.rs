//! Execution log repository. Append-only, written in batches by
//! `roadmap-logger`'s buffered flush.

use crate::connection::DbPool;
use crate::models::{ExecutionLogRow, LogSummary, NewExecutionLog};
use chrono::Utc;
use std::collections::HashMap;
use uuid::Uuid;

pub struct ExecutionLogRepository;

impl ExecutionLogRepository {
    /// Inserts a batch of buffered records in one transaction. Called at
    /// quiescence points rather than per log call (spec §4.5 "buffered
    /// flush").
    pub async fn insert_batch(pool: &DbPool, records: &[NewExecutionLog]) -> Result<(), sqlx::Error> {
        if records.is_empty() {
            return Ok(());
        }

        let mut tx = pool.begin().await?;
        let now = Utc::now().to_rfc3339();

        for record in records {
            let id = Uuid::new_v4().to_string();
            let details = record
                .details
                .as_ref()
                .map(|v| serde_json::to_string(v).unwrap_or_default());

            sqlx::query(
                "INSERT INTO execution_logs
                    (id, task_id, level, category, step, agent_name, concept_id, roadmap_id, message, details, duration_ms, created_at)
                 VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)",
            )
            .bind(&id)
            .bind(&record.task_id)
            .bind(record.level.as_str())
            .bind(record.category.as_str())
            .bind(&record.step)
            .bind(&record.agent_name)
            .bind(&record.concept_id)
            .bind(&record.roadmap_id)
            .bind(&record.message)
            .bind(details)
            .bind(record.duration_ms.map(|v| v as i64))
            .bind(&now)
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;
        Ok(())
    }

    pub async fn list_for_task(
        pool: &DbPool,
        task_id: &str,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<ExecutionLogRow>, sqlx::Error> {
        sqlx::query_as::<_, ExecutionLogRow>(
            "SELECT * FROM execution_logs WHERE task_id = ? ORDER BY created_at DESC LIMIT ? OFFSET ?",
        )
        .bind(task_id)
        .bind(limit)
        .bind(offset)
        .fetch_all(pool)
        .await
    }

    pub async fn summary_for_task(pool: &DbPool, task_id: &str) -> Result<LogSummary, sqlx::Error> {
        let rows = sqlx::query_as::<_, ExecutionLogRow>(
            "SELECT * FROM execution_logs WHERE task_id = ? ORDER BY created_at ASC",
        )
        .bind(task_id)
        .fetch_all(pool)
        .await?;

        let mut summary = LogSummary {
            total: rows.len() as i64,
            ..Default::default()
        };

        let mut by_level: HashMap<String, i64> = HashMap::new();
        let mut by_category: HashMap<String, i64> = HashMap::new();

        for row in &rows {
            *by_level.entry(row.level.clone()).or_insert(0) += 1;
            *by_category.entry(row.category.clone()).or_insert(0) += 1;
            summary.total_duration_ms += row.duration_ms.unwrap_or(0);
        }

        summary.by_level = by_level;
        summary.by_category = by_category;
        summary.earliest = rows.first().map(|r| r.created_at.clone());
        summary.latest = rows.last().map(|r| r.created_at.clone());

        Ok(summary)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::connection::MetadataDatabase;
    use crate::models::{LogCategory, LogLevel};
    use crate::repositories::task_repo::TaskRepository;

    async fn test_db() -> MetadataDatabase {
        let db = MetadataDatabase::connect("sqlite::memory:").await.unwrap();
        db.run_migrations().await.unwrap();
        TaskRepository::create(db.pool(), "t1", "u1", "creation", "{}").await.unwrap();
        db
    }

    fn sample(task_id: &str, level: LogLevel) -> NewExecutionLog {
        NewExecutionLog {
            task_id: task_id.to_string(),
            level,
            category: LogCategory::Workflow,
            step: Some("intent_analysis".into()),
            agent_name: None,
            concept_id: None,
            roadmap_id: None,
            message: "step started".into(),
            details: None,
            duration_ms: Some(120),
        }
    }

    #[tokio::test]
    async fn batch_insert_is_queryable_and_summarized() {
        let db = test_db().await;
        let records = vec![sample("t1", LogLevel::Info), sample("t1", LogLevel::Warning)];
        ExecutionLogRepository::insert_batch(db.pool(), &records).await.unwrap();

        let rows = ExecutionLogRepository::list_for_task(db.pool(), "t1", 10, 0).await.unwrap();
        assert_eq!(rows.len(), 2);

        let summary = ExecutionLogRepository::summary_for_task(db.pool(), "t1").await.unwrap();
        assert_eq!(summary.total, 2);
        assert_eq!(summary.by_level.get("info"), Some(&1));
        assert_eq!(summary.by_level.get("warning"), Some(&1));
        assert_eq!(summary.total_duration_ms, 240);
    }

    #[tokio::test]
    async fn empty_batch_is_a_no_op() {
        let db = test_db().await;
        ExecutionLogRepository::insert_batch(db.pool(), &[]).await.unwrap();
        let rows = ExecutionLogRepository::list_for_task(db.pool(), "t1", 10, 0).await.unwrap();
        assert!(rows.is_empty());
    }
}
