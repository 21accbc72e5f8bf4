//! Task repository.

use crate::connection::DbPool;
use crate::models::{truncate_error_message, Task};
use chrono::{Duration, Utc};

pub struct TaskRepository;

impl TaskRepository {
    pub async fn create(
        pool: &DbPool,
        task_id: &str,
        user_id: &str,
        task_type: &str,
        user_request: &str,
    ) -> Result<Task, sqlx::Error> {
        let now = Utc::now().to_rfc3339();
        sqlx::query_as::<_, Task>(
            "INSERT INTO tasks (task_id, user_id, task_type, status, user_request, failed_concepts, created_at, updated_at)
             VALUES (?, ?, ?, 'pending', ?, '{}', ?, ?)
             RETURNING *",
        )
        .bind(task_id)
        .bind(user_id)
        .bind(task_type)
        .bind(user_request)
        .bind(&now)
        .bind(&now)
        .fetch_one(pool)
        .await
    }

    pub async fn get_by_id(pool: &DbPool, task_id: &str) -> Result<Option<Task>, sqlx::Error> {
        sqlx::query_as::<_, Task>("SELECT * FROM tasks WHERE task_id = ?")
            .bind(task_id)
            .fetch_optional(pool)
            .await
    }

    pub async fn get_by_roadmap_id(pool: &DbPool, roadmap_id: &str) -> Result<Option<Task>, sqlx::Error> {
        sqlx::query_as::<_, Task>("SELECT * FROM tasks WHERE roadmap_id = ?")
            .bind(roadmap_id)
            .fetch_optional(pool)
            .await
    }

    pub async fn list_by_status(pool: &DbPool, status: &str) -> Result<Vec<Task>, sqlx::Error> {
        sqlx::query_as::<_, Task>("SELECT * FROM tasks WHERE status = ? ORDER BY created_at DESC")
            .bind(status)
            .fetch_all(pool)
            .await
    }

    /// Used by the Recovery Manager (C9): tasks stuck `processing` of type
    /// `creation`, created within the last `max_age`.
    pub async fn list_by_status_and_type(
        pool: &DbPool,
        status: &str,
        task_type: &str,
        max_age: Duration,
    ) -> Result<Vec<Task>, sqlx::Error> {
        let cutoff = (Utc::now() - max_age).to_rfc3339();
        sqlx::query_as::<_, Task>(
            "SELECT * FROM tasks WHERE status = ? AND task_type = ? AND created_at >= ? ORDER BY created_at ASC",
        )
        .bind(status)
        .bind(task_type)
        .bind(&cutoff)
        .fetch_all(pool)
        .await
    }

    pub async fn update_status(pool: &DbPool, task_id: &str, status: &str) -> Result<(), sqlx::Error> {
        let now = Utc::now().to_rfc3339();
        sqlx::query("UPDATE tasks SET status = ?, updated_at = ? WHERE task_id = ?")
            .bind(status)
            .bind(&now)
            .bind(task_id)
            .execute(pool)
            .await?;
        Ok(())
    }

    pub async fn update_status_and_step(
        pool: &DbPool,
        task_id: &str,
        status: &str,
        current_step: &str,
    ) -> Result<(), sqlx::Error> {
        let now = Utc::now().to_rfc3339();
        sqlx::query("UPDATE tasks SET status = ?, current_step = ?, updated_at = ? WHERE task_id = ?")
            .bind(status)
            .bind(current_step)
            .bind(&now)
            .bind(task_id)
            .execute(pool)
            .await?;
        Ok(())
    }

    pub async fn set_roadmap_id(pool: &DbPool, task_id: &str, roadmap_id: &str) -> Result<(), sqlx::Error> {
        let now = Utc::now().to_rfc3339();
        sqlx::query("UPDATE tasks SET roadmap_id = ?, updated_at = ? WHERE task_id = ?")
            .bind(roadmap_id)
            .bind(&now)
            .bind(task_id)
            .execute(pool)
            .await?;
        Ok(())
    }

    pub async fn mark_failed(pool: &DbPool, task_id: &str, error_message: &str) -> Result<(), sqlx::Error> {
        let now = Utc::now().to_rfc3339();
        let truncated = truncate_error_message(error_message);
        sqlx::query(
            "UPDATE tasks SET status = 'failed', error_message = ?, updated_at = ?, completed_at = ? WHERE task_id = ?",
        )
        .bind(truncated)
        .bind(&now)
        .bind(&now)
        .bind(task_id)
        .execute(pool)
        .await?;
        Ok(())
    }

    pub async fn mark_terminal(
        pool: &DbPool,
        task_id: &str,
        status: &str,
        execution_summary: Option<&str>,
    ) -> Result<(), sqlx::Error> {
        let now = Utc::now().to_rfc3339();
        sqlx::query(
            "UPDATE tasks SET status = ?, execution_summary = ?, updated_at = ?, completed_at = ? WHERE task_id = ?",
        )
        .bind(status)
        .bind(execution_summary)
        .bind(&now)
        .bind(&now)
        .bind(task_id)
        .execute(pool)
        .await?;
        Ok(())
    }

    pub async fn update_failed_concepts(
        pool: &DbPool,
        task_id: &str,
        failed_concepts_json: &str,
    ) -> Result<(), sqlx::Error> {
        let now = Utc::now().to_rfc3339();
        sqlx::query("UPDATE tasks SET failed_concepts = ?, updated_at = ? WHERE task_id = ?")
            .bind(failed_concepts_json)
            .bind(&now)
            .bind(task_id)
            .execute(pool)
            .await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::connection::MetadataDatabase;

    async fn test_db() -> MetadataDatabase {
        let db = MetadataDatabase::connect("sqlite::memory:").await.unwrap();
        db.run_migrations().await.unwrap();
        db
    }

    #[tokio::test]
    async fn create_and_fetch_round_trips() {
        let db = test_db().await;
        let task = TaskRepository::create(db.pool(), "t1", "u1", "creation", "{}")
            .await
            .unwrap();
        assert_eq!(task.status, "pending");

        let fetched = TaskRepository::get_by_id(db.pool(), "t1").await.unwrap();
        assert_eq!(fetched.unwrap().task_id, "t1");
    }

    #[tokio::test]
    async fn roadmap_id_is_unique_across_tasks() {
        let db = test_db().await;
        TaskRepository::create(db.pool(), "t1", "u1", "creation", "{}").await.unwrap();
        TaskRepository::create(db.pool(), "t2", "u1", "creation", "{}").await.unwrap();
        TaskRepository::set_roadmap_id(db.pool(), "t1", "r1").await.unwrap();

        let err = TaskRepository::set_roadmap_id(db.pool(), "t2", "r1").await;
        assert!(err.is_err());
    }

    #[tokio::test]
    async fn list_by_status_and_type_respects_age_window() {
        let db = test_db().await;
        TaskRepository::create(db.pool(), "t1", "u1", "creation", "{}").await.unwrap();
        TaskRepository::update_status(db.pool(), "t1", "processing").await.unwrap();

        let stuck = TaskRepository::list_by_status_and_type(
            db.pool(),
            "processing",
            "creation",
            Duration::hours(24),
        )
        .await
        .unwrap();
        assert_eq!(stuck.len(), 1);

        let none = TaskRepository::list_by_status_and_type(
            db.pool(),
            "processing",
            "creation",
            Duration::seconds(-1),
        )
        .await
        .unwrap();
        assert!(none.is_empty());
    }

    #[tokio::test]
    async fn mark_failed_sets_terminal_fields() {
        let db = test_db().await;
        TaskRepository::create(db.pool(), "t1", "u1", "creation", "{}").await.unwrap();
        TaskRepository::mark_failed(db.pool(), "t1", "boom").await.unwrap();

        let task = TaskRepository::get_by_id(db.pool(), "t1").await.unwrap().unwrap();
        assert_eq!(task.status, "failed");
        assert_eq!(task.error_message.as_deref(), Some("boom"));
        assert!(task.completed_at.is_some());
    }

    #[tokio::test]
    async fn mark_failed_truncates_long_error_messages() {
        let db = test_db().await;
        TaskRepository::create(db.pool(), "t1", "u1", "creation", "{}").await.unwrap();
        let long_message = "x".repeat(500);
        TaskRepository::mark_failed(db.pool(), "t1", &long_message).await.unwrap();

        let task = TaskRepository::get_by_id(db.pool(), "t1").await.unwrap().unwrap();
        assert_eq!(task.error_message.as_deref().unwrap().chars().count(), 200);
    }
}
