//! Human review feedback repository. Append-only, one row per review round.

use crate::connection::DbPool;
use crate::models::HumanReviewFeedback;
use chrono::Utc;
use uuid::Uuid;

pub struct ReviewFeedbackRepository;

#[derive(Debug, sqlx::FromRow)]
struct RoundRow {
    review_round: i64,
}

impl ReviewFeedbackRepository {
    pub async fn next_round(pool: &DbPool, task_id: &str) -> Result<i64, sqlx::Error> {
        let row: Option<RoundRow> = sqlx::query_as(
            "SELECT review_round FROM human_review_feedback WHERE task_id = ? ORDER BY review_round DESC LIMIT 1",
        )
        .bind(task_id)
        .fetch_optional(pool)
        .await?;
        Ok(row.map(|r| r.review_round + 1).unwrap_or(1))
    }

    pub async fn create(
        pool: &DbPool,
        task_id: &str,
        roadmap_id: &str,
        approved: bool,
        feedback: Option<&str>,
        framework_snapshot_json: &str,
    ) -> Result<HumanReviewFeedback, sqlx::Error> {
        let round = Self::next_round(pool, task_id).await?;
        let id = Uuid::new_v4().to_string();
        let now = Utc::now().to_rfc3339();

        sqlx::query_as::<_, HumanReviewFeedback>(
            "INSERT INTO human_review_feedback
                (id, task_id, roadmap_id, review_round, approved, feedback, framework_snapshot, created_at)
             VALUES (?, ?, ?, ?, ?, ?, ?, ?)
             RETURNING *",
        )
        .bind(&id)
        .bind(task_id)
        .bind(roadmap_id)
        .bind(round)
        .bind(approved)
        .bind(feedback)
        .bind(framework_snapshot_json)
        .bind(&now)
        .fetch_one(pool)
        .await
    }

    pub async fn latest_for_task(
        pool: &DbPool,
        task_id: &str,
    ) -> Result<Option<HumanReviewFeedback>, sqlx::Error> {
        sqlx::query_as::<_, HumanReviewFeedback>(
            "SELECT * FROM human_review_feedback WHERE task_id = ? ORDER BY review_round DESC LIMIT 1",
        )
        .bind(task_id)
        .fetch_optional(pool)
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::connection::MetadataDatabase;
    use crate::repositories::roadmap_repo::RoadmapRepository;
    use crate::repositories::task_repo::TaskRepository;

    async fn test_db() -> MetadataDatabase {
        let db = MetadataDatabase::connect("sqlite::memory:").await.unwrap();
        db.run_migrations().await.unwrap();
        TaskRepository::create(db.pool(), "t1", "u1", "creation", "{}").await.unwrap();
        RoadmapRepository::create(db.pool(), "r1", "t1", "u1", "Roadmap", "{}", 0, 0, 0)
            .await
            .unwrap();
        db
    }

    #[tokio::test]
    async fn rejections_increment_round_until_approved() {
        let db = test_db().await;
        let first = ReviewFeedbackRepository::create(db.pool(), "t1", "r1", false, Some("too dense"), "{}")
            .await
            .unwrap();
        assert_eq!(first.review_round, 1);

        let second = ReviewFeedbackRepository::create(db.pool(), "t1", "r1", true, None, "{}")
            .await
            .unwrap();
        assert_eq!(second.review_round, 2);
        assert!(second.approved);

        let latest = ReviewFeedbackRepository::latest_for_task(db.pool(), "t1").await.unwrap().unwrap();
        assert!(latest.approved);
    }
}
