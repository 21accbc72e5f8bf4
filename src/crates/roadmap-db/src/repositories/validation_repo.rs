//! Validation record repository. Append-only: each validation pass writes a
//! new row keyed by an incrementing `validation_round` (spec §4.6).

use crate::connection::DbPool;
use crate::models::{DimensionScore, ValidationIssue};
use chrono::Utc;
use uuid::Uuid;

pub struct ValidationRepository;

#[derive(Debug, sqlx::FromRow)]
struct RoundRow {
    validation_round: i64,
}

impl ValidationRepository {
    pub async fn next_round(pool: &DbPool, task_id: &str) -> Result<i64, sqlx::Error> {
        let row: Option<RoundRow> = sqlx::query_as(
            "SELECT validation_round FROM validation_records WHERE task_id = ? ORDER BY validation_round DESC LIMIT 1",
        )
        .bind(task_id)
        .fetch_optional(pool)
        .await?;
        Ok(row.map(|r| r.validation_round + 1).unwrap_or(1))
    }

    #[allow(clippy::too_many_arguments)]
    pub async fn create(
        pool: &DbPool,
        task_id: &str,
        roadmap_id: &str,
        is_valid: bool,
        overall_score: f64,
        dimension_scores: &[DimensionScore],
        issues: &[ValidationIssue],
        improvement_suggestions: &[String],
        validation_summary: Option<&str>,
    ) -> Result<crate::models::ValidationRecord, sqlx::Error> {
        let critical_count = issues
            .iter()
            .filter(|i| matches!(i.severity, crate::models::IssueSeverity::Critical))
            .count() as i64;
        let warning_count = issues.len() as i64 - critical_count;

        let round = Self::next_round(pool, task_id).await?;
        let id = Uuid::new_v4().to_string();
        let now = Utc::now().to_rfc3339();

        sqlx::query_as::<_, crate::models::ValidationRecord>(
            "INSERT INTO validation_records
                (id, task_id, roadmap_id, validation_round, is_valid, overall_score, critical_count, warning_count, dimension_scores, issues, improvement_suggestions, validation_summary, created_at)
             VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
             RETURNING *",
        )
        .bind(&id)
        .bind(task_id)
        .bind(roadmap_id)
        .bind(round)
        .bind(is_valid)
        .bind(overall_score)
        .bind(critical_count)
        .bind(warning_count)
        .bind(serde_json::to_string(dimension_scores).unwrap_or_else(|_| "[]".into()))
        .bind(serde_json::to_string(issues).unwrap_or_else(|_| "[]".into()))
        .bind(serde_json::to_string(improvement_suggestions).unwrap_or_else(|_| "[]".into()))
        .bind(validation_summary)
        .bind(&now)
        .fetch_one(pool)
        .await
    }

    pub async fn latest_for_task(
        pool: &DbPool,
        task_id: &str,
    ) -> Result<Option<crate::models::ValidationRecord>, sqlx::Error> {
        sqlx::query_as::<_, crate::models::ValidationRecord>(
            "SELECT * FROM validation_records WHERE task_id = ? ORDER BY validation_round DESC LIMIT 1",
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
    use crate::models::IssueSeverity;
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
    async fn rounds_increment_per_task() {
        let db = test_db().await;
        let issues = vec![ValidationIssue {
            severity: IssueSeverity::Critical,
            category: "coverage".into(),
            location: "stage1".into(),
            description: "missing prerequisite".into(),
            affected_concepts: vec!["c1".into()],
        }];
        let first = ValidationRepository::create(db.pool(), "t1", "r1", false, 50.0, &[], &issues, &[], None)
            .await
            .unwrap();
        assert_eq!(first.validation_round, 1);
        assert_eq!(first.critical_count, 1);

        let second = ValidationRepository::create(db.pool(), "t1", "r1", true, 90.0, &[], &[], &[], None)
            .await
            .unwrap();
        assert_eq!(second.validation_round, 2);

        let latest = ValidationRepository::latest_for_task(db.pool(), "t1").await.unwrap().unwrap();
        assert_eq!(latest.id, second.id);
    }
}
