//! Roadmap edit record repository. Append-only, one row per edit round.

use crate::connection::DbPool;
use crate::models::EditRecord;
use chrono::Utc;
use uuid::Uuid;

pub struct EditRepository;

#[derive(Debug, sqlx::FromRow)]
struct RoundRow {
    edit_round: i64,
}

impl EditRepository {
    pub async fn next_round(pool: &DbPool, task_id: &str) -> Result<i64, sqlx::Error> {
        let row: Option<RoundRow> = sqlx::query_as(
            "SELECT edit_round FROM edit_records WHERE task_id = ? ORDER BY edit_round DESC LIMIT 1",
        )
        .bind(task_id)
        .fetch_optional(pool)
        .await?;
        Ok(row.map(|r| r.edit_round + 1).unwrap_or(1))
    }

    pub async fn create(
        pool: &DbPool,
        task_id: &str,
        roadmap_id: &str,
        origin_framework_json: &str,
        modified_framework_json: &str,
        changed_concept_ids: &[String],
        summary: Option<&str>,
    ) -> Result<EditRecord, sqlx::Error> {
        let round = Self::next_round(pool, task_id).await?;
        let id = Uuid::new_v4().to_string();
        let now = Utc::now().to_rfc3339();

        sqlx::query_as::<_, EditRecord>(
            "INSERT INTO edit_records
                (id, task_id, roadmap_id, edit_round, origin_framework, modified_framework, changed_concept_ids, summary, created_at)
             VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)
             RETURNING *",
        )
        .bind(&id)
        .bind(task_id)
        .bind(roadmap_id)
        .bind(round)
        .bind(origin_framework_json)
        .bind(modified_framework_json)
        .bind(serde_json::to_string(changed_concept_ids).unwrap_or_else(|_| "[]".into()))
        .bind(summary)
        .bind(&now)
        .fetch_one(pool)
        .await
    }

    pub async fn list_for_task(pool: &DbPool, task_id: &str) -> Result<Vec<EditRecord>, sqlx::Error> {
        sqlx::query_as::<_, EditRecord>(
            "SELECT * FROM edit_records WHERE task_id = ? ORDER BY edit_round ASC",
        )
        .bind(task_id)
        .fetch_all(pool)
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
    async fn rounds_increment_and_list_in_order() {
        let db = test_db().await;
        EditRepository::create(db.pool(), "t1", "r1", "{}", "{}", &["c1".into()], Some("first")).await.unwrap();
        EditRepository::create(db.pool(), "t1", "r1", "{}", "{}", &["c2".into()], Some("second")).await.unwrap();

        let all = EditRepository::list_for_task(db.pool(), "t1").await.unwrap();
        assert_eq!(all.len(), 2);
        assert_eq!(all[0].edit_round, 1);
        assert_eq!(all[1].edit_round, 2);
    }
}
