//! Hard-deletes roadmaps that were soft-deleted past their retention window
//! (spec §3 "retention sweep"). Run periodically by the worker process, not
//! on the request path.

use crate::connection::DbPool;
use chrono::Duration;

pub struct RetentionSweeper;

impl RetentionSweeper {
    /// Permanently removes roadmap rows (and their dependent content rows)
    /// whose `deleted_at` is older than `retention`. Returns the number of
    /// roadmaps purged.
    pub async fn sweep(pool: &DbPool, retention: Duration) -> Result<u64, sqlx::Error> {
        let cutoff = (chrono::Utc::now() - retention).to_rfc3339();

        let expired: Vec<(String,)> =
            sqlx::query_as("SELECT roadmap_id FROM roadmaps WHERE deleted_at IS NOT NULL AND deleted_at < ?")
                .bind(&cutoff)
                .fetch_all(pool)
                .await?;

        if expired.is_empty() {
            return Ok(0);
        }

        let mut tx = pool.begin().await?;
        for (roadmap_id,) in &expired {
            sqlx::query("DELETE FROM tutorials WHERE roadmap_id = ?").bind(roadmap_id).execute(&mut *tx).await?;
            sqlx::query("DELETE FROM resources WHERE roadmap_id = ?").bind(roadmap_id).execute(&mut *tx).await?;
            sqlx::query("DELETE FROM quizzes WHERE roadmap_id = ?").bind(roadmap_id).execute(&mut *tx).await?;
            sqlx::query("DELETE FROM notes WHERE roadmap_id = ?").bind(roadmap_id).execute(&mut *tx).await?;
            sqlx::query("DELETE FROM roadmaps WHERE roadmap_id = ?").bind(roadmap_id).execute(&mut *tx).await?;
        }
        tx.commit().await?;

        Ok(expired.len() as u64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::connection::MetadataDatabase;
    use crate::repositories::roadmap_repo::RoadmapRepository;

    async fn test_db() -> MetadataDatabase {
        let db = MetadataDatabase::connect("sqlite::memory:").await.unwrap();
        db.run_migrations().await.unwrap();
        db
    }

    #[tokio::test]
    async fn only_purges_past_retention_window() {
        let db = test_db().await;
        RoadmapRepository::create(db.pool(), "r-old", "t1", "u1", "Old", "{}", 0, 0, 0).await.unwrap();
        RoadmapRepository::create(db.pool(), "r-new", "t2", "u1", "New", "{}", 0, 0, 0).await.unwrap();
        RoadmapRepository::soft_delete(db.pool(), "r-old", "u1").await.unwrap();
        RoadmapRepository::soft_delete(db.pool(), "r-new", "u1").await.unwrap();

        // r-old looks ancient by backdating its deleted_at directly.
        sqlx::query("UPDATE roadmaps SET deleted_at = '2000-01-01T00:00:00Z' WHERE roadmap_id = 'r-old'")
            .execute(db.pool())
            .await
            .unwrap();

        let purged = RetentionSweeper::sweep(db.pool(), Duration::days(30)).await.unwrap();
        assert_eq!(purged, 1);

        let remaining: Vec<(String,)> = sqlx::query_as("SELECT roadmap_id FROM roadmaps")
            .fetch_all(db.pool())
            .await
            .unwrap();
        assert_eq!(remaining.len(), 1);
        assert_eq!(remaining[0].0, "r-new");
    }

    #[tokio::test]
    async fn ignores_roadmaps_not_soft_deleted() {
        let db = test_db().await;
        RoadmapRepository::create(db.pool(), "r1", "t1", "u1", "Active", "{}", 0, 0, 0).await.unwrap();
        let purged = RetentionSweeper::sweep(db.pool(), Duration::days(0)).await.unwrap();
        assert_eq!(purged, 0);
    }
}
