//! Tutorial repository.
//!
//! Versioned, unlike resources/quizzes: a new tutorial body does not replace
//! the old one, it is inserted as a new row and the previous latest row for
//! the same `(roadmap_id, concept_id)` is flipped to `is_latest = false`.
//! Both writes happen inside one transaction so readers never observe two
//! rows with `is_latest = true` (spec §3, §5 "serialized per concept").

use crate::connection::DbPool;
use crate::models::Tutorial;
use chrono::Utc;
use uuid::Uuid;

pub struct TutorialRepository;

impl TutorialRepository {
    pub async fn get_latest(
        pool: &DbPool,
        roadmap_id: &str,
        concept_id: &str,
    ) -> Result<Option<Tutorial>, sqlx::Error> {
        sqlx::query_as::<_, Tutorial>(
            "SELECT * FROM tutorials WHERE roadmap_id = ? AND concept_id = ? AND is_latest = 1",
        )
        .bind(roadmap_id)
        .bind(concept_id)
        .fetch_optional(pool)
        .await
    }

    pub async fn list_versions(
        pool: &DbPool,
        roadmap_id: &str,
        concept_id: &str,
    ) -> Result<Vec<Tutorial>, sqlx::Error> {
        sqlx::query_as::<_, Tutorial>(
            "SELECT * FROM tutorials WHERE roadmap_id = ? AND concept_id = ? ORDER BY content_version DESC",
        )
        .bind(roadmap_id)
        .bind(concept_id)
        .fetch_all(pool)
        .await
    }

    /// Inserts a new tutorial version and demotes the previous latest row,
    /// inside one transaction.
    pub async fn insert_new_version(
        pool: &DbPool,
        roadmap_id: &str,
        concept_id: &str,
        title: &str,
        summary: Option<&str>,
        body_url: &str,
        estimated_minutes: Option<i64>,
    ) -> Result<Tutorial, sqlx::Error> {
        let mut tx = pool.begin().await?;

        let previous: Option<(i64,)> = sqlx::query_as(
            "SELECT content_version FROM tutorials WHERE roadmap_id = ? AND concept_id = ? AND is_latest = 1",
        )
        .bind(roadmap_id)
        .bind(concept_id)
        .fetch_optional(&mut *tx)
        .await?;

        sqlx::query(
            "UPDATE tutorials SET is_latest = 0 WHERE roadmap_id = ? AND concept_id = ? AND is_latest = 1",
        )
        .bind(roadmap_id)
        .bind(concept_id)
        .execute(&mut *tx)
        .await?;

        let next_version = previous.map(|(v,)| v + 1).unwrap_or(1);
        let tutorial_id = Uuid::new_v4().to_string();
        let now = Utc::now().to_rfc3339();

        let tutorial = sqlx::query_as::<_, Tutorial>(
            "INSERT INTO tutorials
                (tutorial_id, roadmap_id, concept_id, title, summary, status, content_version, is_latest, body_url, estimated_minutes, created_at, updated_at)
             VALUES (?, ?, ?, ?, ?, 'ready', ?, 1, ?, ?, ?, ?)
             RETURNING *",
        )
        .bind(&tutorial_id)
        .bind(roadmap_id)
        .bind(concept_id)
        .bind(title)
        .bind(summary)
        .bind(next_version)
        .bind(body_url)
        .bind(estimated_minutes)
        .bind(&now)
        .bind(&now)
        .fetch_one(&mut *tx)
        .await?;

        tx.commit().await?;
        Ok(tutorial)
    }

    pub async fn mark_status(
        pool: &DbPool,
        tutorial_id: &str,
        status: &str,
    ) -> Result<(), sqlx::Error> {
        let now = Utc::now().to_rfc3339();
        sqlx::query("UPDATE tutorials SET status = ?, updated_at = ? WHERE tutorial_id = ?")
            .bind(status)
            .bind(&now)
            .bind(tutorial_id)
            .execute(pool)
            .await?;
        Ok(())
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
        RoadmapRepository::create(db.pool(), "r1", "t1", "u1", "Roadmap", "{}", 0, 0, 0)
            .await
            .unwrap();
        db
    }

    #[tokio::test]
    async fn first_version_starts_at_one() {
        let db = test_db().await;
        let tutorial = TutorialRepository::insert_new_version(
            db.pool(),
            "r1",
            "c1",
            "Intro",
            None,
            "s3://body/1",
            Some(15),
        )
        .await
        .unwrap();
        assert_eq!(tutorial.content_version, 1);
        assert!(tutorial.is_latest);
    }

    #[tokio::test]
    async fn new_version_demotes_previous_latest() {
        let db = test_db().await;
        let first = TutorialRepository::insert_new_version(
            db.pool(), "r1", "c1", "Intro", None, "s3://body/1", None,
        )
        .await
        .unwrap();
        let second = TutorialRepository::insert_new_version(
            db.pool(), "r1", "c1", "Intro v2", None, "s3://body/2", None,
        )
        .await
        .unwrap();

        assert_eq!(second.content_version, 2);

        let versions = TutorialRepository::list_versions(db.pool(), "r1", "c1").await.unwrap();
        assert_eq!(versions.len(), 2);
        let latest_count = versions.iter().filter(|t| t.is_latest).count();
        assert_eq!(latest_count, 1);
        assert_eq!(
            versions.iter().find(|t| t.is_latest).unwrap().tutorial_id,
            second.tutorial_id
        );
        assert_ne!(first.tutorial_id, second.tutorial_id);
    }
}
