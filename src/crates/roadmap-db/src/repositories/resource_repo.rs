//! Resource bundle repository.
//!
//! Single-version per `(roadmap_id, concept_id)`: replacing the bundle
//! deletes the old row and inserts the new one in one transaction, unlike
//! tutorials which keep history (spec §3).

use crate::connection::DbPool;
use crate::models::{ResourceBundle, ResourceItem};
use chrono::Utc;
use uuid::Uuid;

pub struct ResourceRepository;

impl ResourceRepository {
    pub async fn get(
        pool: &DbPool,
        roadmap_id: &str,
        concept_id: &str,
    ) -> Result<Option<ResourceBundle>, sqlx::Error> {
        sqlx::query_as::<_, ResourceBundle>(
            "SELECT * FROM resources WHERE roadmap_id = ? AND concept_id = ?",
        )
        .bind(roadmap_id)
        .bind(concept_id)
        .fetch_optional(pool)
        .await
    }

    pub async fn replace(
        pool: &DbPool,
        roadmap_id: &str,
        concept_id: &str,
        items: &[ResourceItem],
    ) -> Result<ResourceBundle, sqlx::Error> {
        let payload = serde_json::to_string(items).unwrap_or_else(|_| "[]".to_string());
        let mut tx = pool.begin().await?;

        sqlx::query("DELETE FROM resources WHERE roadmap_id = ? AND concept_id = ?")
            .bind(roadmap_id)
            .bind(concept_id)
            .execute(&mut *tx)
            .await?;

        let resource_id = Uuid::new_v4().to_string();
        let now = Utc::now().to_rfc3339();

        let bundle = sqlx::query_as::<_, ResourceBundle>(
            "INSERT INTO resources (resource_id, roadmap_id, concept_id, status, resource_count, payload, created_at, updated_at)
             VALUES (?, ?, ?, 'ready', ?, ?, ?, ?)
             RETURNING *",
        )
        .bind(&resource_id)
        .bind(roadmap_id)
        .bind(concept_id)
        .bind(items.len() as i64)
        .bind(&payload)
        .bind(&now)
        .bind(&now)
        .fetch_one(&mut *tx)
        .await?;

        tx.commit().await?;
        Ok(bundle)
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
    async fn replace_overwrites_prior_bundle() {
        let db = test_db().await;
        let items = vec![ResourceItem {
            title: "Docs".into(),
            url: "https://example.com".into(),
            kind: "article".into(),
        }];
        let first = ResourceRepository::replace(db.pool(), "r1", "c1", &items).await.unwrap();
        assert_eq!(first.resource_count, 1);

        let second = ResourceRepository::replace(db.pool(), "r1", "c1", &[]).await.unwrap();
        assert_eq!(second.resource_count, 0);
        assert_ne!(first.resource_id, second.resource_id);

        let only = ResourceRepository::get(db.pool(), "r1", "c1").await.unwrap().unwrap();
        assert_eq!(only.resource_id, second.resource_id);
    }
}
