//! Roadmap metadata repository.

use crate::connection::DbPool;
use crate::models::RoadmapMetadata;
use chrono::Utc;
use rand::Rng;

pub struct RoadmapRepository;

impl RoadmapRepository {
    pub async fn exists(pool: &DbPool, roadmap_id: &str) -> Result<bool, sqlx::Error> {
        let row: Option<(i64,)> = sqlx::query_as("SELECT 1 FROM roadmaps WHERE roadmap_id = ?")
            .bind(roadmap_id)
            .fetch_optional(pool)
            .await?;
        Ok(row.is_some())
    }

    pub async fn create(
        pool: &DbPool,
        roadmap_id: &str,
        task_id: &str,
        user_id: &str,
        title: &str,
        framework_json: &str,
        total_stages: i64,
        total_modules: i64,
        total_concepts: i64,
    ) -> Result<RoadmapMetadata, sqlx::Error> {
        let now = Utc::now().to_rfc3339();
        sqlx::query_as::<_, RoadmapMetadata>(
            "INSERT INTO roadmaps (roadmap_id, task_id, user_id, title, total_stages, total_modules, total_concepts, framework, created_at, updated_at)
             VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
             RETURNING *",
        )
        .bind(roadmap_id)
        .bind(task_id)
        .bind(user_id)
        .bind(title)
        .bind(total_stages)
        .bind(total_modules)
        .bind(total_concepts)
        .bind(framework_json)
        .bind(&now)
        .bind(&now)
        .fetch_one(pool)
        .await
    }

    pub async fn get(pool: &DbPool, roadmap_id: &str) -> Result<Option<RoadmapMetadata>, sqlx::Error> {
        sqlx::query_as::<_, RoadmapMetadata>(
            "SELECT * FROM roadmaps WHERE roadmap_id = ? AND deleted_at IS NULL",
        )
        .bind(roadmap_id)
        .fetch_optional(pool)
        .await
    }

    /// Framework tree updates must explicitly replace the whole JSON column
    /// (spec §4.2 "JSON change tracking") rather than mutating in place.
    pub async fn save_framework(
        pool: &DbPool,
        roadmap_id: &str,
        framework_json: &str,
        total_stages: i64,
        total_modules: i64,
        total_concepts: i64,
    ) -> Result<(), sqlx::Error> {
        let now = Utc::now().to_rfc3339();
        sqlx::query(
            "UPDATE roadmaps SET framework = ?, total_stages = ?, total_modules = ?, total_concepts = ?, updated_at = ? WHERE roadmap_id = ?",
        )
        .bind(framework_json)
        .bind(total_stages)
        .bind(total_modules)
        .bind(total_concepts)
        .bind(&now)
        .bind(roadmap_id)
        .execute(pool)
        .await?;
        Ok(())
    }

    pub async fn list_for_user(pool: &DbPool, user_id: &str) -> Result<Vec<RoadmapMetadata>, sqlx::Error> {
        sqlx::query_as::<_, RoadmapMetadata>(
            "SELECT * FROM roadmaps WHERE user_id = ? AND deleted_at IS NULL ORDER BY created_at DESC",
        )
        .bind(user_id)
        .fetch_all(pool)
        .await
    }

    pub async fn soft_delete(pool: &DbPool, roadmap_id: &str, deleted_by: &str) -> Result<(), sqlx::Error> {
        let now = Utc::now().to_rfc3339();
        sqlx::query("UPDATE roadmaps SET deleted_at = ?, deleted_by = ? WHERE roadmap_id = ?")
            .bind(&now)
            .bind(deleted_by)
            .bind(roadmap_id)
            .execute(pool)
            .await?;
        Ok(())
    }
}

const MAX_SUFFIX_ATTEMPTS: u32 = 10;

fn random_hex(len: usize) -> String {
    const HEX_CHARS: &[u8] = b"0123456789abcdef";
    let mut rng = rand::thread_rng();
    (0..len)
        .map(|_| HEX_CHARS[rng.gen_range(0..HEX_CHARS.len())] as char)
        .collect()
}

/// `base-XXXXXXXX` pattern: a base part followed by a dash and an 8-char hex
/// suffix. Used to regenerate just the suffix on collision.
fn split_base_and_suffix(candidate: &str) -> &str {
    let bytes = candidate.as_bytes();
    if bytes.len() > 9 && bytes[bytes.len() - 9] == b'-' {
        let suffix = &candidate[candidate.len() - 8..];
        if suffix.chars().all(|c| c.is_ascii_hexdigit() || c.is_ascii_lowercase()) {
            return &candidate[..candidate.len() - 9];
        }
    }
    candidate
}

/// Ensures `candidate` is a unique `roadmap_id`, following the exact
/// collision-resolution algorithm from the original implementation: parse
/// `base-XXXXXXXX`, regenerate the 8-char suffix up to 10 times, and on
/// exhaustion fall back to a wide random suffix. Never blocks indefinitely
/// (spec §4.6 "Roadmap-id uniqueness algorithm").
pub async fn ensure_unique_roadmap_id(pool: &DbPool, candidate: &str) -> Result<String, sqlx::Error> {
    if !RoadmapRepository::exists(pool, candidate).await? {
        return Ok(candidate.to_string());
    }

    let base_part = split_base_and_suffix(candidate);

    for _ in 0..MAX_SUFFIX_ATTEMPTS {
        let retry = format!("{}-{}", base_part, random_hex(8));
        if !RoadmapRepository::exists(pool, &retry).await? {
            return Ok(retry);
        }
    }

    Ok(format!("{}-{}", base_part, random_hex(12)))
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
    async fn returns_candidate_when_free() {
        let db = test_db().await;
        let id = ensure_unique_roadmap_id(db.pool(), "learn-git-abc12345").await.unwrap();
        assert_eq!(id, "learn-git-abc12345");
    }

    #[tokio::test]
    async fn regenerates_suffix_on_collision() {
        let db = test_db().await;
        RoadmapRepository::create(db.pool(), "learn-git-abc12345", "t1", "u1", "Learn Git", "{}", 0, 0, 0)
            .await
            .unwrap();

        let id = ensure_unique_roadmap_id(db.pool(), "learn-git-abc12345").await.unwrap();
        assert_ne!(id, "learn-git-abc12345");
        assert!(id.starts_with("learn-git-"));
    }

    #[tokio::test]
    async fn parallel_calls_yield_distinct_ids() {
        let db = test_db().await;
        RoadmapRepository::create(db.pool(), "dup-seed-12345678", "t1", "u1", "Dup", "{}", 0, 0, 0)
            .await
            .unwrap();

        const CONCURRENCY: usize = 1000;
        let mut handles = Vec::new();
        for _ in 0..CONCURRENCY {
            let pool = db.pool().clone();
            handles.push(tokio::spawn(async move {
                ensure_unique_roadmap_id(&pool, "dup-seed-12345678").await.unwrap()
            }));
        }

        let mut ids = std::collections::HashSet::new();
        for h in handles {
            let id = h.await.unwrap();
            assert_ne!(id, "dup-seed-12345678");
            ids.insert(id);
        }
        assert_eq!(ids.len(), CONCURRENCY);
    }
}
