//! SQLite-backed checkpoint storage for durable, cross-restart suspend and
//! resume. Stores each entry as `InMemoryCheckpointSaver` does in memory —
//! one row per `(thread_id, checkpoint_ns, checkpoint_id)` — except the
//! `Checkpoint` and `CheckpointMetadata` bodies are serialized to JSON TEXT
//! instead of living on the heap, so a workflow paused for human review
//! survives a worker process restart.
//!
//! A human-review pause can last days; a long-idle pooled connection would
//! otherwise risk `SQLITE_BUSY` from the next writer, so the pool is opened
//! with the same busy-timeout pragma `roadmap-db` uses for its metadata
//! pool.

use crate::{
    checkpoint::{ChannelVersions, Checkpoint, CheckpointConfig, CheckpointMetadata, CheckpointTuple},
    error::{CheckpointError, Result},
    traits::{CheckpointSaver, CheckpointStream},
};
use async_trait::async_trait;
use futures::stream;
use sqlx::sqlite::{SqlitePool, SqlitePoolOptions};
use sqlx::Row;
use std::collections::HashMap;
use std::time::Duration;

const DEFAULT_CHECKPOINT_NS: &str = "";

/// Checkpoint saver backed by a `sqlx::SqlitePool`.
#[derive(Debug, Clone)]
pub struct SqliteCheckpointSaver {
    pool: SqlitePool,
}

impl SqliteCheckpointSaver {
    /// Opens (or creates) the SQLite database at `database_url` and runs the
    /// embedded migrations.
    pub async fn connect(database_url: &str) -> Result<Self> {
        let pool = SqlitePoolOptions::new()
            .max_connections(5)
            .acquire_timeout(Duration::from_secs(30))
            .connect(database_url)
            .await
            .map_err(|e| CheckpointError::Storage(e.to_string()))?;

        sqlx::query("PRAGMA busy_timeout = 30000")
            .execute(&pool)
            .await
            .map_err(|e| CheckpointError::Storage(e.to_string()))?;

        sqlx::migrate!("./migrations")
            .run(&pool)
            .await
            .map_err(|e| CheckpointError::Storage(e.to_string()))?;

        Ok(Self { pool })
    }

    /// Wraps an already-connected, already-migrated pool. Used by the
    /// worker binary, which owns pool construction so the checkpoint store
    /// and the metadata store can share the same `PRAGMA` and migration
    /// bookkeeping process.
    pub fn from_pool(pool: SqlitePool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    fn ns(config: &CheckpointConfig) -> &str {
        config.checkpoint_ns.as_deref().unwrap_or(DEFAULT_CHECKPOINT_NS)
    }
}

#[async_trait]
impl CheckpointSaver for SqliteCheckpointSaver {
    async fn get_tuple(&self, config: &CheckpointConfig) -> Result<Option<CheckpointTuple>> {
        let thread_id = config
            .thread_id
            .as_ref()
            .ok_or_else(|| CheckpointError::Invalid("thread_id is required".to_string()))?;
        let ns = Self::ns(config);

        let row = if let Some(checkpoint_id) = &config.checkpoint_id {
            sqlx::query(
                "SELECT checkpoint, metadata, checkpoint_id, parent_checkpoint_id, checkpoint_ns \
                 FROM checkpoints WHERE thread_id = ? AND checkpoint_ns = ? AND checkpoint_id = ?",
            )
            .bind(thread_id)
            .bind(ns)
            .bind(checkpoint_id)
            .fetch_optional(&self.pool)
            .await
        } else {
            sqlx::query(
                "SELECT checkpoint, metadata, checkpoint_id, parent_checkpoint_id, checkpoint_ns \
                 FROM checkpoints WHERE thread_id = ? AND checkpoint_ns = ? \
                 ORDER BY created_at DESC LIMIT 1",
            )
            .bind(thread_id)
            .bind(ns)
            .fetch_optional(&self.pool)
            .await
        }
        .map_err(|e| CheckpointError::Storage(e.to_string()))?;

        let Some(row) = row else { return Ok(None) };
        Ok(Some(row_to_tuple(thread_id, &row)?))
    }

    async fn list(
        &self,
        config: Option<&CheckpointConfig>,
        filter: Option<HashMap<String, serde_json::Value>>,
        before: Option<&CheckpointConfig>,
        limit: Option<usize>,
    ) -> Result<CheckpointStream> {
        let thread_id = config.and_then(|c| c.thread_id.clone());
        let ns = config.map(Self::ns).unwrap_or(DEFAULT_CHECKPOINT_NS).to_string();

        let rows = if let Some(thread_id) = &thread_id {
            sqlx::query(
                "SELECT thread_id, checkpoint, metadata, checkpoint_id, parent_checkpoint_id, checkpoint_ns \
                 FROM checkpoints WHERE thread_id = ? AND checkpoint_ns = ? ORDER BY created_at DESC",
            )
            .bind(thread_id)
            .bind(&ns)
            .fetch_all(&self.pool)
            .await
        } else {
            sqlx::query(
                "SELECT thread_id, checkpoint, metadata, checkpoint_id, parent_checkpoint_id, checkpoint_ns \
                 FROM checkpoints ORDER BY created_at DESC",
            )
            .fetch_all(&self.pool)
            .await
        }
        .map_err(|e| CheckpointError::Storage(e.to_string()))?;

        let mut results = Vec::new();
        for row in rows {
            let row_thread_id: String = row.try_get("thread_id").unwrap_or_default();
            let row_checkpoint_id: String = row
                .try_get("checkpoint_id")
                .map_err(|e| CheckpointError::Storage(e.to_string()))?;

            if let Some(before_cfg) = before {
                if let Some(before_id) = &before_cfg.checkpoint_id {
                    if &row_checkpoint_id >= before_id {
                        continue;
                    }
                }
            }

            let tuple = row_to_tuple(&row_thread_id, &row)?;

            if let Some(filter_map) = &filter {
                let matches = filter_map
                    .iter()
                    .all(|(key, value)| tuple.metadata.extra.get(key) == Some(value));
                if !matches {
                    continue;
                }
            }

            results.push(Ok(tuple));
            if let Some(lim) = limit {
                if results.len() >= lim {
                    break;
                }
            }
        }

        Ok(Box::pin(stream::iter(results)))
    }

    async fn put(
        &self,
        config: &CheckpointConfig,
        checkpoint: Checkpoint,
        metadata: CheckpointMetadata,
        _new_versions: ChannelVersions,
    ) -> Result<CheckpointConfig> {
        let thread_id = config
            .thread_id
            .as_ref()
            .ok_or_else(|| CheckpointError::Invalid("thread_id is required".to_string()))?;
        let ns = Self::ns(config);

        let checkpoint_json = serde_json::to_string(&checkpoint)?;
        let metadata_json = serde_json::to_string(&metadata)?;
        let parent_checkpoint_id = config.checkpoint_id.clone();
        let created_at = checkpoint.ts.to_rfc3339();

        sqlx::query(
            "INSERT INTO checkpoints \
             (thread_id, checkpoint_ns, checkpoint_id, parent_checkpoint_id, checkpoint, metadata, created_at) \
             VALUES (?, ?, ?, ?, ?, ?, ?)",
        )
        .bind(thread_id)
        .bind(ns)
        .bind(&checkpoint.id)
        .bind(&parent_checkpoint_id)
        .bind(&checkpoint_json)
        .bind(&metadata_json)
        .bind(&created_at)
        .execute(&self.pool)
        .await
        .map_err(|e| CheckpointError::Storage(e.to_string()))?;

        Ok(CheckpointConfig {
            thread_id: Some(thread_id.clone()),
            checkpoint_id: Some(checkpoint.id),
            checkpoint_ns: config.checkpoint_ns.clone(),
            extra: config.extra.clone(),
        })
    }

    async fn put_writes(
        &self,
        config: &CheckpointConfig,
        writes: Vec<(String, serde_json::Value)>,
        task_id: String,
    ) -> Result<()> {
        let thread_id = config
            .thread_id
            .as_ref()
            .ok_or_else(|| CheckpointError::Invalid("thread_id is required".to_string()))?;
        let checkpoint_id = config
            .checkpoint_id
            .as_ref()
            .ok_or_else(|| CheckpointError::Invalid("checkpoint_id is required".to_string()))?;
        let ns = Self::ns(config);

        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| CheckpointError::Storage(e.to_string()))?;

        for (idx, (channel, value)) in writes.into_iter().enumerate() {
            let value_json = serde_json::to_string(&value)?;
            sqlx::query(
                "INSERT OR REPLACE INTO checkpoint_writes \
                 (thread_id, checkpoint_ns, checkpoint_id, task_id, channel, value, idx) \
                 VALUES (?, ?, ?, ?, ?, ?, ?)",
            )
            .bind(thread_id)
            .bind(ns)
            .bind(checkpoint_id)
            .bind(&task_id)
            .bind(&channel)
            .bind(&value_json)
            .bind(idx as i64)
            .execute(&mut *tx)
            .await
            .map_err(|e| CheckpointError::Storage(e.to_string()))?;
        }

        tx.commit().await.map_err(|e| CheckpointError::Storage(e.to_string()))?;
        Ok(())
    }

    async fn delete_thread(&self, thread_id: &str) -> Result<()> {
        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| CheckpointError::Storage(e.to_string()))?;
        sqlx::query("DELETE FROM checkpoint_writes WHERE thread_id = ?")
            .bind(thread_id)
            .execute(&mut *tx)
            .await
            .map_err(|e| CheckpointError::Storage(e.to_string()))?;
        sqlx::query("DELETE FROM checkpoints WHERE thread_id = ?")
            .bind(thread_id)
            .execute(&mut *tx)
            .await
            .map_err(|e| CheckpointError::Storage(e.to_string()))?;
        tx.commit().await.map_err(|e| CheckpointError::Storage(e.to_string()))?;
        Ok(())
    }
}

fn row_to_tuple(thread_id: &str, row: &sqlx::sqlite::SqliteRow) -> Result<CheckpointTuple> {
    let checkpoint_json: String = row
        .try_get("checkpoint")
        .map_err(|e| CheckpointError::Storage(e.to_string()))?;
    let metadata_json: String = row
        .try_get("metadata")
        .map_err(|e| CheckpointError::Storage(e.to_string()))?;
    let checkpoint_ns: String = row.try_get("checkpoint_ns").unwrap_or_default();
    let parent_checkpoint_id: Option<String> = row.try_get("parent_checkpoint_id").unwrap_or(None);

    let checkpoint: Checkpoint = serde_json::from_str(&checkpoint_json)?;
    let metadata: CheckpointMetadata = serde_json::from_str(&metadata_json)?;

    let config = CheckpointConfig {
        thread_id: Some(thread_id.to_string()),
        checkpoint_id: Some(checkpoint.id.clone()),
        checkpoint_ns: Some(checkpoint_ns.clone()),
        extra: HashMap::new(),
    };

    let parent_config = parent_checkpoint_id.map(|id| CheckpointConfig {
        thread_id: Some(thread_id.to_string()),
        checkpoint_id: Some(id),
        checkpoint_ns: Some(checkpoint_ns),
        extra: HashMap::new(),
    });

    Ok(CheckpointTuple {
        config,
        checkpoint,
        metadata,
        parent_config,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::checkpoint::CheckpointSource;

    async fn test_saver() -> SqliteCheckpointSaver {
        SqliteCheckpointSaver::connect("sqlite::memory:").await.unwrap()
    }

    #[tokio::test]
    async fn save_and_load_round_trips() {
        let saver = test_saver().await;
        let checkpoint = Checkpoint::empty();
        let metadata = CheckpointMetadata::new().with_source(CheckpointSource::Loop).with_step(0);
        let config = CheckpointConfig::new().with_thread_id("thread-1".to_string());

        let saved_config = saver.put(&config, checkpoint.clone(), metadata, HashMap::new()).await.unwrap();
        let loaded = saver.get_tuple(&saved_config).await.unwrap().unwrap();

        assert_eq!(loaded.checkpoint.id, checkpoint.id);
        assert_eq!(loaded.metadata.step, Some(0));
    }

    #[tokio::test]
    async fn get_tuple_returns_latest_without_checkpoint_id() {
        let saver = test_saver().await;
        let config = CheckpointConfig::new().with_thread_id("thread-1".to_string());

        for step in 0..3 {
            let checkpoint = Checkpoint::empty();
            let metadata = CheckpointMetadata::new().with_step(step);
            saver.put(&config, checkpoint, metadata, HashMap::new()).await.unwrap();
        }

        let latest = saver.get_tuple(&config).await.unwrap().unwrap();
        assert_eq!(latest.metadata.step, Some(2));
    }

    #[tokio::test]
    async fn survives_a_fresh_connection_to_the_same_file() {
        let dir = tempfile_dir();
        let url = format!("sqlite://{}/checkpoints.db?mode=rwc", dir);
        let config = CheckpointConfig::new().with_thread_id("thread-1".to_string());

        {
            let saver = SqliteCheckpointSaver::connect(&url).await.unwrap();
            let checkpoint = Checkpoint::empty();
            let metadata = CheckpointMetadata::new()
                .with_step(0)
                .with_extra("interrupt".to_string(), serde_json::json!("human_review"));
            saver.put(&config, checkpoint, metadata, HashMap::new()).await.unwrap();
        }

        let reopened = SqliteCheckpointSaver::connect(&url).await.unwrap();
        let loaded = reopened.get_tuple(&config).await.unwrap().unwrap();
        assert_eq!(loaded.metadata.extra.get("interrupt").unwrap(), "human_review");
    }

    fn tempfile_dir() -> String {
        let dir = std::env::temp_dir().join(format!("roadmap-checkpoint-test-{}", uuid::Uuid::new_v4()));
        std::fs::create_dir_all(&dir).unwrap();
        dir.to_string_lossy().to_string()
    }

    #[tokio::test]
    async fn delete_thread_removes_checkpoints_and_writes() {
        let saver = test_saver().await;
        let config = CheckpointConfig::new().with_thread_id("thread-1".to_string());
        let checkpoint = Checkpoint::empty();
        let metadata = CheckpointMetadata::new();

        let saved_config = saver.put(&config, checkpoint, metadata, HashMap::new()).await.unwrap();
        saver
            .put_writes(&saved_config, vec![("ch".to_string(), serde_json::json!(1))], "task-1".to_string())
            .await
            .unwrap();

        saver.delete_thread("thread-1").await.unwrap();
        assert!(saver.get_tuple(&config).await.unwrap().is_none());
    }
}
