//! Thin CRUD for user profiles, chat turns, and notes. Out of scope for
//! workflow semantics (§1); kept simple since the engine only reads through
//! them incidentally.

use crate::connection::DbPool;
use crate::models::{ChatMessage, Note, UserProfile};
use chrono::Utc;
use uuid::Uuid;

pub struct ProfileRepository;

impl ProfileRepository {
    pub async fn get(pool: &DbPool, user_id: &str) -> Result<Option<UserProfile>, sqlx::Error> {
        sqlx::query_as::<_, UserProfile>("SELECT * FROM user_profiles WHERE user_id = ?")
            .bind(user_id)
            .fetch_optional(pool)
            .await
    }

    pub async fn upsert(
        pool: &DbPool,
        user_id: &str,
        display_name: Option<&str>,
        preferences_json: &str,
    ) -> Result<UserProfile, sqlx::Error> {
        let now = Utc::now().to_rfc3339();
        sqlx::query_as::<_, UserProfile>(
            "INSERT INTO user_profiles (user_id, display_name, preferences, created_at, updated_at)
             VALUES (?, ?, ?, ?, ?)
             ON CONFLICT(user_id) DO UPDATE SET display_name = excluded.display_name, preferences = excluded.preferences, updated_at = excluded.updated_at
             RETURNING *",
        )
        .bind(user_id)
        .bind(display_name)
        .bind(preferences_json)
        .bind(&now)
        .bind(&now)
        .fetch_one(pool)
        .await
    }
}

pub struct ChatRepository;

impl ChatRepository {
    pub async fn append(
        pool: &DbPool,
        task_id: &str,
        role: &str,
        content: &str,
    ) -> Result<ChatMessage, sqlx::Error> {
        let chat_id = Uuid::new_v4().to_string();
        let now = Utc::now().to_rfc3339();
        sqlx::query_as::<_, ChatMessage>(
            "INSERT INTO chats (chat_id, task_id, role, content, created_at)
             VALUES (?, ?, ?, ?, ?)
             RETURNING *",
        )
        .bind(&chat_id)
        .bind(task_id)
        .bind(role)
        .bind(content)
        .bind(&now)
        .fetch_one(pool)
        .await
    }

    pub async fn list_for_task(pool: &DbPool, task_id: &str) -> Result<Vec<ChatMessage>, sqlx::Error> {
        sqlx::query_as::<_, ChatMessage>("SELECT * FROM chats WHERE task_id = ? ORDER BY created_at ASC")
            .bind(task_id)
            .fetch_all(pool)
            .await
    }
}

pub struct NoteRepository;

impl NoteRepository {
    pub async fn create(
        pool: &DbPool,
        roadmap_id: &str,
        concept_id: Option<&str>,
        body: &str,
    ) -> Result<Note, sqlx::Error> {
        let note_id = Uuid::new_v4().to_string();
        let now = Utc::now().to_rfc3339();
        sqlx::query_as::<_, Note>(
            "INSERT INTO notes (note_id, roadmap_id, concept_id, body, created_at, updated_at)
             VALUES (?, ?, ?, ?, ?, ?)
             RETURNING *",
        )
        .bind(&note_id)
        .bind(roadmap_id)
        .bind(concept_id)
        .bind(body)
        .bind(&now)
        .bind(&now)
        .fetch_one(pool)
        .await
    }

    pub async fn list_for_roadmap(pool: &DbPool, roadmap_id: &str) -> Result<Vec<Note>, sqlx::Error> {
        sqlx::query_as::<_, Note>("SELECT * FROM notes WHERE roadmap_id = ? ORDER BY created_at ASC")
            .bind(roadmap_id)
            .fetch_all(pool)
            .await
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
    async fn upsert_profile_updates_in_place() {
        let db = test_db().await;
        ProfileRepository::upsert(db.pool(), "u1", Some("Ada"), "{}").await.unwrap();
        let updated = ProfileRepository::upsert(db.pool(), "u1", Some("Ada L."), "{}").await.unwrap();
        assert_eq!(updated.display_name.as_deref(), Some("Ada L."));

        let fetched = ProfileRepository::get(db.pool(), "u1").await.unwrap().unwrap();
        assert_eq!(fetched.display_name.as_deref(), Some("Ada L."));
    }

    #[tokio::test]
    async fn chat_messages_list_in_order() {
        let db = test_db().await;
        ChatRepository::append(db.pool(), "t1", "user", "hi").await.unwrap();
        ChatRepository::append(db.pool(), "t1", "assistant", "hello").await.unwrap();

        let history = ChatRepository::list_for_task(db.pool(), "t1").await.unwrap();
        assert_eq!(history.len(), 2);
        assert_eq!(history[0].role, "user");
    }
}
