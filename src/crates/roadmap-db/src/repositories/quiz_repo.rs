//! Quiz repository. Single-version, same replace pattern as
//! [`super::resource_repo::ResourceRepository`].

use crate::connection::DbPool;
use crate::models::{Quiz, QuizQuestion};
use chrono::Utc;
use uuid::Uuid;

pub struct QuizRepository;

impl QuizRepository {
    pub async fn get(
        pool: &DbPool,
        roadmap_id: &str,
        concept_id: &str,
    ) -> Result<Option<Quiz>, sqlx::Error> {
        sqlx::query_as::<_, Quiz>(
            "SELECT * FROM quizzes WHERE roadmap_id = ? AND concept_id = ?",
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
        questions: &[QuizQuestion],
    ) -> Result<Quiz, sqlx::Error> {
        let payload = serde_json::to_string(questions).unwrap_or_else(|_| "[]".to_string());
        let mut tx = pool.begin().await?;

        sqlx::query("DELETE FROM quizzes WHERE roadmap_id = ? AND concept_id = ?")
            .bind(roadmap_id)
            .bind(concept_id)
            .execute(&mut *tx)
            .await?;

        let quiz_id = Uuid::new_v4().to_string();
        let now = Utc::now().to_rfc3339();

        let quiz = sqlx::query_as::<_, Quiz>(
            "INSERT INTO quizzes (quiz_id, roadmap_id, concept_id, status, question_count, payload, created_at, updated_at)
             VALUES (?, ?, ?, 'ready', ?, ?, ?, ?)
             RETURNING *",
        )
        .bind(&quiz_id)
        .bind(roadmap_id)
        .bind(concept_id)
        .bind(questions.len() as i64)
        .bind(&payload)
        .bind(&now)
        .bind(&now)
        .fetch_one(&mut *tx)
        .await?;

        tx.commit().await?;
        Ok(quiz)
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
    async fn replace_overwrites_prior_quiz() {
        let db = test_db().await;
        let questions = vec![QuizQuestion {
            prompt: "What is ownership?".into(),
            choices: vec!["A".into(), "B".into()],
            correct_index: 0,
        }];
        let first = QuizRepository::replace(db.pool(), "r1", "c1", &questions).await.unwrap();
        assert_eq!(first.question_count, 1);

        let second = QuizRepository::replace(db.pool(), "r1", "c1", &[]).await.unwrap();
        assert_eq!(second.question_count, 0);
        assert_ne!(first.quiz_id, second.quiz_id);
    }
}
