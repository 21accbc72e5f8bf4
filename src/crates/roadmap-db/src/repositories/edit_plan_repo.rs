//! Edit plan repository. Append-only, one row per plan generated either from
//! a failed validation or from human review feedback (`edit_source`).

use crate::connection::DbPool;
use crate::models::{EditIntent, EditPlanRecord};
use chrono::Utc;
use uuid::Uuid;

pub struct EditPlanRepository;

impl EditPlanRepository {
    pub async fn create(
        pool: &DbPool,
        task_id: &str,
        roadmap_id: &str,
        edit_source: &str,
        feedback_summary: Option<&str>,
        scope_analysis: Option<&str>,
        preservation_requirements: &[String],
        intents: &[EditIntent],
        needs_clarification: bool,
    ) -> Result<EditPlanRecord, sqlx::Error> {
        let id = Uuid::new_v4().to_string();
        let now = Utc::now().to_rfc3339();

        sqlx::query_as::<_, EditPlanRecord>(
            "INSERT INTO edit_plan_records
                (id, task_id, roadmap_id, edit_source, feedback_summary, scope_analysis, preservation_requirements, intents, needs_clarification, created_at)
             VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
             RETURNING *",
        )
        .bind(&id)
        .bind(task_id)
        .bind(roadmap_id)
        .bind(edit_source)
        .bind(feedback_summary)
        .bind(scope_analysis)
        .bind(serde_json::to_string(preservation_requirements).unwrap_or_else(|_| "[]".into()))
        .bind(serde_json::to_string(intents).unwrap_or_else(|_| "[]".into()))
        .bind(needs_clarification)
        .bind(&now)
        .fetch_one(pool)
        .await
    }

    pub async fn latest_for_task(
        pool: &DbPool,
        task_id: &str,
    ) -> Result<Option<EditPlanRecord>, sqlx::Error> {
        sqlx::query_as::<_, EditPlanRecord>(
            "SELECT * FROM edit_plan_records WHERE task_id = ? ORDER BY created_at DESC LIMIT 1",
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
    use crate::models::{IntentPriority, IntentType};
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
    async fn stores_and_recovers_intents() {
        let db = test_db().await;
        let intents = vec![EditIntent {
            intent_type: IntentType::Modify,
            target_path: "stage[0].module[1].concept[2]".into(),
            description: "tighten scope".into(),
            priority: IntentPriority::Must,
        }];
        let record = EditPlanRepository::create(
            db.pool(), "t1", "r1", "validation_failed", Some("too broad"), Some("single concept"), &[], &intents, false,
        )
        .await
        .unwrap();

        assert_eq!(record.edit_source, "validation_failed");
        let recovered = record.intents_value();
        assert_eq!(recovered.len(), 1);
        assert_eq!(recovered[0].priority, IntentPriority::Must);

        let latest = EditPlanRepository::latest_for_task(db.pool(), "t1").await.unwrap().unwrap();
        assert_eq!(latest.id, record.id);
    }
}
