//! Recovery Manager (C9): on worker startup, finds tasks left `processing`
//! by a crashed run and either resumes them from their last checkpoint or,
//! past the recovery window, gives up on them (spec §4.11).
//!
//! Grounded on the same "sweep stuck rows on boot" shape as the teacher's
//! retry/backoff sweep, but driven off `tasks.status` + `created_at`
//! instead of a queue visibility timeout.

use chrono::{DateTime, Utc};
use roadmap_db::models::TaskType;
use roadmap_db::repositories::TaskRepository;
use roadmap_events::Event;

use crate::brain::WorkflowBrain;
use crate::error::Result;
use crate::executor::Executor;

pub struct RecoveryManager<'a> {
    brain: &'a WorkflowBrain,
    executor: &'a Executor,
}

impl<'a> RecoveryManager<'a> {
    pub fn new(brain: &'a WorkflowBrain, executor: &'a Executor) -> Self {
        Self { brain, executor }
    }

    /// Resumes every task stuck `processing` and within the recovery
    /// window; marks the rest `failed` with `no_checkpoint_available` or
    /// `recovery_window_exceeded`. Tasks `human_review_pending` are left
    /// untouched — they wait on a human, not on a crashed worker.
    pub async fn recover_interrupted(&self) -> Result<RecoveryReport> {
        let mut report = RecoveryReport::default();
        let stuck = TaskRepository::list_by_status(self.brain.pool(), "processing").await?;
        let window = WorkflowBrain::recovery_window();
        let now = Utc::now();

        for task in stuck {
            if task.task_type != TaskType::Creation.as_str() {
                continue;
            }
            let created_at: DateTime<Utc> = task.created_at.parse().unwrap_or(now);
            let age = now - created_at;

            if age > window {
                self.brain.mark_task_failed(&task.task_id, "recovery_window_exceeded").await?;
                report.abandoned += 1;
                continue;
            }

            self.brain.events().publish(Event::TaskRecovering { task_id: task.task_id.clone() });

            match self.executor.resume_interrupted(&task.task_id).await {
                Ok(_) => report.resumed += 1,
                Err(crate::error::EngineError::NotFound(_)) => {
                    self.brain.mark_task_failed(&task.task_id, "no_checkpoint_available").await?;
                    report.abandoned += 1;
                }
                Err(crate::error::EngineError::Suspended(_)) => report.resumed += 1,
                Err(err) => {
                    report.resumed += 1;
                    self.brain
                        .logger()
                        .error(
                            &task.task_id,
                            roadmap_db::models::LogCategory::Workflow,
                            format!("recovery run ended in error: {err}"),
                        )
                        .await;
                }
            }
        }

        Ok(report)
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct RecoveryReport {
    pub resumed: usize,
    pub abandoned: usize,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::executor::Agents;
    use crate::state::initial_state;
    use roadmap_agents::dto::{IntentAnalysis, TutorialContent, ValidationOutcome};
    use roadmap_agents::fakes::{
        FakeCoverImageAgent, FakeCurriculumAgent, FakeEditPlanAgent, FakeEditorAgent, FakeIntentAgent,
        FakeQuizAgent, FakeResourceAgent, FakeTutorialAgent, FakeValidatorAgent,
    };
    use roadmap_checkpoint::InMemoryCheckpointSaver;
    use roadmap_db::connection::MetadataDatabase;
    use roadmap_db::models::{EditPlan, Framework};
    use roadmap_events::EventBus;
    use roadmap_logger::ExecutionLogger;
    use serde_json::json;
    use std::sync::Arc;

    async fn test_brain() -> Arc<WorkflowBrain> {
        let db = MetadataDatabase::connect("sqlite::memory:").await.unwrap();
        db.run_migrations().await.unwrap();
        let checkpoints = Arc::new(InMemoryCheckpointSaver::new());
        let events = Arc::new(EventBus::new());
        let logger = Arc::new(ExecutionLogger::new(db.pool().clone()));
        Arc::new(WorkflowBrain::new(db.pool().clone(), checkpoints, events, logger, crate::config::WorkflowConfig::default()))
    }

    fn empty_framework() -> Framework {
        Framework { roadmap_id: String::new(), stages: vec![] }
    }

    fn no_op_agents() -> Agents {
        Agents {
            intent: Arc::new(FakeIntentAgent {
                response: IntentAnalysis {
                    tech_stack: vec![],
                    difficulty_profile: "beginner".into(),
                    time_constraint_summary: String::new(),
                    skill_gaps: vec![],
                    recommendations: vec![],
                    summary: String::new(),
                },
            }),
            curriculum: Arc::new(FakeCurriculumAgent { framework: empty_framework() }),
            validator: Arc::new(FakeValidatorAgent::new(vec![ValidationOutcome {
                is_valid: true,
                dimension_scores: vec![],
                issues: vec![],
                improvement_suggestions: vec![],
                summary: None,
            }])),
            edit_plan: Arc::new(FakeEditPlanAgent {
                plan: EditPlan {
                    feedback_summary: String::new(),
                    scope_analysis: String::new(),
                    preservation_requirements: vec![],
                    intents: vec![],
                    needs_clarification: false,
                },
            }),
            editor: Arc::new(FakeEditorAgent { edited: std::sync::Mutex::new(empty_framework()) }),
            tutorial: Arc::new(FakeTutorialAgent {
                content: TutorialContent { title: String::new(), summary: None, body_markdown: String::new(), estimated_minutes: None },
            }),
            resource: Arc::new(FakeResourceAgent { items: vec![] }),
            quiz: Arc::new(FakeQuizAgent { questions: vec![] }),
            cover_image: Arc::new(FakeCoverImageAgent { url: "https://example.invalid/cover.png".into() }),
        }
    }

    async fn backdate(brain: &WorkflowBrain, task_id: &str, hours_ago: i64) {
        let then = (Utc::now() - chrono::Duration::hours(hours_ago)).to_rfc3339();
        sqlx::query("UPDATE tasks SET created_at = ? WHERE task_id = ?")
            .bind(&then)
            .bind(task_id)
            .execute(brain.pool())
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn resumes_recent_stuck_task_from_its_checkpoint() {
        let brain = test_brain().await;
        let executor = Executor::new(brain.clone(), no_op_agents());

        let task_id = "t-recent";
        TaskRepository::create(brain.pool(), task_id, "u1", TaskType::Creation.as_str(), "{}").await.unwrap();
        brain.start_task(task_id).await.unwrap();
        roadmap_db::repositories::RoadmapRepository::create(
            brain.pool(), "r1", task_id, "u1", "Rust roadmap", "{}", 0, 0, 0,
        )
        .await
        .unwrap();
        let mut state = initial_state(task_id, &json!({"user_id": "u1"}));
        state["human_approved"] = json!(true);
        state["roadmap_id"] = json!("r1");
        state["roadmap_framework"] = serde_json::to_value(empty_framework()).unwrap();
        brain.checkpoint(task_id, &state, 3).await.unwrap();

        let report = RecoveryManager::new(&brain, &executor).recover_interrupted().await.unwrap();
        assert_eq!(report.resumed, 1);
        assert_eq!(report.abandoned, 0);

        let task = TaskRepository::get_by_id(brain.pool(), task_id).await.unwrap().unwrap();
        assert_eq!(task.status, "completed");
    }

    #[tokio::test]
    async fn abandons_stuck_task_with_no_checkpoint() {
        let brain = test_brain().await;
        let executor = Executor::new(brain.clone(), no_op_agents());

        let task_id = "t-no-checkpoint";
        TaskRepository::create(brain.pool(), task_id, "u1", TaskType::Creation.as_str(), "{}").await.unwrap();
        brain.start_task(task_id).await.unwrap();

        let report = RecoveryManager::new(&brain, &executor).recover_interrupted().await.unwrap();
        assert_eq!(report.resumed, 0);
        assert_eq!(report.abandoned, 1);

        let task = TaskRepository::get_by_id(brain.pool(), task_id).await.unwrap().unwrap();
        assert_eq!(task.status, "failed");
        assert_eq!(task.error_message.as_deref(), Some("no_checkpoint_available"));
    }

    #[tokio::test]
    async fn abandons_task_past_the_recovery_window_without_touching_its_checkpoint() {
        let brain = test_brain().await;
        let executor = Executor::new(brain.clone(), no_op_agents());

        let task_id = "t-stale";
        TaskRepository::create(brain.pool(), task_id, "u1", TaskType::Creation.as_str(), "{}").await.unwrap();
        brain.start_task(task_id).await.unwrap();
        backdate(&brain, task_id, 25).await;

        let report = RecoveryManager::new(&brain, &executor).recover_interrupted().await.unwrap();
        assert_eq!(report.resumed, 0);
        assert_eq!(report.abandoned, 1);

        let task = TaskRepository::get_by_id(brain.pool(), task_id).await.unwrap().unwrap();
        assert_eq!(task.status, "failed");
        assert_eq!(task.error_message.as_deref(), Some("recovery_window_exceeded"));
    }

    #[tokio::test]
    async fn ignores_processing_tasks_of_other_task_types() {
        let brain = test_brain().await;
        let executor = Executor::new(brain.clone(), no_op_agents());

        let task_id = "t-edit";
        TaskRepository::create(brain.pool(), task_id, "u1", TaskType::RetryTutorial.as_str(), "{}").await.unwrap();
        brain.start_task(task_id).await.unwrap();

        let report = RecoveryManager::new(&brain, &executor).recover_interrupted().await.unwrap();
        assert_eq!(report.resumed, 0);
        assert_eq!(report.abandoned, 0);

        let task = TaskRepository::get_by_id(brain.pool(), task_id).await.unwrap().unwrap();
        assert_eq!(task.status, "processing");
    }

    #[tokio::test]
    async fn leaves_human_review_pending_tasks_alone() {
        let brain = test_brain().await;
        let executor = Executor::new(brain.clone(), no_op_agents());

        let task_id = "t-review";
        TaskRepository::create(brain.pool(), task_id, "u1", TaskType::Creation.as_str(), "{}").await.unwrap();
        brain.start_task(task_id).await.unwrap();
        TaskRepository::update_status_and_step(brain.pool(), task_id, "human_review_pending", "human_review")
            .await
            .unwrap();

        let report = RecoveryManager::new(&brain, &executor).recover_interrupted().await.unwrap();
        assert_eq!(report.resumed, 0);
        assert_eq!(report.abandoned, 0);
    }
}
