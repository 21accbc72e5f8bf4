//! The Workflow Brain (C5): the shared context every Node Runner executes
//! against, plus the save helpers that translate a node's `StateDelta` into
//! durable rows in `roadmap-db`.
//!
//! This generalizes the teacher's `workflow::executor` module, which wraps
//! every LLM call with a start/finish log pair and a duration measurement;
//! here that wrapping is lifted out into [`NodeExecutionGuard`] so every
//! runner gets it for free instead of reimplementing it per node.

use std::sync::Arc;
use std::time::Instant;

use chrono::Duration as ChronoDuration;
use roadmap_checkpoint::{
    Checkpoint, CheckpointConfig, CheckpointMetadata, CheckpointSaver, CheckpointSource,
};
use roadmap_db::connection::DbPool;
use roadmap_db::models::{
    truncate_error_message, DimensionScore, EditIntent, EditPlan, Framework, LogCategory,
    QuizQuestion, ResourceItem, ValidationIssue,
};
use roadmap_db::repositories::{
    ensure_unique_roadmap_id, EditPlanRepository, EditRepository, QuizRepository,
    ResourceRepository, ReviewFeedbackRepository, RoadmapRepository, TaskRepository,
    TutorialRepository, ValidationRepository,
};
use roadmap_events::{Event, EventBus};
use roadmap_logger::{ExecutionLogger, LogFields};
use serde_json::Value;

use crate::config::WorkflowConfig;
use crate::error::{EngineError, Result};
use crate::live_step::LiveStepCache;
use crate::state::RoadmapState;

/// Everything a [`crate::runners::NodeRunner`] needs besides the state it
/// was handed: storage, the event bus, the durable logger, and config.
pub struct WorkflowBrain {
    pool: DbPool,
    checkpoints: Arc<dyn CheckpointSaver>,
    events: Arc<EventBus>,
    logger: Arc<ExecutionLogger>,
    live_step: LiveStepCache,
    config: WorkflowConfig,
}

impl WorkflowBrain {
    pub fn new(
        pool: DbPool,
        checkpoints: Arc<dyn CheckpointSaver>,
        events: Arc<EventBus>,
        logger: Arc<ExecutionLogger>,
        config: WorkflowConfig,
    ) -> Self {
        Self {
            pool,
            checkpoints,
            events,
            logger,
            live_step: LiveStepCache::new(),
            config,
        }
    }

    pub fn pool(&self) -> &DbPool {
        &self.pool
    }

    pub fn events(&self) -> &EventBus {
        &self.events
    }

    pub fn logger(&self) -> &ExecutionLogger {
        &self.logger
    }

    /// Clones the logger handle for use in a detached `tokio::spawn` task
    /// (cover-image generation) that must outlive this call's borrow.
    pub fn logger_arc(&self) -> Arc<ExecutionLogger> {
        self.logger.clone()
    }

    pub fn live_step(&self) -> &LiveStepCache {
        &self.live_step
    }

    pub fn config(&self) -> &WorkflowConfig {
        &self.config
    }

    /// Opens a node's execution span (spec §4.5's entry contract): records
    /// the step in the live cache, flips `Task.status` to `processing` with
    /// `current_step = node_name`, publishes an entry-time
    /// `Event::Progress`, and logs a "start" entry — then returns a guard
    /// the caller must explicitly resolve with [`NodeExecutionGuard::complete`],
    /// [`NodeExecutionGuard::fail`] or [`NodeExecutionGuard::suspend`].
    ///
    /// `skip_before` should be `true` when this call re-enters a node that
    /// already ran its entry effects before suspending for human review —
    /// otherwise the resumed pass would flip status back to `processing`
    /// and re-log a start entry for work that already started.
    pub async fn begin_node(
        &self,
        node_name: &str,
        task_id: &str,
        state: &RoadmapState,
        skip_before: bool,
    ) -> Result<NodeExecutionGuard<'_>> {
        self.live_step.set(task_id, node_name);
        let context = NodeContext {
            node_name: node_name.to_string(),
            task_id: task_id.to_string(),
            roadmap_id: crate::state::get_str(state, "roadmap_id").map(str::to_string),
            start_time: Instant::now(),
            state_snapshot: state.clone(),
        };

        if !skip_before {
            TaskRepository::update_status_and_step(&self.pool, task_id, "processing", node_name).await?;
            self.events.publish(Event::Progress {
                task_id: task_id.to_string(),
                status: "processing".to_string(),
                current_step: node_name.to_string(),
            });
            self.logger
                .log(
                    task_id,
                    roadmap_db::models::LogLevel::Info,
                    LogCategory::Workflow,
                    format!("node {node_name} started"),
                    LogFields {
                        step: Some(node_name.to_string()),
                        roadmap_id: context.roadmap_id.clone(),
                        ..Default::default()
                    },
                )
                .await;
        }

        Ok(NodeExecutionGuard { brain: self, context, finished: false })
    }

    /// Persists a `Loop`-sourced checkpoint of the full state after a node
    /// completes (spec §4.1 "Checkpoint after every node"). `step` is the
    /// 0-based position of this node in `execution_history`.
    pub async fn checkpoint(&self, task_id: &str, state: &RoadmapState, step: i32) -> Result<()> {
        let channel_values: std::collections::HashMap<String, Value> = state
            .as_object()
            .ok_or_else(|| EngineError::State("state is not a JSON object".into()))?
            .iter()
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect();

        let checkpoint = Checkpoint::new(
            uuid::Uuid::new_v4().to_string(),
            channel_values,
            Default::default(),
            Default::default(),
        );
        let metadata = CheckpointMetadata::new()
            .with_source(CheckpointSource::Loop)
            .with_step(step);
        let config = CheckpointConfig::new().with_thread_id(task_id.to_string());

        self.checkpoints
            .put(&config, checkpoint, metadata, Default::default())
            .await?;
        Ok(())
    }

    /// Loads the latest checkpointed state for a task, used by the
    /// Recovery Manager (C9) and by resume-after-human-review.
    pub async fn load_latest_state(&self, task_id: &str) -> Result<Option<RoadmapState>> {
        let config = CheckpointConfig::new().with_thread_id(task_id.to_string());
        let tuple = self.checkpoints.get_tuple(&config).await?;
        Ok(tuple.map(|t| Value::Object(t.checkpoint.channel_values.into_iter().collect())))
    }

    // -- save helpers --------------------------------------------------
    //
    // Each mirrors one persistence step named in spec.md §4.6's per-node
    // contracts. Runners call these rather than touching repositories
    // directly so the audit-log / event-publish side effects stay uniform.

    pub async fn ensure_unique_roadmap_id(&self, candidate: &str) -> Result<String> {
        Ok(ensure_unique_roadmap_id(&self.pool, candidate).await?)
    }

    pub async fn save_intent_analysis(
        &self,
        task_id: &str,
        roadmap_id: &str,
        analysis: &Value,
    ) -> Result<()> {
        TaskRepository::set_roadmap_id(&self.pool, task_id, roadmap_id).await?;
        self.logger
            .log(
                task_id,
                roadmap_db::models::LogLevel::Info,
                LogCategory::Agent,
                "intent analysis complete",
                LogFields {
                    step: Some("intent_analysis".into()),
                    roadmap_id: Some(roadmap_id.to_string()),
                    details: Some(analysis.clone()),
                    ..Default::default()
                },
            )
            .await;
        Ok(())
    }

    /// Creates or updates the `roadmaps` row. If `roadmap_id` from state
    /// disagrees with the framework the curriculum agent returned, the
    /// framework's `roadmap_id` field is overwritten and a warning is
    /// logged rather than treated as a hard error (spec §4.6 "Curriculum
    /// Design").
    pub async fn save_roadmap_framework(
        &self,
        task_id: &str,
        user_id: &str,
        title: &str,
        roadmap_id: &str,
        framework: &Framework,
    ) -> Result<Framework> {
        let mut framework = framework.clone();
        if framework.roadmap_id != roadmap_id {
            self.logger
                .warning(
                    task_id,
                    LogCategory::Agent,
                    format!(
                        "curriculum agent returned framework.roadmap_id={} but task roadmap_id={}; overwriting",
                        framework.roadmap_id, roadmap_id
                    ),
                )
                .await;
            framework.roadmap_id = roadmap_id.to_string();
        }

        let framework_json = serde_json::to_string(&framework)?;
        if RoadmapRepository::get(&self.pool, roadmap_id).await?.is_some() {
            RoadmapRepository::save_framework(
                &self.pool,
                roadmap_id,
                &framework_json,
                framework.total_stages() as i64,
                framework.total_modules() as i64,
                framework.total_concepts() as i64,
            )
            .await?;
        } else {
            RoadmapRepository::create(
                &self.pool,
                roadmap_id,
                task_id,
                user_id,
                title,
                &framework_json,
                framework.total_stages() as i64,
                framework.total_modules() as i64,
                framework.total_concepts() as i64,
            )
            .await?;
        }
        Ok(framework)
    }

    pub async fn save_validation_result(
        &self,
        task_id: &str,
        roadmap_id: &str,
        is_valid: bool,
        overall_score: f64,
        dimension_scores: &[DimensionScore],
        issues: &[ValidationIssue],
        improvement_suggestions: &[String],
        summary: Option<&str>,
    ) -> Result<i64> {
        let record = ValidationRepository::create(
            &self.pool,
            task_id,
            roadmap_id,
            is_valid,
            overall_score,
            dimension_scores,
            issues,
            improvement_suggestions,
            summary,
        )
        .await?;
        Ok(record.validation_round)
    }

    pub async fn save_edit_plan(
        &self,
        task_id: &str,
        roadmap_id: &str,
        edit_source: &str,
        feedback_summary: Option<&str>,
        scope_analysis: Option<&str>,
        preservation_requirements: &[String],
        intents: &[EditIntent],
        needs_clarification: bool,
    ) -> Result<EditPlan> {
        let record = EditPlanRepository::create(
            &self.pool,
            task_id,
            roadmap_id,
            edit_source,
            feedback_summary,
            scope_analysis,
            preservation_requirements,
            intents,
            needs_clarification,
        )
        .await?;
        Ok(EditPlan {
            feedback_summary: record.feedback_summary.clone().unwrap_or_default(),
            scope_analysis: record.scope_analysis.clone().unwrap_or_default(),
            preservation_requirements: preservation_requirements.to_vec(),
            intents: intents.to_vec(),
            needs_clarification,
        })
    }

    pub async fn save_edit_result(
        &self,
        task_id: &str,
        roadmap_id: &str,
        origin: &Framework,
        modified: &Framework,
        summary: Option<&str>,
    ) -> Result<Vec<String>> {
        let changed = roadmap_db::models::edit::diff_changed_concepts(origin, modified);
        let origin_json = serde_json::to_string(origin)?;
        let modified_json = serde_json::to_string(modified)?;
        EditRepository::create(
            &self.pool,
            task_id,
            roadmap_id,
            &origin_json,
            &modified_json,
            &changed,
            summary,
        )
        .await?;

        RoadmapRepository::save_framework(
            &self.pool,
            roadmap_id,
            &modified_json,
            modified.total_stages() as i64,
            modified.total_modules() as i64,
            modified.total_concepts() as i64,
        )
        .await?;

        Ok(changed)
    }

    pub async fn save_tutorial(
        &self,
        roadmap_id: &str,
        concept_id: &str,
        title: &str,
        summary: Option<&str>,
        body: &str,
        estimated_minutes: Option<i64>,
    ) -> Result<String> {
        let tutorial = TutorialRepository::insert_new_version(
            &self.pool,
            roadmap_id,
            concept_id,
            title,
            summary,
            body,
            estimated_minutes,
        )
        .await?;
        Ok(tutorial.tutorial_id)
    }

    pub async fn save_resources(
        &self,
        roadmap_id: &str,
        concept_id: &str,
        items: &[ResourceItem],
    ) -> Result<(String, u32)> {
        let bundle = ResourceRepository::replace(&self.pool, roadmap_id, concept_id, items).await?;
        Ok((bundle.resource_id, bundle.resource_count as u32))
    }

    pub async fn save_quiz(
        &self,
        roadmap_id: &str,
        concept_id: &str,
        questions: &[QuizQuestion],
    ) -> Result<(String, u32)> {
        let quiz = QuizRepository::replace(&self.pool, roadmap_id, concept_id, questions).await?;
        Ok((quiz.quiz_id, quiz.question_count as u32))
    }

    pub async fn save_framework_snapshot(&self, roadmap_id: &str, framework: &Framework) -> Result<()> {
        let framework_json = serde_json::to_string(framework)?;
        RoadmapRepository::save_framework(
            &self.pool,
            roadmap_id,
            &framework_json,
            framework.total_stages() as i64,
            framework.total_modules() as i64,
            framework.total_concepts() as i64,
        )
        .await?;
        Ok(())
    }

    pub async fn update_task_to_pending_review(
        &self,
        task_id: &str,
        roadmap_id: &str,
        title: &str,
        framework: &Framework,
    ) -> Result<()> {
        TaskRepository::update_status_and_step(
            &self.pool,
            task_id,
            "human_review_pending",
            "human_review",
        )
        .await?;
        self.events.publish(Event::HumanReviewRequired {
            task_id: task_id.to_string(),
            roadmap_title: title.to_string(),
            stage_count: framework.total_stages() as i64,
            concept_count: framework.total_concepts() as i64,
        });
        Ok(())
    }

    pub async fn record_review_feedback(
        &self,
        task_id: &str,
        roadmap_id: &str,
        approved: bool,
        feedback: Option<&str>,
        framework: &Framework,
    ) -> Result<String> {
        let snapshot = serde_json::to_string(framework)?;
        let record =
            ReviewFeedbackRepository::create(&self.pool, task_id, roadmap_id, approved, feedback, &snapshot)
                .await?;
        Ok(record.id)
    }

    /// Flips a freshly created task from `pending` to `processing` before
    /// the first node runs (spec §4.5's entry contract, applied once per
    /// task rather than per node — see DESIGN.md).
    pub async fn start_task(&self, task_id: &str) -> Result<()> {
        TaskRepository::update_status_and_step(&self.pool, task_id, "processing", "intent_analysis").await?;
        Ok(())
    }

    pub async fn update_task_after_review(&self, task_id: &str, step: &str) -> Result<()> {
        TaskRepository::update_status_and_step(&self.pool, task_id, "processing", step).await?;
        Ok(())
    }

    pub async fn mark_task_failed(&self, task_id: &str, reason: &str) -> Result<()> {
        let reason = truncate_error_message(reason);
        TaskRepository::mark_failed(&self.pool, task_id, &reason).await?;
        self.events.publish(Event::Failed {
            task_id: task_id.to_string(),
            reason,
        });
        self.logger.flush().await.map_err(roadmap_db::DbError::from)?;
        Ok(())
    }

    pub async fn mark_task_terminal(
        &self,
        task_id: &str,
        status: &str,
        summary: &roadmap_db::models::ExecutionSummary,
    ) -> Result<()> {
        let summary_json = serde_json::to_string(summary)?;
        TaskRepository::mark_terminal(&self.pool, task_id, status, Some(&summary_json)).await?;
        self.events.publish(Event::Completed { task_id: task_id.to_string() });
        self.live_step.clear(task_id);
        self.logger.flush().await.map_err(roadmap_db::DbError::from)?;
        Ok(())
    }

    /// Retry window used by the Recovery Manager (C9): tasks stuck
    /// `processing` and younger than this are resumed; older ones are
    /// presumed abandoned and marked failed instead (spec §4.11).
    pub fn recovery_window() -> ChronoDuration {
        ChronoDuration::hours(24)
    }
}

/// Everything known about a node's execution, mirroring the teacher's
/// `NodeContext` dataclass: which node, for which task/roadmap, when it
/// started, and the state it saw on entry.
#[derive(Debug, Clone)]
pub struct NodeContext {
    pub node_name: String,
    pub task_id: String,
    pub roadmap_id: Option<String>,
    pub start_time: Instant,
    pub state_snapshot: Value,
}

/// RAII-flavored span over one node's execution. The caller must call
/// exactly one of `complete`/`fail`/`suspend`; dropping without doing so
/// logs a warning (but cannot itself write to the durable log, since Drop
/// is synchronous).
pub struct NodeExecutionGuard<'a> {
    brain: &'a WorkflowBrain,
    context: NodeContext,
    finished: bool,
}

impl<'a> NodeExecutionGuard<'a> {
    pub fn context(&self) -> &NodeContext {
        &self.context
    }

    fn duration_ms(&self) -> u64 {
        self.context.start_time.elapsed().as_millis() as u64
    }

    pub async fn complete(mut self, delta: &Value) -> Result<()> {
        self.finished = true;
        let duration_ms = self.duration_ms();
        self.brain
            .logger
            .log(
                &self.context.task_id,
                roadmap_db::models::LogLevel::Info,
                LogCategory::Workflow,
                format!("node {} completed", self.context.node_name),
                LogFields {
                    step: Some(self.context.node_name.clone()),
                    roadmap_id: self.context.roadmap_id.clone(),
                    duration_ms: Some(duration_ms),
                    details: Some(delta.clone()),
                    ..Default::default()
                },
            )
            .await;
        self.brain.events.publish(Event::Progress {
            task_id: self.context.task_id.clone(),
            status: "completed".to_string(),
            current_step: self.context.node_name.clone(),
        });
        Ok(())
    }

    pub async fn fail(mut self, error: &EngineError) -> Result<()> {
        self.finished = true;
        let duration_ms = self.duration_ms();
        let message = truncate_error_message(&error.to_string());
        self.brain
            .logger
            .log(
                &self.context.task_id,
                roadmap_db::models::LogLevel::Error,
                LogCategory::Workflow,
                format!("node {} failed: {}", self.context.node_name, message),
                LogFields {
                    step: Some(self.context.node_name.clone()),
                    roadmap_id: self.context.roadmap_id.clone(),
                    duration_ms: Some(duration_ms),
                    details: Some(serde_json::json!({ "exception_type": error.error_type() })),
                    ..Default::default()
                },
            )
            .await;
        Ok(())
    }

    pub async fn suspend(mut self) -> Result<()> {
        self.finished = true;
        let duration_ms = self.duration_ms();
        self.brain
            .logger
            .log(
                &self.context.task_id,
                roadmap_db::models::LogLevel::Info,
                LogCategory::Workflow,
                format!("node {} suspended for human review", self.context.node_name),
                LogFields {
                    step: Some(self.context.node_name.clone()),
                    roadmap_id: self.context.roadmap_id.clone(),
                    duration_ms: Some(duration_ms),
                    ..Default::default()
                },
            )
            .await;
        Ok(())
    }
}

impl<'a> Drop for NodeExecutionGuard<'a> {
    fn drop(&mut self) {
        if !self.finished {
            tracing::warn!(
                task_id = %self.context.task_id,
                node = %self.context.node_name,
                "node execution guard dropped without explicit completion",
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures::StreamExt;
    use roadmap_checkpoint::InMemoryCheckpointSaver;
    use roadmap_db::connection::MetadataDatabase;
    use roadmap_db::repositories::TaskRepository as TaskRepo;
    use serde_json::json;

    async fn test_brain() -> (MetadataDatabase, WorkflowBrain) {
        let db = MetadataDatabase::connect("sqlite::memory:").await.unwrap();
        db.run_migrations().await.unwrap();
        let checkpoints = Arc::new(InMemoryCheckpointSaver::new());
        let events = Arc::new(EventBus::new());
        let logger = Arc::new(ExecutionLogger::new(db.pool().clone()));
        let brain = WorkflowBrain::new(db.pool().clone(), checkpoints, events, logger, WorkflowConfig::default());
        (db, brain)
    }

    #[tokio::test]
    async fn begin_node_publishes_entry_progress_and_flips_status() {
        let (db, brain) = test_brain().await;
        let task_id = "t1";
        TaskRepo::create(db.pool(), task_id, "u1", "creation", "{}").await.unwrap();

        let mut events = brain.events().subscribe(task_id);
        let state = json!({"task_id": task_id});
        let guard = brain.begin_node("intent_analysis", task_id, &state, false).await.unwrap();

        let task = TaskRepo::get_by_id(db.pool(), task_id).await.unwrap().unwrap();
        assert_eq!(task.status, "processing");
        assert_eq!(task.current_step.as_deref(), Some("intent_analysis"));

        match events.next().await.unwrap() {
            Event::Progress { status, current_step, .. } => {
                assert_eq!(status, "processing");
                assert_eq!(current_step, "intent_analysis");
            }
            other => panic!("expected entry Progress event, got {other:?}"),
        }

        guard.complete(&json!({})).await.unwrap();
        match events.next().await.unwrap() {
            Event::Progress { status, .. } => assert_eq!(status, "completed"),
            other => panic!("expected exit Progress event, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn begin_node_with_skip_before_does_not_touch_status_or_events() {
        let (db, brain) = test_brain().await;
        let task_id = "t2";
        TaskRepo::create(db.pool(), task_id, "u1", "creation", "{}").await.unwrap();
        TaskRepo::update_status_and_step(db.pool(), task_id, "human_review_pending", "human_review")
            .await
            .unwrap();

        let mut events = brain.events().subscribe(task_id);
        let state = json!({"task_id": task_id, "roadmap_id": "r1"});
        let guard = brain.begin_node("human_review", task_id, &state, true).await.unwrap();

        let task = TaskRepo::get_by_id(db.pool(), task_id).await.unwrap().unwrap();
        assert_eq!(task.status, "human_review_pending");
        assert_eq!(guard.context().roadmap_id.as_deref(), Some("r1"));

        guard.complete(&json!({})).await.unwrap();
        match events.next().await.unwrap() {
            Event::Progress { status, .. } => assert_eq!(status, "completed"),
            other => panic!("expected exit Progress event, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn fail_truncates_long_error_messages_and_records_exception_type() {
        let (db, brain) = test_brain().await;
        let task_id = "t3";
        TaskRepo::create(db.pool(), task_id, "u1", "creation", "{}").await.unwrap();
        let state = json!({"task_id": task_id});
        let guard = brain.begin_node("intent_analysis", task_id, &state, false).await.unwrap();

        let err = EngineError::Validator("x".repeat(500));
        guard.fail(&err).await.unwrap();
        // fail() does not itself flip Task.status -- that is mark_task_failed's job.
        let task = TaskRepo::get_by_id(db.pool(), task_id).await.unwrap().unwrap();
        assert_eq!(task.status, "processing");

        brain.mark_task_failed(task_id, &err.to_string()).await.unwrap();
        let task = TaskRepo::get_by_id(db.pool(), task_id).await.unwrap().unwrap();
        assert_eq!(task.status, "failed");
        assert_eq!(task.error_message.as_deref().unwrap().chars().count(), 200);
    }

    #[test]
    fn truncate_error_message_is_char_boundary_safe() {
        let message: String = std::iter::repeat('字').take(500).collect();
        let truncated = truncate_error_message(&message);
        assert_eq!(truncated.chars().count(), 200);
    }
}
