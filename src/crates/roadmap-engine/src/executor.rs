//! Executor (C8): walks the node sequence declared in spec.md §4.7,
//! checkpointing after every node and stopping cleanly on suspension
//! (spec §4.8, §4.9).
//!
//! Grounded conceptually on `langgraph-core::pregel::loop_impl::PregelLoop`
//! (one superstep per node, durable checkpoint before advancing) but
//! implemented as a plain iterative state machine rather than a compiled
//! generic graph — see [`crate::graph`] for why.

use std::sync::Arc;

use roadmap_agents::{
    CoverImageAgent, CurriculumAgent, EditPlanAgent, EditorAgent, IntentAgent, QuizAgent,
    ResourceAgent, TutorialAgent, ValidatorAgent,
};
use roadmap_db::models::TaskType;
use roadmap_db::repositories::TaskRepository;
use serde_json::Value;

use crate::brain::WorkflowBrain;
use crate::error::{EngineError, Result};
use crate::graph::{next_after_validation_stage, route_after_human_review, route_after_validation, RouteTarget};
use crate::runners::{
    ContentFanoutRunner, CurriculumDesignRunner, EditPlanFromFeedbackRunner, HumanReviewRunner,
    IntentAnalysisRunner, NodeRunner, RoadmapEditRunner, StructureValidationRunner,
    ValidationEditPlanRunner,
};
use crate::state::{build_schema, initial_state, RoadmapState};

/// The eight agent implementations a concrete deployment wires in; kept as
/// one bundle so `Executor::new` doesn't take nine positional `Arc`s.
pub struct Agents {
    pub intent: Arc<dyn IntentAgent>,
    pub curriculum: Arc<dyn CurriculumAgent>,
    pub validator: Arc<dyn ValidatorAgent>,
    pub edit_plan: Arc<dyn EditPlanAgent>,
    pub editor: Arc<dyn EditorAgent>,
    pub tutorial: Arc<dyn TutorialAgent>,
    pub resource: Arc<dyn ResourceAgent>,
    pub quiz: Arc<dyn QuizAgent>,
    pub cover_image: Arc<dyn CoverImageAgent>,
}

/// Where [`Executor::drive`]'s loop is about to go next.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Step {
    ValidationGate,
    HumanReview,
    ContentFanout,
    End,
}

pub struct Executor {
    brain: Arc<WorkflowBrain>,
    intent: IntentAnalysisRunner,
    curriculum: CurriculumDesignRunner,
    structure_validation: StructureValidationRunner,
    validation_edit_plan: ValidationEditPlanRunner,
    edit_plan_from_feedback: EditPlanFromFeedbackRunner,
    roadmap_edit: RoadmapEditRunner,
    human_review: HumanReviewRunner,
    content_fanout: ContentFanoutRunner,
}

impl Executor {
    pub fn new(brain: Arc<WorkflowBrain>, agents: Agents) -> Self {
        Self {
            brain,
            intent: IntentAnalysisRunner::new(agents.intent),
            curriculum: CurriculumDesignRunner::new(agents.curriculum),
            structure_validation: StructureValidationRunner::new(agents.validator.clone()),
            validation_edit_plan: ValidationEditPlanRunner::new(agents.edit_plan.clone()),
            edit_plan_from_feedback: EditPlanFromFeedbackRunner::new(agents.edit_plan),
            roadmap_edit: RoadmapEditRunner::new(agents.editor),
            human_review: HumanReviewRunner,
            content_fanout: ContentFanoutRunner::new(
                agents.tutorial,
                agents.resource,
                agents.quiz,
                agents.cover_image,
            ),
        }
    }

    /// Creates the `tasks` row, builds the initial state, and walks the
    /// graph to completion or to the first suspend point (spec §4.8
    /// steps 1-3).
    pub async fn execute(&self, user_request: Value) -> Result<(String, RoadmapState)> {
        let task_id = uuid::Uuid::new_v4().to_string();
        let user_id = user_request
            .get("user_id")
            .and_then(|v| v.as_str())
            .ok_or_else(|| EngineError::State("user_request.user_id missing".into()))?
            .to_string();
        let user_request_json = serde_json::to_string(&user_request)?;

        TaskRepository::create(self.brain.pool(), &task_id, &user_id, TaskType::Creation.as_str(), &user_request_json)
            .await?;
        self.brain.start_task(&task_id).await?;

        let mut state = initial_state(&task_id, &user_request);
        let mut step = 0i32;

        let outcome = self.run_from_start(&mut state, &mut step, &task_id).await;
        self.brain.logger().flush().await?;
        match outcome {
            Ok(()) => Ok((task_id, state)),
            Err(EngineError::Suspended(_)) => Ok((task_id, state)),
            Err(err) => Err(err),
        }
    }

    /// Resumes a suspended task with the human reviewer's decision (spec
    /// §4.8 step 6, §4.9).
    pub async fn resume_after_human_review(
        &self,
        task_id: &str,
        approved: bool,
        feedback: Option<&str>,
    ) -> Result<RoadmapState> {
        let task = TaskRepository::get_by_id(self.brain.pool(), task_id)
            .await?
            .ok_or_else(|| EngineError::NotFound(format!("task {task_id}")))?;
        if task.status != "human_review_pending" {
            return Err(EngineError::NotAwaitingReview { task_id: task_id.to_string(), status: task.status });
        }

        let mut state = self
            .brain
            .load_latest_state(task_id)
            .await?
            .ok_or_else(|| EngineError::NotFound(format!("checkpoint for task {task_id}")))?;
        let schema = build_schema();
        let mut decision = serde_json::Map::new();
        decision.insert("human_approved".to_string(), Value::Bool(approved));
        if let Some(text) = feedback {
            decision.insert("user_feedback".to_string(), Value::String(text.to_string()));
        }
        schema.apply(&mut state, &Value::Object(decision))?;

        let mut step = state
            .get("execution_history")
            .and_then(|v| v.as_array())
            .map(|a| a.len() as i32)
            .unwrap_or(0);

        let outcome = async {
            let next = self.human_review_step(&mut state, &mut step, task_id).await?;
            self.drive(next, &mut state, &mut step, task_id).await
        }
        .await;
        self.brain.logger().flush().await?;
        match outcome {
            Ok(()) => Ok(state),
            Err(EngineError::Suspended(_)) => Ok(state),
            Err(err) => Err(err),
        }
    }

    /// Used by the Recovery Manager (C9) to continue a task whose process
    /// died mid-workflow. Picks the resume point from the checkpointed
    /// state rather than an explicit graph cursor, since this executor has
    /// no persisted "current node" beyond what `RoadmapState` itself
    /// records.
    pub async fn resume_interrupted(&self, task_id: &str) -> Result<RoadmapState> {
        let mut state = self
            .brain
            .load_latest_state(task_id)
            .await?
            .ok_or_else(|| EngineError::NotFound(format!("checkpoint for task {task_id}")))?;
        let mut step = state
            .get("execution_history")
            .and_then(|v| v.as_array())
            .map(|a| a.len() as i32)
            .unwrap_or(0);

        let outcome = async {
            if crate::state::get_bool(&state, "human_approved") == Some(true) {
                self.run_node(&self.content_fanout, &mut state, &mut step, task_id).await?;
                return Ok(());
            }
            if state.get("roadmap_framework").is_some() {
                return self.drive(Step::ValidationGate, &mut state, &mut step, task_id).await;
            }
            self.run_node(&self.curriculum, &mut state, &mut step, task_id).await?;
            self.drive(Step::ValidationGate, &mut state, &mut step, task_id).await
        }
        .await;
        self.brain.logger().flush().await?;
        match outcome {
            Ok(()) => Ok(state),
            Err(EngineError::Suspended(_)) => Ok(state),
            Err(err) => Err(err),
        }
    }

    async fn run_from_start(&self, state: &mut RoadmapState, step: &mut i32, task_id: &str) -> Result<()> {
        self.run_node(&self.intent, state, step, task_id).await?;
        self.run_node(&self.curriculum, state, step, task_id).await?;
        self.drive(Step::ValidationGate, state, step, task_id).await
    }

    /// The validate/edit/human-review/fan-out state machine, entered fresh
    /// from `execute` and re-entered mid-flight from `resume_*` (spec
    /// §4.7's conditional edges).
    async fn drive(&self, mut current: Step, state: &mut RoadmapState, step: &mut i32, task_id: &str) -> Result<()> {
        loop {
            current = match current {
                Step::ValidationGate => {
                    let next = if self.brain.config().skip_validation {
                        next_after_validation_stage(self.brain.config())
                    } else {
                        self.run_validation_loop(state, step, task_id).await?
                    };
                    match next {
                        RouteTarget::HumanReview => Step::HumanReview,
                        RouteTarget::ContentFanout => Step::ContentFanout,
                        RouteTarget::End => Step::End,
                        RouteTarget::EditRoadmap => {
                            unreachable!("run_validation_loop resolves edits internally")
                        }
                    }
                }
                Step::HumanReview => self.human_review_step(state, step, task_id).await?,
                Step::ContentFanout => {
                    self.run_node(&self.content_fanout, state, step, task_id).await?;
                    return Ok(());
                }
                Step::End => {
                    self.finalize_end(task_id).await?;
                    return Ok(());
                }
            };
        }
    }

    /// Runs Structure Validation, looping through the edit cycle while
    /// invalid and retries remain, and returns the first non-edit route.
    async fn run_validation_loop(&self, state: &mut RoadmapState, step: &mut i32, task_id: &str) -> Result<RouteTarget> {
        loop {
            self.run_node(&self.structure_validation, state, step, task_id).await?;
            match route_after_validation(state, self.brain.config()) {
                RouteTarget::EditRoadmap => {
                    self.run_node(&self.validation_edit_plan, state, step, task_id).await?;
                    self.run_node(&self.roadmap_edit, state, step, task_id).await?;
                    continue;
                }
                other => return Ok(other),
            }
        }
    }

    /// Runs Human Review and decides what follows (spec §4.7 "human_review
    /// →"). Shared by the fresh-entry path in [`Self::drive`] and the
    /// explicit resume entry points, since both re-invoke the same node.
    async fn human_review_step(&self, state: &mut RoadmapState, step: &mut i32, task_id: &str) -> Result<Step> {
        self.run_node(&self.human_review, state, step, task_id).await?;
        Ok(match route_after_human_review(state, self.brain.config()) {
            RouteTarget::EditRoadmap => {
                self.run_node(&self.edit_plan_from_feedback, state, step, task_id).await?;
                self.run_node(&self.roadmap_edit, state, step, task_id).await?;
                // human_approved/user_feedback must not survive into the
                // next validation pass: left in place, a re-entry into
                // human_review would read last round's rejection and skip
                // suspending for a fresh decision.
                state["human_approved"] = Value::Null;
                state["user_feedback"] = Value::Null;
                Step::ValidationGate
            }
            RouteTarget::ContentFanout => Step::ContentFanout,
            RouteTarget::End => Step::End,
            RouteTarget::HumanReview => unreachable!("route_after_human_review never loops in place"),
        })
    }

    async fn finalize_end(&self, task_id: &str) -> Result<()> {
        self.brain
            .mark_task_terminal(task_id, "completed", &roadmap_db::models::ExecutionSummary::default())
            .await
    }

    async fn run_node(&self, runner: &dyn NodeRunner, state: &mut RoadmapState, step: &mut i32, task_id: &str) -> Result<()> {
        let schema = build_schema();
        match runner.run(&self.brain, state).await {
            Ok(delta) => {
                schema.apply(state, &delta)?;
                self.brain.checkpoint(task_id, state, *step).await?;
                *step += 1;
                Ok(())
            }
            Err(EngineError::Suspended(payload)) => Err(EngineError::Suspended(payload)),
            Err(EngineError::FanOutAborted(reason)) => Err(EngineError::FanOutAborted(reason)),
            Err(err) => {
                self.brain.mark_task_failed(task_id, &err.to_string()).await?;
                Err(err)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use roadmap_agents::dto::{IntentAnalysis, ValidationOutcome};
    use roadmap_agents::fakes::{
        FakeCoverImageAgent, FakeCurriculumAgent, FakeEditPlanAgent, FakeEditorAgent, FakeIntentAgent,
        FakeQuizAgent, FakeResourceAgent, FakeTutorialAgent, FakeValidatorAgent,
    };
    use crate::config::WorkflowConfig;
    use roadmap_checkpoint::InMemoryCheckpointSaver;
    use roadmap_db::connection::MetadataDatabase;
    use roadmap_db::models::{Concept, ContentStatus, EditPlan, Framework, Module, Stage};
    use roadmap_events::EventBus;
    use roadmap_logger::ExecutionLogger;
    use serde_json::json;

    fn concept(id: &str) -> Concept {
        Concept {
            concept_id: id.to_string(),
            name: id.to_string(),
            description: String::new(),
            estimated_hours: 1.0,
            prerequisites: vec![],
            difficulty: "beginner".into(),
            keywords: vec![],
            content_status: ContentStatus::Pending,
            content_ref: None,
            content_summary: None,
            resources_status: ContentStatus::Pending,
            resources_id: None,
            resources_count: None,
            quiz_status: ContentStatus::Pending,
            quiz_id: None,
            quiz_questions_count: None,
        }
    }

    fn framework() -> Framework {
        Framework {
            roadmap_id: String::new(),
            stages: vec![Stage {
                stage_id: "s1".into(),
                name: "Stage 1".into(),
                description: String::new(),
                modules: vec![Module {
                    module_id: "m1".into(),
                    name: "Module 1".into(),
                    description: String::new(),
                    concepts: vec![concept("c1")],
                }],
            }],
        }
    }

    fn valid_outcome() -> ValidationOutcome {
        ValidationOutcome {
            is_valid: true,
            dimension_scores: vec![],
            issues: vec![],
            improvement_suggestions: vec![],
            summary: None,
        }
    }

    struct Harness {
        brain: Arc<WorkflowBrain>,
        executor: Executor,
    }

    impl Harness {
        async fn new(config: WorkflowConfig) -> Self {
            let db = MetadataDatabase::connect("sqlite::memory:").await.unwrap();
            db.run_migrations().await.unwrap();
            let checkpoints = Arc::new(InMemoryCheckpointSaver::new());
            let events = Arc::new(EventBus::new());
            let logger = Arc::new(ExecutionLogger::new(db.pool().clone()));
            let brain = Arc::new(WorkflowBrain::new(db.pool().clone(), checkpoints, events, logger, config));

            let agents = Agents {
                intent: Arc::new(FakeIntentAgent {
                    response: IntentAnalysis {
                        tech_stack: vec!["rust".into()],
                        difficulty_profile: "beginner".into(),
                        time_constraint_summary: String::new(),
                        skill_gaps: vec![],
                        recommendations: vec![],
                        summary: String::new(),
                    },
                }),
                curriculum: Arc::new(FakeCurriculumAgent { framework: framework() }),
                validator: Arc::new(FakeValidatorAgent::new(vec![valid_outcome()])),
                edit_plan: Arc::new(FakeEditPlanAgent {
                    plan: EditPlan {
                        feedback_summary: String::new(),
                        scope_analysis: String::new(),
                        preservation_requirements: vec![],
                        intents: vec![],
                        needs_clarification: false,
                    },
                }),
                editor: Arc::new(FakeEditorAgent { edited: std::sync::Mutex::new(framework()) }),
                tutorial: Arc::new(FakeTutorialAgent {
                    content: roadmap_agents::dto::TutorialContent {
                        title: "t".into(),
                        summary: None,
                        body_markdown: "body".into(),
                        estimated_minutes: Some(10),
                    },
                }),
                resource: Arc::new(FakeResourceAgent { items: vec![] }),
                quiz: Arc::new(FakeQuizAgent { questions: vec![] }),
                cover_image: Arc::new(FakeCoverImageAgent { url: "https://example.invalid/cover.png".into() }),
            };
            let executor = Executor::new(brain.clone(), agents);
            Self { brain, executor }
        }
    }

    fn request() -> Value {
        json!({
            "user_id": "u1",
            "learning_goal": "Rust",
            "current_level": "beginner",
            "available_hours_per_week": 5.0,
            "motivation": null,
            "career_background": null,
            "content_preference": [],
            "additional_context": null,
        })
    }

    #[tokio::test]
    async fn execute_suspends_at_human_review_by_default() {
        let harness = Harness::new(WorkflowConfig::default()).await;
        let (task_id, state) = harness.executor.execute(request()).await.unwrap();

        let task = TaskRepository::get_by_id(harness.brain.pool(), &task_id).await.unwrap().unwrap();
        assert_eq!(task.status, "human_review_pending");
        assert!(state.get("roadmap_framework").is_some());
        assert!(state.get("human_approved").is_none());
    }

    #[tokio::test]
    async fn execute_runs_straight_through_when_review_and_content_skipped() {
        let mut config = WorkflowConfig::default();
        config.skip_review = true;
        config.skip_content = true;
        let harness = Harness::new(config).await;

        let (task_id, _state) = harness.executor.execute(request()).await.unwrap();
        let task = TaskRepository::get_by_id(harness.brain.pool(), &task_id).await.unwrap().unwrap();
        assert_eq!(task.status, "completed");
    }

    #[tokio::test]
    async fn resume_after_human_review_approved_runs_content_fanout() {
        let harness = Harness::new(WorkflowConfig::default()).await;
        let (task_id, _state) = harness.executor.execute(request()).await.unwrap();

        let state = harness.executor.resume_after_human_review(&task_id, true, None).await.unwrap();
        let task = TaskRepository::get_by_id(harness.brain.pool(), &task_id).await.unwrap().unwrap();
        assert_eq!(task.status, "completed");
        assert!(state.get("tutorial_refs").and_then(|v| v.get("c1")).is_some());
    }

    #[tokio::test]
    async fn resume_after_human_review_rejected_reenters_edit_then_review() {
        let harness = Harness::new(WorkflowConfig::default()).await;
        let (task_id, _state) = harness.executor.execute(request()).await.unwrap();

        let state = harness
            .executor
            .resume_after_human_review(&task_id, false, Some("needs more depth"))
            .await
            .unwrap();
        let task = TaskRepository::get_by_id(harness.brain.pool(), &task_id).await.unwrap().unwrap();
        assert_eq!(task.status, "human_review_pending");
        assert_eq!(state.get("human_approved").and_then(|v| v.as_bool()), None);
    }

    #[tokio::test]
    async fn resume_after_human_review_rejects_task_not_pending() {
        let harness = Harness::new(WorkflowConfig::default()).await;
        let (task_id, _) = harness.executor.execute(request()).await.unwrap();
        harness.executor.resume_after_human_review(&task_id, true, None).await.unwrap();

        let err = harness.executor.resume_after_human_review(&task_id, true, None).await;
        assert!(matches!(err, Err(EngineError::NotAwaitingReview { .. })));
    }

    #[tokio::test]
    async fn resume_interrupted_after_human_review_checkpoint_runs_fanout() {
        let harness = Harness::new(WorkflowConfig::default()).await;
        let (task_id, _state) = harness.executor.execute(request()).await.unwrap();

        let mut state = harness.brain.load_latest_state(&task_id).await.unwrap().unwrap();
        state["human_approved"] = json!(true);
        harness.brain.checkpoint(&task_id, &state, 99).await.unwrap();

        let resumed = harness.executor.resume_interrupted(&task_id).await.unwrap();
        assert!(resumed.get("tutorial_refs").and_then(|v| v.get("c1")).is_some());
    }

    #[tokio::test]
    async fn resume_interrupted_after_intent_analysis_restarts_from_curriculum() {
        let mut config = WorkflowConfig::default();
        config.skip_review = true;
        config.skip_content = true;
        let harness = Harness::new(config).await;

        let request = request();
        let task_id = uuid::Uuid::new_v4().to_string();
        TaskRepository::create(harness.brain.pool(), &task_id, "u1", TaskType::Creation.as_str(), "{}")
            .await
            .unwrap();
        harness.brain.start_task(&task_id).await.unwrap();

        // Simulate a crash right after intent_analysis checkpointed but
        // before curriculum_design ran: roadmap_id and intent_analysis are
        // present, roadmap_framework is not.
        let mut state = initial_state(&task_id, &request);
        state["roadmap_id"] = json!("rust-roadmap");
        state["intent_analysis"] = json!({
            "tech_stack": ["rust"],
            "difficulty_profile": "beginner",
            "time_constraint_summary": "",
            "skill_gaps": [],
            "recommendations": [],
            "summary": "",
        });
        harness.brain.checkpoint(&task_id, &state, 1).await.unwrap();

        let resumed = harness.executor.resume_interrupted(&task_id).await.unwrap();
        assert!(resumed.get("roadmap_framework").is_some());
        let task = TaskRepository::get_by_id(harness.brain.pool(), &task_id).await.unwrap().unwrap();
        assert_eq!(task.status, "completed");
    }
}
