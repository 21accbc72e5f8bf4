use std::sync::Arc;

use async_trait::async_trait;
use futures::future::join_all;
use roadmap_agents::{CoverImageAgent, QuizAgent, ResourceAgent, TutorialAgent};
use roadmap_db::models::{Concept, ContentStatus, ExecutionSummary, Framework, LogCategory};
use roadmap_db::repositories::RoadmapRepository;
use roadmap_events::Event;
use serde_json::{json, Value};
use tokio::sync::Semaphore;

use crate::brain::WorkflowBrain;
use crate::error::{EngineError, Result};
use crate::state::{RoadmapState, StateDelta};

use super::NodeRunner;

/// Per-concept `{tutorial, resource_bundle, quiz}` fan-out under a bounded
/// semaphore (spec §4.10). All three agents for a concept must succeed for
/// it to count; partial persistence failures fail the whole concept rather
/// than leaving it half-saved.
///
/// `Tutorial.body_url` is documented as a pointer into an object store the
/// engine never loads the body through; no such store exists in this
/// crate's dependency stack, so [`WorkflowBrain::save_tutorial`] writes the
/// generated markdown directly into that column. This is a deliberate
/// boundary simplification, not an oversight.
pub struct ContentFanoutRunner {
    tutorial_agent: Arc<dyn TutorialAgent>,
    resource_agent: Arc<dyn ResourceAgent>,
    quiz_agent: Arc<dyn QuizAgent>,
    cover_image_agent: Arc<dyn CoverImageAgent>,
}

impl ContentFanoutRunner {
    pub fn new(
        tutorial_agent: Arc<dyn TutorialAgent>,
        resource_agent: Arc<dyn ResourceAgent>,
        quiz_agent: Arc<dyn QuizAgent>,
        cover_image_agent: Arc<dyn CoverImageAgent>,
    ) -> Self {
        Self {
            tutorial_agent,
            resource_agent,
            quiz_agent,
            cover_image_agent,
        }
    }
}

#[derive(Default)]
struct ConceptOutcome {
    concept_id: String,
    success: bool,
    tutorial_id: Option<String>,
    tutorial_summary: Option<String>,
    resource_id: Option<String>,
    resource_count: Option<u32>,
    quiz_id: Option<String>,
    quiz_question_count: Option<u32>,
    failure_reason: Option<String>,
}

async fn process_concept(
    brain: &WorkflowBrain,
    task_id: &str,
    roadmap_id: &str,
    concept: &Concept,
    tutorial_agent: &dyn TutorialAgent,
    resource_agent: &dyn ResourceAgent,
    quiz_agent: &dyn QuizAgent,
) -> ConceptOutcome {
    for content_type in ["tutorial", "resources", "quiz"] {
        brain.events().publish(Event::ConceptStart {
            task_id: task_id.to_string(),
            concept_id: concept.concept_id.clone(),
            content_type: content_type.to_string(),
        });
    }

    let (tutorial_res, resource_res, quiz_res) = futures::join!(
        tutorial_agent.generate(concept),
        resource_agent.recommend(concept),
        quiz_agent.generate(concept),
    );

    let (content, resources, quiz) = match (tutorial_res, resource_res, quiz_res) {
        (Ok(content), Ok(resources), Ok(quiz)) => {
            for content_type in ["tutorial", "resources", "quiz"] {
                brain.events().publish(Event::ConceptComplete {
                    task_id: task_id.to_string(),
                    concept_id: concept.concept_id.clone(),
                    content_type: content_type.to_string(),
                });
            }
            (content, resources, quiz)
        }
        (tutorial_res, resource_res, quiz_res) => {
            let mut reasons = Vec::new();
            for (content_type, res) in [
                ("tutorial", tutorial_res.as_ref().err().map(ToString::to_string)),
                ("resources", resource_res.as_ref().err().map(ToString::to_string)),
                ("quiz", quiz_res.as_ref().err().map(ToString::to_string)),
            ] {
                if let Some(reason) = res {
                    brain.events().publish(Event::ConceptFailed {
                        task_id: task_id.to_string(),
                        concept_id: concept.concept_id.clone(),
                        content_type: content_type.to_string(),
                        reason: reason.clone(),
                    });
                    reasons.push(format!("{content_type}: {reason}"));
                }
            }
            return ConceptOutcome {
                concept_id: concept.concept_id.clone(),
                failure_reason: Some(reasons.join("; ")),
                ..Default::default()
            };
        }
    };

    let tutorial_saved = brain
        .save_tutorial(
            roadmap_id,
            &concept.concept_id,
            &content.title,
            content.summary.as_deref(),
            &content.body_markdown,
            content.estimated_minutes,
        )
        .await;
    let resources_saved = brain.save_resources(roadmap_id, &concept.concept_id, &resources).await;
    let quiz_saved = brain.save_quiz(roadmap_id, &concept.concept_id, &quiz).await;

    match (tutorial_saved, resources_saved, quiz_saved) {
        (Ok(tutorial_id), Ok((resource_id, resource_count)), Ok((quiz_id, quiz_question_count))) => {
            brain.events().publish(Event::ConceptAllContentComplete {
                task_id: task_id.to_string(),
                concept_id: concept.concept_id.clone(),
            });
            ConceptOutcome {
                concept_id: concept.concept_id.clone(),
                success: true,
                tutorial_id: Some(tutorial_id),
                tutorial_summary: content.summary,
                resource_id: Some(resource_id),
                resource_count: Some(resource_count),
                quiz_id: Some(quiz_id),
                quiz_question_count: Some(quiz_question_count),
                failure_reason: None,
            }
        }
        (tutorial_saved, resources_saved, quiz_saved) => {
            let mut reasons = Vec::new();
            if let Err(err) = tutorial_saved {
                reasons.push(format!("tutorial save: {err}"));
            }
            if let Err(err) = resources_saved {
                reasons.push(format!("resources save: {err}"));
            }
            if let Err(err) = quiz_saved {
                reasons.push(format!("quiz save: {err}"));
            }
            let reason = reasons.join("; ");
            brain.events().publish(Event::ConceptFailed {
                task_id: task_id.to_string(),
                concept_id: concept.concept_id.clone(),
                content_type: "persist".to_string(),
                reason: reason.clone(),
            });
            ConceptOutcome {
                concept_id: concept.concept_id.clone(),
                failure_reason: Some(reason),
                ..Default::default()
            }
        }
    }
}

#[async_trait]
impl NodeRunner for ContentFanoutRunner {
    fn name(&self) -> &'static str {
        "content_fanout"
    }

    async fn run(&self, brain: &WorkflowBrain, state: &RoadmapState) -> Result<StateDelta> {
        let task_id = crate::state::get_str(state, "task_id")
            .ok_or_else(|| EngineError::State("task_id missing".into()))?
            .to_string();
        let roadmap_id = crate::state::get_str(state, "roadmap_id")
            .ok_or_else(|| EngineError::State("roadmap_id missing".into()))?
            .to_string();
        let mut framework: Framework = serde_json::from_value(
            state
                .get("roadmap_framework")
                .cloned()
                .ok_or_else(|| EngineError::State("roadmap_framework missing".into()))?,
        )?;

        let guard = brain.begin_node(self.name(), &task_id, state, false).await?;

        if brain.config().generate_cover_images {
            let title = RoadmapRepository::get(brain.pool(), &roadmap_id)
                .await?
                .map(|r| r.title)
                .unwrap_or_else(|| roadmap_id.clone());
            let agent = self.cover_image_agent.clone();
            let logger = brain.logger_arc();
            let roadmap_id_owned = roadmap_id.clone();
            let task_id_owned = task_id.clone();
            tokio::spawn(async move {
                match agent.generate(&roadmap_id_owned, &title).await {
                    Ok(result) => {
                        logger
                            .info(&task_id_owned, LogCategory::Agent, format!("cover image ready: {}", result.url))
                            .await
                    }
                    Err(err) => {
                        logger
                            .warning(&task_id_owned, LogCategory::Agent, format!("cover image generation failed: {err}"))
                            .await
                    }
                }
            });
        }

        let pending: Vec<&Concept> = framework
            .concepts()
            .filter(|c| {
                !(c.content_status == ContentStatus::Completed
                    && c.resources_status == ContentStatus::Completed
                    && c.quiz_status == ContentStatus::Completed)
            })
            .collect();
        let attempted = pending.len();

        let semaphore = Arc::new(Semaphore::new(brain.config().parallel_concept_limit.max(1)));
        let tutorial_agent = self.tutorial_agent.clone();
        let resource_agent = self.resource_agent.clone();
        let quiz_agent = self.quiz_agent.clone();
        let outcomes = join_all(pending.into_iter().map(|concept| {
            let semaphore = semaphore.clone();
            let tutorial_agent = tutorial_agent.clone();
            let resource_agent = resource_agent.clone();
            let quiz_agent = quiz_agent.clone();
            let task_id = task_id.as_str();
            let roadmap_id = roadmap_id.as_str();
            async move {
                let _permit = semaphore.acquire().await.expect("semaphore never closed");
                process_concept(
                    brain,
                    task_id,
                    roadmap_id,
                    concept,
                    &*tutorial_agent,
                    &*resource_agent,
                    &*quiz_agent,
                )
                .await
            }
        }))
        .await;

        let failed_count = outcomes.iter().filter(|o| !o.success).count();
        if attempted > 0 {
            let failure_rate = failed_count as f64 / attempted as f64;
            if failure_rate >= brain.config().fanout_failure_ratio || failed_count == attempted {
                let reason = format!(
                    "content fan-out aborted: {failed_count}/{attempted} concepts failed (threshold {})",
                    brain.config().fanout_failure_ratio
                );
                brain.logger().log(
                    &task_id,
                    roadmap_db::models::LogLevel::Error,
                    LogCategory::Workflow,
                    reason.clone(),
                    Default::default(),
                ).await;
                let err = EngineError::FanOutAborted(reason.clone());
                guard.fail(&err).await?;
                brain.mark_task_failed(&task_id, &reason).await?;
                return Err(err);
            }
        }

        let mut tutorial_refs = serde_json::Map::new();
        let mut resource_refs = serde_json::Map::new();
        let mut quiz_refs = serde_json::Map::new();
        let mut failed_concepts = Vec::new();

        for outcome in &outcomes {
            let concept = framework
                .concepts_mut()
                .find(|c| c.concept_id == outcome.concept_id)
                .expect("outcome concept id always comes from the framework's own concepts");

            if outcome.success {
                concept.content_status = ContentStatus::Completed;
                concept.content_ref = outcome.tutorial_id.clone();
                concept.content_summary = outcome.tutorial_summary.clone();
                concept.resources_status = ContentStatus::Completed;
                concept.resources_id = outcome.resource_id.clone();
                concept.resources_count = outcome.resource_count;
                concept.quiz_status = ContentStatus::Completed;
                concept.quiz_id = outcome.quiz_id.clone();
                concept.quiz_questions_count = outcome.quiz_question_count;

                if let Some(id) = &outcome.tutorial_id {
                    tutorial_refs.insert(outcome.concept_id.clone(), json!(id));
                }
                if let Some(id) = &outcome.resource_id {
                    resource_refs.insert(outcome.concept_id.clone(), json!(id));
                }
                if let Some(id) = &outcome.quiz_id {
                    quiz_refs.insert(outcome.concept_id.clone(), json!(id));
                }
            } else {
                concept.content_status = ContentStatus::Failed;
                concept.resources_status = ContentStatus::Failed;
                concept.quiz_status = ContentStatus::Failed;
                failed_concepts.push(outcome.concept_id.clone());
            }
        }

        brain.save_framework_snapshot(&roadmap_id, &framework).await?;

        let summary = ExecutionSummary {
            tutorials_generated: outcomes.iter().filter(|o| o.success).count(),
            resources_generated: outcomes.iter().filter(|o| o.success).count(),
            quizzes_generated: outcomes.iter().filter(|o| o.success).count(),
            concepts_completed: outcomes.iter().filter(|o| o.success).count(),
            concepts_failed: failed_concepts.len(),
        };
        let status = if failed_concepts.is_empty() { "completed" } else { "partial_failure" };
        brain.mark_task_terminal(&task_id, status, &summary).await?;

        let framework_value = serde_json::to_value(&framework)?;
        let delta = json!({
            "roadmap_framework": framework_value,
            "tutorial_refs": Value::Object(tutorial_refs),
            "resource_refs": Value::Object(resource_refs),
            "quiz_refs": Value::Object(quiz_refs),
            "failed_concepts": failed_concepts,
            "current_step": self.name(),
            "execution_history": [self.name()],
        });
        guard.complete(&delta).await?;
        Ok(delta)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use roadmap_agents::dto::TutorialContent;
    use roadmap_agents::fakes::{
        FailingTutorialAgent, FakeCoverImageAgent, FakeQuizAgent, FakeResourceAgent, FakeTutorialAgent,
    };
    use roadmap_checkpoint::InMemoryCheckpointSaver;
    use roadmap_db::connection::MetadataDatabase;
    use roadmap_db::models::{Concept, Module, Stage};
    use roadmap_events::EventBus;
    use roadmap_logger::ExecutionLogger;

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

    fn framework_with(ids: &[&str]) -> Framework {
        Framework {
            roadmap_id: "r1".into(),
            stages: vec![Stage {
                stage_id: "s1".into(),
                name: "Stage 1".into(),
                description: String::new(),
                modules: vec![Module {
                    module_id: "m1".into(),
                    name: "Module 1".into(),
                    description: String::new(),
                    concepts: ids.iter().map(|id| concept(id)).collect(),
                }],
            }],
        }
    }

    async fn harness(config: crate::config::WorkflowConfig) -> Arc<WorkflowBrain> {
        let db = MetadataDatabase::connect("sqlite::memory:").await.unwrap();
        db.run_migrations().await.unwrap();
        let checkpoints = Arc::new(InMemoryCheckpointSaver::new());
        let events = Arc::new(EventBus::new());
        let logger = Arc::new(ExecutionLogger::new(db.pool().clone()));
        let brain = Arc::new(WorkflowBrain::new(db.pool().clone(), checkpoints, events, logger, config));
        roadmap_db::repositories::TaskRepository::create(brain.pool(), "t1", "u1", "creation", "{}")
            .await
            .unwrap();
        roadmap_db::repositories::RoadmapRepository::create(brain.pool(), "r1", "t1", "u1", "Rust", "{}", 1, 1, 1)
            .await
            .unwrap();
        brain
    }

    fn state_for(framework: &Framework) -> Value {
        json!({
            "task_id": "t1",
            "roadmap_id": "r1",
            "roadmap_framework": serde_json::to_value(framework).unwrap(),
        })
    }

    fn tutorial_content() -> TutorialContent {
        TutorialContent { title: "t".into(), summary: None, body_markdown: "body".into(), estimated_minutes: None }
    }

    #[tokio::test]
    async fn all_concepts_succeed_marks_task_completed() {
        let mut config = crate::config::WorkflowConfig::default();
        config.generate_cover_images = false;
        let brain = harness(config).await;
        let framework = framework_with(&["c1", "c2"]);
        let runner = ContentFanoutRunner::new(
            Arc::new(FakeTutorialAgent { content: tutorial_content() }),
            Arc::new(FakeResourceAgent { items: vec![] }),
            Arc::new(FakeQuizAgent { questions: vec![] }),
            Arc::new(FakeCoverImageAgent { url: "https://example.invalid/cover.png".into() }),
        );

        let delta = runner.run(&brain, &state_for(&framework)).await.unwrap();
        assert_eq!(delta["failed_concepts"].as_array().unwrap().len(), 0);
        assert!(delta["tutorial_refs"].get("c1").is_some());
        assert!(delta["tutorial_refs"].get("c2").is_some());

        let task = roadmap_db::repositories::TaskRepository::get_by_id(brain.pool(), "t1").await.unwrap().unwrap();
        assert_eq!(task.status, "completed");
    }

    #[tokio::test]
    async fn partial_failure_below_threshold_marks_task_partial_failure() {
        let mut config = crate::config::WorkflowConfig::default();
        config.generate_cover_images = false;
        config.fanout_failure_ratio = 0.75;
        let brain = harness(config).await;
        let framework = framework_with(&["c1", "c2", "c3", "c4"]);
        let runner = ContentFanoutRunner::new(
            Arc::new(FailingTutorialAgent { failing_concept_ids: vec!["c1".into()], content: tutorial_content() }),
            Arc::new(FakeResourceAgent { items: vec![] }),
            Arc::new(FakeQuizAgent { questions: vec![] }),
            Arc::new(FakeCoverImageAgent { url: "https://example.invalid/cover.png".into() }),
        );

        let delta = runner.run(&brain, &state_for(&framework)).await.unwrap();
        let failed = delta["failed_concepts"].as_array().unwrap();
        assert_eq!(failed.len(), 1);
        assert_eq!(failed[0].as_str().unwrap(), "c1");

        let task = roadmap_db::repositories::TaskRepository::get_by_id(brain.pool(), "t1").await.unwrap().unwrap();
        assert_eq!(task.status, "partial_failure");
    }

    #[tokio::test]
    async fn majority_failure_aborts_fanout_and_fails_task() {
        let mut config = crate::config::WorkflowConfig::default();
        config.generate_cover_images = false;
        config.fanout_failure_ratio = 0.5;
        let brain = harness(config).await;
        let framework = framework_with(&["c1", "c2", "c3"]);
        let runner = ContentFanoutRunner::new(
            Arc::new(FailingTutorialAgent {
                failing_concept_ids: vec!["c1".into(), "c2".into()],
                content: tutorial_content(),
            }),
            Arc::new(FakeResourceAgent { items: vec![] }),
            Arc::new(FakeQuizAgent { questions: vec![] }),
            Arc::new(FakeCoverImageAgent { url: "https://example.invalid/cover.png".into() }),
        );

        let err = runner.run(&brain, &state_for(&framework)).await;
        assert!(matches!(err, Err(EngineError::FanOutAborted(_))));

        let task = roadmap_db::repositories::TaskRepository::get_by_id(brain.pool(), "t1").await.unwrap().unwrap();
        assert_eq!(task.status, "failed");
    }

    #[tokio::test]
    async fn already_completed_concepts_are_skipped() {
        let mut config = crate::config::WorkflowConfig::default();
        config.generate_cover_images = false;
        let brain = harness(config).await;
        let mut framework = framework_with(&["c1", "c2"]);
        for concept in framework.concepts_mut() {
            if concept.concept_id == "c1" {
                concept.content_status = ContentStatus::Completed;
                concept.resources_status = ContentStatus::Completed;
                concept.quiz_status = ContentStatus::Completed;
            }
        }
        let runner = ContentFanoutRunner::new(
            Arc::new(FakeTutorialAgent { content: tutorial_content() }),
            Arc::new(FakeResourceAgent { items: vec![] }),
            Arc::new(FakeQuizAgent { questions: vec![] }),
            Arc::new(FakeCoverImageAgent { url: "https://example.invalid/cover.png".into() }),
        );

        let delta = runner.run(&brain, &state_for(&framework)).await.unwrap();
        assert!(delta["tutorial_refs"].get("c1").is_none());
        assert!(delta["tutorial_refs"].get("c2").is_some());
    }
}
