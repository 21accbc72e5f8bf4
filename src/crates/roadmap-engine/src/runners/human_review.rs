use async_trait::async_trait;
use roadmap_db::models::{Framework, LogCategory};
use roadmap_db::repositories::RoadmapRepository;
use serde_json::json;

use crate::brain::WorkflowBrain;
use crate::error::{EngineError, Result, SuspendPayload};
use crate::state::{RoadmapState, StateDelta};

use super::NodeRunner;

/// The suspend/resume point (spec §4.6 "Human Review", §4.9). The node is
/// re-entered twice per review round: the first entry has no
/// `human_approved` channel set yet, so it marks the task
/// `human_review_pending` and suspends; the second entry (after
/// [`crate::executor::Executor::resume_after_human_review`] folds the
/// reviewer's decision into state) finds `human_approved` already present
/// and records the feedback instead of suspending again. The state probe
/// stands in for the teacher's status-probe resume detection, since here
/// the decision travels through the same state object the node reads.
pub struct HumanReviewRunner;

#[async_trait]
impl NodeRunner for HumanReviewRunner {
    fn name(&self) -> &'static str {
        "human_review"
    }

    async fn run(&self, brain: &WorkflowBrain, state: &RoadmapState) -> Result<StateDelta> {
        let task_id = crate::state::get_str(state, "task_id")
            .ok_or_else(|| EngineError::State("task_id missing".into()))?
            .to_string();
        let roadmap_id = crate::state::get_str(state, "roadmap_id")
            .ok_or_else(|| EngineError::State("roadmap_id missing".into()))?
            .to_string();
        let framework: Framework = serde_json::from_value(
            state
                .get("roadmap_framework")
                .cloned()
                .ok_or_else(|| EngineError::State("roadmap_framework missing".into()))?,
        )?;

        if let Some(approved) = crate::state::get_bool(state, "human_approved") {
            return self.resume(brain, &task_id, &roadmap_id, &framework, state, approved).await;
        }

        if brain.config().skip_review {
            let delta = json!({
                "human_approved": true,
                "current_step": self.name(),
                "execution_history": [self.name()],
            });
            brain
                .begin_node(self.name(), &task_id, state, false)
                .await?
                .complete(&delta)
                .await?;
            return Ok(delta);
        }

        self.suspend(brain, task_id, roadmap_id, framework, state).await
    }
}

impl HumanReviewRunner {
    async fn suspend(
        &self,
        brain: &WorkflowBrain,
        task_id: String,
        roadmap_id: String,
        framework: Framework,
        state: &RoadmapState,
    ) -> Result<StateDelta> {
        let guard = brain.begin_node(self.name(), &task_id, state, false).await?;

        let title = RoadmapRepository::get(brain.pool(), &roadmap_id)
            .await?
            .map(|r| r.title)
            .unwrap_or_else(|| roadmap_id.clone());

        brain
            .update_task_to_pending_review(&task_id, &roadmap_id, &title, &framework)
            .await?;
        guard.suspend().await?;

        Err(EngineError::Suspended(SuspendPayload {
            task_id,
            roadmap_id,
            node: self.name().to_string(),
            message: format!("roadmap '{title}' is awaiting human review"),
        }))
    }

    async fn resume(
        &self,
        brain: &WorkflowBrain,
        task_id: &str,
        roadmap_id: &str,
        framework: &Framework,
        state: &RoadmapState,
        approved: bool,
    ) -> Result<StateDelta> {
        // `human_review` is re-entered here after the original suspend
        // already ran the entry effects (status -> processing, progress
        // event, start log), so skip them the second time around.
        let guard = brain.begin_node(self.name(), task_id, state, true).await?;
        let feedback = crate::state::get_str(state, "user_feedback");

        let review_feedback_id =
            match brain.record_review_feedback(task_id, roadmap_id, approved, feedback, framework).await {
                Ok(id) => Some(id),
                Err(err) => {
                    // Spec: feedback persistence failing does not block the
                    // workflow — the decision is already captured by this
                    // call's `approved` argument.
                    brain
                        .logger()
                        .warning(
                            task_id,
                            LogCategory::Workflow,
                            format!("failed to persist human review feedback: {err}"),
                        )
                        .await;
                    None
                }
            };

        brain.update_task_after_review(task_id, self.name()).await?;

        let mut delta = json!({
            "current_step": self.name(),
            "execution_history": [self.name()],
        });
        if let Some(id) = review_feedback_id {
            delta["review_feedback_id"] = json!(id);
        }
        if !approved {
            delta["edit_source"] = json!("human_review");
        }

        guard.complete(&delta).await?;
        Ok(delta)
    }
}
