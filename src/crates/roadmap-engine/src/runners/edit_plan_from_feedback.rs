use std::sync::Arc;

use async_trait::async_trait;
use roadmap_agents::{EditPlanAgent, EditSource};
use roadmap_db::models::{Framework, LogCategory};
use serde_json::json;

use crate::brain::WorkflowBrain;
use crate::error::{EngineError, Result};
use crate::state::{RoadmapState, StateDelta};

use super::validation_edit_plan::format_validation_feedback;
use super::NodeRunner;

/// Turns a human reviewer's free-text rejection feedback into an edit plan
/// (spec §4.6 "Edit Plan Analysis (human feedback)"). When the agent flags
/// `needs_clarification`, this proceeds anyway with its best-effort plan
/// and logs a warning rather than suspending a second time — clarifying
/// would mean another round trip to the same human, and the plan is still
/// actionable even if partial.
pub struct EditPlanFromFeedbackRunner {
    agent: Arc<dyn EditPlanAgent>,
}

impl EditPlanFromFeedbackRunner {
    pub fn new(agent: Arc<dyn EditPlanAgent>) -> Self {
        Self { agent }
    }
}

#[async_trait]
impl NodeRunner for EditPlanFromFeedbackRunner {
    fn name(&self) -> &'static str {
        "edit_plan_from_feedback"
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
        let user_feedback = crate::state::get_str(state, "user_feedback").unwrap_or("").to_string();
        let feedback = if let Some(validation_result) = state.get("validation_result") {
            format!("{}\n{}", user_feedback, format_validation_feedback(validation_result))
        } else {
            user_feedback
        };

        let guard = brain.begin_node(self.name(), &task_id, state, false).await?;
        let plan = match self.agent.plan(&framework, EditSource::HumanReview, &feedback).await {
            Ok(p) => p,
            Err(err) => {
                let err = EngineError::from(err);
                guard.fail(&err).await?;
                return Err(err);
            }
        };

        if plan.needs_clarification {
            brain
                .logger()
                .warning(
                    &task_id,
                    LogCategory::Agent,
                    "edit plan agent flagged needs_clarification; proceeding with best-effort plan",
                )
                .await;
        }

        brain
            .save_edit_plan(
                &task_id,
                &roadmap_id,
                EditSource::HumanReview.as_str(),
                Some(plan.feedback_summary.as_str()),
                Some(plan.scope_analysis.as_str()),
                &plan.preservation_requirements,
                &plan.intents,
                plan.needs_clarification,
            )
            .await?;

        let plan_value = serde_json::to_value(&plan)?;
        let delta = json!({
            "edit_plan": plan_value,
            "edit_source": EditSource::HumanReview.as_str(),
            "current_step": self.name(),
            "execution_history": [self.name()],
        });
        guard.complete(&delta).await?;
        Ok(delta)
    }
}
