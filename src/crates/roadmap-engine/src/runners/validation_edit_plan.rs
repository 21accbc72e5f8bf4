use std::sync::Arc;

use async_trait::async_trait;
use roadmap_agents::{EditPlanAgent, EditSource};
use roadmap_db::models::Framework;
use serde_json::json;

use crate::brain::WorkflowBrain;
use crate::error::{EngineError, Result};
use crate::state::{RoadmapState, StateDelta};

use super::NodeRunner;

/// Turns a failed validation's issues into an [`roadmap_db::models::EditPlan`]
/// (spec §4.6 "Validation Edit Plan Analysis"). Shares its feedback-summary
/// formatting with [`super::edit_plan_from_feedback::EditPlanFromFeedbackRunner`]
/// via [`format_validation_feedback`].
pub struct ValidationEditPlanRunner {
    agent: Arc<dyn EditPlanAgent>,
}

impl ValidationEditPlanRunner {
    pub fn new(agent: Arc<dyn EditPlanAgent>) -> Self {
        Self { agent }
    }
}

/// Renders a validation result's issues and suggestions into the plain-text
/// feedback string the edit-plan agent consumes. Shared so both edit
/// sources (failed validation, human review) produce a consistently
/// formatted summary an operator reading execution logs can compare.
pub fn format_validation_feedback(validation_result: &serde_json::Value) -> String {
    let mut lines = Vec::new();
    if let Some(summary) = validation_result.get("summary").and_then(|v| v.as_str()) {
        lines.push(summary.to_string());
    }
    if let Some(issues) = validation_result.get("issues").and_then(|v| v.as_array()) {
        for issue in issues {
            let severity = issue.get("severity").and_then(|v| v.as_str()).unwrap_or("warning");
            let description = issue.get("description").and_then(|v| v.as_str()).unwrap_or("");
            lines.push(format!("[{severity}] {description}"));
        }
    }
    if let Some(suggestions) = validation_result.get("improvement_suggestions").and_then(|v| v.as_array()) {
        for suggestion in suggestions {
            if let Some(text) = suggestion.as_str() {
                lines.push(format!("suggestion: {text}"));
            }
        }
    }
    lines.join("\n")
}

#[async_trait]
impl NodeRunner for ValidationEditPlanRunner {
    fn name(&self) -> &'static str {
        "validation_edit_plan"
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
        let validation_result = state
            .get("validation_result")
            .cloned()
            .ok_or_else(|| EngineError::State("validation_result missing".into()))?;
        let feedback = format_validation_feedback(&validation_result);

        let guard = brain.begin_node(self.name(), &task_id, state, false).await?;
        let plan = match self.agent.plan(&framework, EditSource::ValidationFailed, &feedback).await {
            Ok(p) => p,
            Err(err) => {
                let err = EngineError::from(err);
                guard.fail(&err).await?;
                return Err(err);
            }
        };

        brain
            .save_edit_plan(
                &task_id,
                &roadmap_id,
                EditSource::ValidationFailed.as_str(),
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
            "edit_source": EditSource::ValidationFailed.as_str(),
            "current_step": self.name(),
            "execution_history": [self.name()],
        });
        guard.complete(&delta).await?;
        Ok(delta)
    }
}
