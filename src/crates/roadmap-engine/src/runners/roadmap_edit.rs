use std::sync::Arc;

use async_trait::async_trait;
use roadmap_agents::EditorAgent;
use roadmap_db::models::{EditPlan, Framework};
use serde_json::json;

use crate::brain::WorkflowBrain;
use crate::error::{EngineError, Result};
use crate::state::{RoadmapState, StateDelta};

use super::NodeRunner;

/// Applies an [`EditPlan`] to the current framework, persists the diff, and
/// bumps `modification_count` (spec §4.6 "Roadmap Edit").
pub struct RoadmapEditRunner {
    agent: Arc<dyn EditorAgent>,
}

impl RoadmapEditRunner {
    pub fn new(agent: Arc<dyn EditorAgent>) -> Self {
        Self { agent }
    }
}

#[async_trait]
impl NodeRunner for RoadmapEditRunner {
    fn name(&self) -> &'static str {
        "roadmap_edit"
    }

    async fn run(&self, brain: &WorkflowBrain, state: &RoadmapState) -> Result<StateDelta> {
        let task_id = crate::state::get_str(state, "task_id")
            .ok_or_else(|| EngineError::State("task_id missing".into()))?
            .to_string();
        let roadmap_id = crate::state::get_str(state, "roadmap_id")
            .ok_or_else(|| EngineError::State("roadmap_id missing".into()))?
            .to_string();
        let origin: Framework = serde_json::from_value(
            state
                .get("roadmap_framework")
                .cloned()
                .ok_or_else(|| EngineError::State("roadmap_framework missing".into()))?,
        )?;
        let plan: EditPlan = serde_json::from_value(
            state
                .get("edit_plan")
                .cloned()
                .ok_or_else(|| EngineError::State("edit_plan missing".into()))?,
        )?;

        let guard = brain.begin_node(self.name(), &task_id, state, false).await?;
        let modified = match self.agent.apply(&origin, &plan).await {
            Ok(f) => f,
            Err(err) => {
                let err = EngineError::from(err);
                guard.fail(&err).await?;
                return Err(err);
            }
        };

        let changed_concepts = brain
            .save_edit_result(&task_id, &roadmap_id, &origin, &modified, Some(plan.feedback_summary.as_str()))
            .await?;

        let modification_count = crate::state::get_i64(state, "modification_count") + 1;
        let framework_value = serde_json::to_value(&modified)?;
        let delta = json!({
            "roadmap_framework": framework_value,
            "modification_count": modification_count,
            "current_step": self.name(),
            "execution_history": [self.name()],
            "last_changed_concepts": changed_concepts,
        });
        guard.complete(&delta).await?;
        Ok(delta)
    }
}
