use std::sync::Arc;

use async_trait::async_trait;
use roadmap_agents::{CurriculumAgent, IntentAnalysis, LearningRequest};
use serde_json::json;

use crate::brain::WorkflowBrain;
use crate::error::{EngineError, Result};
use crate::state::{RoadmapState, StateDelta};

use super::NodeRunner;

/// Designs the stage/module/concept tree from the user's request and the
/// intent analysis (spec §4.6 "Curriculum Design").
pub struct CurriculumDesignRunner {
    agent: Arc<dyn CurriculumAgent>,
}

impl CurriculumDesignRunner {
    pub fn new(agent: Arc<dyn CurriculumAgent>) -> Self {
        Self { agent }
    }
}

#[async_trait]
impl NodeRunner for CurriculumDesignRunner {
    fn name(&self) -> &'static str {
        "curriculum_design"
    }

    async fn run(&self, brain: &WorkflowBrain, state: &RoadmapState) -> Result<StateDelta> {
        let task_id = crate::state::get_str(state, "task_id")
            .ok_or_else(|| EngineError::State("task_id missing".into()))?
            .to_string();
        let roadmap_id = crate::state::get_str(state, "roadmap_id")
            .ok_or_else(|| EngineError::State("roadmap_id missing".into()))?
            .to_string();

        let request: LearningRequest = serde_json::from_value(
            state
                .get("user_request")
                .cloned()
                .ok_or_else(|| EngineError::State("user_request missing".into()))?,
        )?;
        let intent: IntentAnalysis = serde_json::from_value(
            state
                .get("intent_analysis")
                .cloned()
                .ok_or_else(|| EngineError::State("intent_analysis missing".into()))?,
        )?;

        let guard = brain.begin_node(self.name(), &task_id, state, false).await?;
        let framework = match self.agent.design(&request, &intent).await {
            Ok(f) => f,
            Err(err) => {
                let err = EngineError::from(err);
                guard.fail(&err).await?;
                return Err(err);
            }
        };

        let title = format!("{} roadmap", request.learning_goal);
        let framework = brain
            .save_roadmap_framework(&task_id, &request.user_id, &title, &roadmap_id, &framework)
            .await?;

        let framework_value = serde_json::to_value(&framework)?;
        let delta = json!({
            "roadmap_framework": framework_value,
            "current_step": self.name(),
            "execution_history": [self.name()],
        });
        guard.complete(&delta).await?;
        Ok(delta)
    }
}
