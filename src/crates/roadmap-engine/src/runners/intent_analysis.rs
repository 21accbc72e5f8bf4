use std::sync::Arc;

use async_trait::async_trait;
use roadmap_agents::{IntentAgent, LearningRequest};
use serde_json::json;

use crate::brain::WorkflowBrain;
use crate::error::Result;
use crate::state::{RoadmapState, StateDelta};

use super::NodeRunner;

/// First node: turns the raw `user_request` channel into a structured
/// [`roadmap_agents::IntentAnalysis`] (spec §4.6 "Intent Analysis").
pub struct IntentAnalysisRunner {
    agent: Arc<dyn IntentAgent>,
}

impl IntentAnalysisRunner {
    pub fn new(agent: Arc<dyn IntentAgent>) -> Self {
        Self { agent }
    }
}

#[async_trait]
impl NodeRunner for IntentAnalysisRunner {
    fn name(&self) -> &'static str {
        "intent_analysis"
    }

    async fn run(&self, brain: &WorkflowBrain, state: &RoadmapState) -> Result<StateDelta> {
        let task_id = crate::state::get_str(state, "task_id")
            .ok_or_else(|| crate::error::EngineError::State("task_id missing".into()))?
            .to_string();

        let request: LearningRequest = serde_json::from_value(
            state
                .get("user_request")
                .cloned()
                .ok_or_else(|| crate::error::EngineError::State("user_request missing".into()))?,
        )?;

        let guard = brain.begin_node(self.name(), &task_id, state, false).await?;
        let analysis = match self.agent.analyze(&request).await {
            Ok(a) => a,
            Err(err) => {
                let err = crate::error::EngineError::from(err);
                guard.fail(&err).await?;
                return Err(err);
            }
        };

        let roadmap_id_seed = format!(
            "{}-roadmap",
            request
                .learning_goal
                .to_lowercase()
                .chars()
                .map(|c| if c.is_alphanumeric() { c } else { '-' })
                .collect::<String>()
        );
        let roadmap_id = brain.ensure_unique_roadmap_id(&roadmap_id_seed).await?;

        let analysis_value = serde_json::to_value(&analysis)?;
        brain.save_intent_analysis(&task_id, &roadmap_id, &analysis_value).await?;

        let delta = json!({
            "roadmap_id": roadmap_id,
            "intent_analysis": analysis_value,
            "current_step": self.name(),
            "execution_history": [self.name()],
        });
        guard.complete(&delta).await?;
        Ok(delta)
    }
}
