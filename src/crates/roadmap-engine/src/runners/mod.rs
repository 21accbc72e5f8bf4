//! Node Runners (C6): one [`NodeRunner`] per graph node, each translating a
//! slice of [`RoadmapState`] into an agent call (or, for Structural
//! Validation, a local check) and a [`StateDelta`].
//!
//! Mirrors the teacher's `workflow::executor` pattern of one async function
//! per LLM step, generalized to a trait so the Graph Builder (C7) can hold
//! runners as trait objects and the Executor (C8) can invoke them uniformly.

mod content_fanout;
mod curriculum_design;
mod edit_plan_from_feedback;
mod human_review;
mod intent_analysis;
mod roadmap_edit;
mod structure_validation;
mod validation_edit_plan;

pub use content_fanout::ContentFanoutRunner;
pub use curriculum_design::CurriculumDesignRunner;
pub use edit_plan_from_feedback::EditPlanFromFeedbackRunner;
pub use human_review::HumanReviewRunner;
pub use intent_analysis::IntentAnalysisRunner;
pub use roadmap_edit::RoadmapEditRunner;
pub use structure_validation::{validate_structure, StructureValidationRunner};
pub use validation_edit_plan::ValidationEditPlanRunner;

use async_trait::async_trait;

use crate::brain::WorkflowBrain;
use crate::error::Result;
use crate::state::{RoadmapState, StateDelta};

#[async_trait]
pub trait NodeRunner: Send + Sync {
    fn name(&self) -> &'static str;

    async fn run(&self, brain: &WorkflowBrain, state: &RoadmapState) -> Result<StateDelta>;
}
