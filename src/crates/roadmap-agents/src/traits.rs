//! Trait contracts for the external, LLM-backed agents (spec §6). No vendor
//! HTTP clients or prompt templates live here — that wiring is out of scope;
//! these traits are the seam the Node Runners (C6) call through.

use crate::dto::{
    CoverImageResult, EditSource, IntentAnalysis, LearningRequest, TutorialContent,
    ValidationOutcome,
};
use crate::error::AgentError;
use async_trait::async_trait;
use roadmap_db::models::{Concept, EditPlan, Framework, QuizQuestion, ResourceItem};

#[async_trait]
pub trait IntentAgent: Send + Sync {
    async fn analyze(&self, request: &LearningRequest) -> Result<IntentAnalysis, AgentError>;
}

#[async_trait]
pub trait CurriculumAgent: Send + Sync {
    async fn design(
        &self,
        request: &LearningRequest,
        intent: &IntentAnalysis,
    ) -> Result<Framework, AgentError>;
}

#[async_trait]
pub trait ValidatorAgent: Send + Sync {
    async fn validate(&self, framework: &Framework) -> Result<ValidationOutcome, AgentError>;
}

#[async_trait]
pub trait EditPlanAgent: Send + Sync {
    async fn plan(
        &self,
        framework: &Framework,
        source: EditSource,
        feedback: &str,
    ) -> Result<EditPlan, AgentError>;
}

#[async_trait]
pub trait EditorAgent: Send + Sync {
    async fn apply(&self, framework: &Framework, plan: &EditPlan) -> Result<Framework, AgentError>;
}

#[async_trait]
pub trait TutorialAgent: Send + Sync {
    async fn generate(&self, concept: &Concept) -> Result<TutorialContent, AgentError>;
}

#[async_trait]
pub trait ResourceAgent: Send + Sync {
    async fn recommend(&self, concept: &Concept) -> Result<Vec<ResourceItem>, AgentError>;
}

#[async_trait]
pub trait QuizAgent: Send + Sync {
    async fn generate(&self, concept: &Concept) -> Result<Vec<QuizQuestion>, AgentError>;
}

#[async_trait]
pub trait CoverImageAgent: Send + Sync {
    async fn generate(&self, roadmap_id: &str, title: &str) -> Result<CoverImageResult, AgentError>;
}
