//! In-memory trait implementations for downstream crate tests. Enabled by
//! the `test-util` feature so `roadmap-engine` can depend on this module
//! without pulling it into non-test builds, the same way `tokio`'s
//! `test-util` feature is gated.

use crate::dto::{
    CoverImageResult, EditSource, IntentAnalysis, LearningRequest, TutorialContent,
    ValidationOutcome,
};
use crate::error::AgentError;
use crate::traits::{
    CoverImageAgent, CurriculumAgent, EditPlanAgent, EditorAgent, IntentAgent, QuizAgent,
    ResourceAgent, TutorialAgent, ValidatorAgent,
};
use async_trait::async_trait;
use roadmap_db::models::{
    Concept, DimensionScore, EditIntent, EditPlan, Framework, IntentPriority, IntentType,
    QuizQuestion, ResourceItem,
};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

pub struct FakeIntentAgent {
    pub response: IntentAnalysis,
}

#[async_trait]
impl IntentAgent for FakeIntentAgent {
    async fn analyze(&self, _request: &LearningRequest) -> Result<IntentAnalysis, AgentError> {
        Ok(self.response.clone())
    }
}

pub struct FakeCurriculumAgent {
    pub framework: Framework,
}

#[async_trait]
impl CurriculumAgent for FakeCurriculumAgent {
    async fn design(
        &self,
        _request: &LearningRequest,
        _intent: &IntentAnalysis,
    ) -> Result<Framework, AgentError> {
        Ok(self.framework.clone())
    }
}

/// Returns `invalid_then_valid[call_index]`, clamped to the last entry once
/// exhausted — used to drive the validation-edit convergence test (spec §8
/// scenario 2).
pub struct FakeValidatorAgent {
    pub responses: Vec<ValidationOutcome>,
    call_count: AtomicUsize,
}

impl FakeValidatorAgent {
    pub fn new(responses: Vec<ValidationOutcome>) -> Self {
        Self {
            responses,
            call_count: AtomicUsize::new(0),
        }
    }
}

#[async_trait]
impl ValidatorAgent for FakeValidatorAgent {
    async fn validate(&self, _framework: &Framework) -> Result<ValidationOutcome, AgentError> {
        let index = self.call_count.fetch_add(1, Ordering::SeqCst);
        let last = self.responses.len().saturating_sub(1);
        Ok(self.responses[index.min(last)].clone())
    }
}

pub struct FakeEditPlanAgent {
    pub plan: EditPlan,
}

#[async_trait]
impl EditPlanAgent for FakeEditPlanAgent {
    async fn plan(
        &self,
        _framework: &Framework,
        _source: EditSource,
        _feedback: &str,
    ) -> Result<EditPlan, AgentError> {
        Ok(self.plan.clone())
    }
}

pub struct FakeEditorAgent {
    pub edited: Mutex<Framework>,
}

#[async_trait]
impl EditorAgent for FakeEditorAgent {
    async fn apply(&self, _framework: &Framework, _plan: &EditPlan) -> Result<Framework, AgentError> {
        Ok(self.edited.lock().unwrap().clone())
    }
}

pub struct FakeTutorialAgent {
    pub content: TutorialContent,
}

#[async_trait]
impl TutorialAgent for FakeTutorialAgent {
    async fn generate(&self, _concept: &Concept) -> Result<TutorialContent, AgentError> {
        Ok(self.content.clone())
    }
}

/// Fails for any concept id in `failing_concept_ids`, used to drive partial
/// failure and majority-failure fan-out tests (spec §8 scenarios 5 and 6).
pub struct FailingTutorialAgent {
    pub failing_concept_ids: Vec<String>,
    pub content: TutorialContent,
}

#[async_trait]
impl TutorialAgent for FailingTutorialAgent {
    async fn generate(&self, concept: &Concept) -> Result<TutorialContent, AgentError> {
        if self.failing_concept_ids.contains(&concept.concept_id) {
            return Err(AgentError::CallFailed(format!(
                "stubbed failure for concept {}",
                concept.concept_id
            )));
        }
        Ok(self.content.clone())
    }
}

pub struct FakeResourceAgent {
    pub items: Vec<ResourceItem>,
}

#[async_trait]
impl ResourceAgent for FakeResourceAgent {
    async fn recommend(&self, _concept: &Concept) -> Result<Vec<ResourceItem>, AgentError> {
        Ok(self.items.clone())
    }
}

pub struct FakeQuizAgent {
    pub questions: Vec<QuizQuestion>,
}

#[async_trait]
impl QuizAgent for FakeQuizAgent {
    async fn generate(&self, _concept: &Concept) -> Result<Vec<QuizQuestion>, AgentError> {
        Ok(self.questions.clone())
    }
}

pub struct FakeCoverImageAgent {
    pub url: String,
}

#[async_trait]
impl CoverImageAgent for FakeCoverImageAgent {
    async fn generate(&self, _roadmap_id: &str, _title: &str) -> Result<CoverImageResult, AgentError> {
        Ok(CoverImageResult { url: self.url.clone() })
    }
}

pub fn sample_dimension_score(dimension: &str, score: f64, weight: f64) -> DimensionScore {
    DimensionScore {
        dimension: dimension.to_string(),
        score,
        weight,
    }
}

pub fn sample_edit_intent(target_path: &str, description: &str) -> EditIntent {
    EditIntent {
        intent_type: IntentType::Modify,
        target_path: target_path.to_string(),
        description: description.to_string(),
        priority: IntentPriority::Should,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn fake_validator_returns_responses_in_order_then_sticks() {
        let agent = FakeValidatorAgent::new(vec![
            ValidationOutcome {
                is_valid: false,
                dimension_scores: vec![],
                issues: vec![],
                improvement_suggestions: vec![],
                summary: None,
            },
            ValidationOutcome {
                is_valid: true,
                dimension_scores: vec![],
                issues: vec![],
                improvement_suggestions: vec![],
                summary: None,
            },
        ]);
        let framework = Framework { roadmap_id: "r1".into(), stages: vec![] };

        assert!(!agent.validate(&framework).await.unwrap().is_valid);
        assert!(agent.validate(&framework).await.unwrap().is_valid);
        assert!(agent.validate(&framework).await.unwrap().is_valid);
    }

    #[tokio::test]
    async fn failing_tutorial_agent_only_fails_named_concepts() {
        let agent = FailingTutorialAgent {
            failing_concept_ids: vec!["c2".into()],
            content: TutorialContent {
                title: "t".into(),
                summary: None,
                body_markdown: "body".into(),
                estimated_minutes: None,
            },
        };

        let ok_concept = Concept {
            concept_id: "c1".into(),
            name: "Ownership".into(),
            description: "".into(),
            estimated_hours: 1.0,
            prerequisites: vec![],
            difficulty: "beginner".into(),
            keywords: vec![],
            content_status: Default::default(),
            content_ref: None,
            content_summary: None,
            resources_status: Default::default(),
            resources_id: None,
            resources_count: None,
            quiz_status: Default::default(),
            quiz_id: None,
            quiz_questions_count: None,
        };
        let mut failing_concept = ok_concept.clone();
        failing_concept.concept_id = "c2".into();

        assert!(agent.generate(&ok_concept).await.is_ok());
        assert!(agent.generate(&failing_concept).await.is_err());
    }
}
