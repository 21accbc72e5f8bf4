//! Builds the [`roadmap_engine::Agents`] bundle the executor calls through.
//!
//! `roadmap-agents` deliberately carries no vendor LLM clients (spec §1,
//! §12) — prompt templates and HTTP integrations are out of scope for this
//! crate. This wires the crate's `test-util` fakes in their place so the
//! worker is runnable end to end; swapping in real implementations means
//! replacing this one function with one that builds the same
//! `roadmap_engine::Agents` struct from HTTP-backed `roadmap_agents` trait
//! impls.

use std::sync::{Arc, Mutex};

use roadmap_agents::dto::{IntentAnalysis, TutorialContent, ValidationOutcome};
use roadmap_agents::fakes::{
    FakeCoverImageAgent, FakeCurriculumAgent, FakeEditPlanAgent, FakeEditorAgent, FakeIntentAgent,
    FakeQuizAgent, FakeResourceAgent, FakeTutorialAgent, FakeValidatorAgent,
};
use roadmap_db::models::{EditPlan, Framework};
use roadmap_engine::Agents;

pub fn placeholder_agents() -> Agents {
    let framework = Framework {
        roadmap_id: String::new(),
        stages: vec![],
    };

    Agents {
        intent: Arc::new(FakeIntentAgent {
            response: IntentAnalysis {
                tech_stack: vec![],
                difficulty_profile: "beginner".to_string(),
                time_constraint_summary: String::new(),
                skill_gaps: vec![],
                recommendations: vec![],
                summary: String::new(),
            },
        }),
        curriculum: Arc::new(FakeCurriculumAgent { framework: framework.clone() }),
        validator: Arc::new(FakeValidatorAgent::new(vec![ValidationOutcome {
            is_valid: true,
            dimension_scores: vec![],
            issues: vec![],
            improvement_suggestions: vec![],
            summary: None,
        }])),
        edit_plan: Arc::new(FakeEditPlanAgent {
            plan: EditPlan {
                feedback_summary: String::new(),
                scope_analysis: String::new(),
                preservation_requirements: vec![],
                intents: vec![],
                needs_clarification: false,
            },
        }),
        editor: Arc::new(FakeEditorAgent { edited: Mutex::new(framework) }),
        tutorial: Arc::new(FakeTutorialAgent {
            content: TutorialContent {
                title: String::new(),
                summary: None,
                body_markdown: String::new(),
                estimated_minutes: None,
            },
        }),
        resource: Arc::new(FakeResourceAgent { items: vec![] }),
        quiz: Arc::new(FakeQuizAgent { questions: vec![] }),
        cover_image: Arc::new(FakeCoverImageAgent {
            url: "https://placeholder.invalid/cover.png".to_string(),
        }),
    }
}
