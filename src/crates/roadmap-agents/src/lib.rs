//! Trait contracts and DTOs for the external, LLM-backed agents the engine
//! calls: intent analysis, curriculum design, structural validation, edit
//! planning, editing, and the three content-fanout agents (tutorial,
//! resources, quiz) plus cover-image generation.
//!
//! No vendor HTTP clients or prompt templates live here (out of scope,
//! spec §1) — only the plain-data contract the Node Runners (C6) call
//! through, matching spec §6's "inputs and outputs are plain data" rule.
//!
//! # Modules
//! - [`dto`] - request/response payloads
//! - [`traits`] - one trait per agent kind
//! - [`error`] - [`error::AgentError`]
//! - `fakes` - in-memory test doubles, behind the `test-util` feature

pub mod dto;
pub mod error;
pub mod traits;

#[cfg(feature = "test-util")]
pub mod fakes;

pub use dto::{
    CoverImageResult, EditSource, IntentAnalysis, LearningRequest, TutorialContent,
    ValidationOutcome,
};
pub use error::AgentError;
pub use traits::{
    CoverImageAgent, CurriculumAgent, EditPlanAgent, EditorAgent, IntentAgent, QuizAgent,
    ResourceAgent, TutorialAgent, ValidatorAgent,
};
