pub mod edit;
pub mod edit_plan;
pub mod execution_log;
pub mod profile;
pub mod quiz;
pub mod resource;
pub mod review_feedback;
pub mod roadmap;
pub mod task;
pub mod tutorial;
pub mod validation;

pub use edit::EditRecord;
pub use edit_plan::{EditIntent, EditPlan, EditPlanRecord, IntentPriority, IntentType};
pub use execution_log::{ExecutionLogRow, LogCategory, LogLevel, LogSummary, NewExecutionLog};
pub use profile::{ChatMessage, Note, UserProfile};
pub use quiz::{Quiz, QuizQuestion};
pub use resource::{ResourceBundle, ResourceItem};
pub use review_feedback::HumanReviewFeedback;
pub use roadmap::{Concept, ContentStatus, Framework, Module, RoadmapMetadata, Stage};
pub use task::{
    truncate_error_message, ExecutionSummary, FailedConceptRecord, Task, TaskStatus, TaskType,
    ERROR_MESSAGE_MAX_CHARS,
};
pub use tutorial::Tutorial;
pub use validation::{compute_overall_score, DimensionScore, IssueSeverity, ValidationIssue, ValidationRecord};
