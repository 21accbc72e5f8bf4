pub mod edit_plan_repo;
pub mod edit_repo;
pub mod execution_log_repo;
pub mod profile_repo;
pub mod quiz_repo;
pub mod resource_repo;
pub mod retention;
pub mod review_feedback_repo;
pub mod roadmap_repo;
pub mod task_repo;
pub mod tutorial_repo;
pub mod validation_repo;

pub use edit_plan_repo::EditPlanRepository;
pub use edit_repo::EditRepository;
pub use execution_log_repo::ExecutionLogRepository;
pub use profile_repo::{ChatRepository, NoteRepository, ProfileRepository};
pub use quiz_repo::QuizRepository;
pub use resource_repo::ResourceRepository;
pub use retention::RetentionSweeper;
pub use review_feedback_repo::ReviewFeedbackRepository;
pub use roadmap_repo::{ensure_unique_roadmap_id, RoadmapRepository};
pub use task_repo::TaskRepository;
pub use tutorial_repo::TutorialRepository;
pub use validation_repo::ValidationRepository;
