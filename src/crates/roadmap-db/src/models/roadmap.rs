use serde::{Deserialize, Serialize};
use sqlx::FromRow;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ContentStatus {
    Pending,
    Generating,
    Completed,
    Failed,
}

impl Default for ContentStatus {
    fn default() -> Self {
        ContentStatus::Pending
    }
}

/// Leaf node of the framework tree; target of content fan-out.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Concept {
    pub concept_id: String,
    pub name: String,
    pub description: String,
    pub estimated_hours: f32,
    pub prerequisites: Vec<String>,
    pub difficulty: String,
    pub keywords: Vec<String>,

    #[serde(default)]
    pub content_status: ContentStatus,
    pub content_ref: Option<String>,
    pub content_summary: Option<String>,

    #[serde(default)]
    pub resources_status: ContentStatus,
    pub resources_id: Option<String>,
    pub resources_count: Option<u32>,

    #[serde(default)]
    pub quiz_status: ContentStatus,
    pub quiz_id: Option<String>,
    pub quiz_questions_count: Option<u32>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Module {
    pub module_id: String,
    pub name: String,
    pub description: String,
    pub concepts: Vec<Concept>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Stage {
    pub stage_id: String,
    pub name: String,
    pub description: String,
    pub modules: Vec<Module>,
}

/// The three-level tree: stage -> module -> concept.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Framework {
    pub roadmap_id: String,
    pub stages: Vec<Stage>,
}

impl Framework {
    pub fn concepts(&self) -> impl Iterator<Item = &Concept> {
        self.stages
            .iter()
            .flat_map(|s| s.modules.iter())
            .flat_map(|m| m.concepts.iter())
    }

    pub fn concepts_mut(&mut self) -> impl Iterator<Item = &mut Concept> {
        self.stages
            .iter_mut()
            .flat_map(|s| s.modules.iter_mut())
            .flat_map(|m| m.concepts.iter_mut())
    }

    pub fn total_stages(&self) -> usize {
        self.stages.len()
    }

    pub fn total_modules(&self) -> usize {
        self.stages.iter().map(|s| s.modules.len()).sum()
    }

    pub fn total_concepts(&self) -> usize {
        self.concepts().count()
    }

    pub fn find_concept(&self, concept_id: &str) -> Option<&Concept> {
        self.concepts().find(|c| c.concept_id == concept_id)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct RoadmapMetadata {
    pub roadmap_id: String,
    pub task_id: String,
    pub user_id: String,
    pub title: String,
    pub total_stages: i64,
    pub total_modules: i64,
    pub total_concepts: i64,
    /// JSON-encoded [`Framework`]. Must be re-serialized and flagged modified
    /// on every write; never mutated through a loaded entity (spec §4.2).
    pub framework: String,
    pub deleted_at: Option<String>,
    pub deleted_by: Option<String>,
    pub created_at: String,
    pub updated_at: String,
}

impl RoadmapMetadata {
    pub fn framework_value(&self) -> Result<Framework, serde_json::Error> {
        serde_json::from_str(&self.framework)
    }

    pub fn is_deleted(&self) -> bool {
        self.deleted_at.is_some()
    }
}
