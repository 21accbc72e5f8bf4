use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use super::roadmap::Framework;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct EditRecord {
    pub id: String,
    pub task_id: String,
    pub roadmap_id: String,
    pub edit_round: i64,
    /// JSON-encoded [`Framework`] before the edit.
    pub origin_framework: String,
    /// JSON-encoded [`Framework`] after the edit.
    pub modified_framework: String,
    /// JSON-encoded `Vec<String>` of changed concept ids.
    pub changed_concept_ids: String,
    pub summary: Option<String>,
    pub created_at: String,
}

impl EditRecord {
    pub fn changed_concept_ids_value(&self) -> Vec<String> {
        serde_json::from_str(&self.changed_concept_ids).unwrap_or_default()
    }
}

/// Diffs two frameworks by concept id to compute the changed set, used when
/// building an [`EditRecord`] (spec §4.6 "Roadmap Edit").
pub fn diff_changed_concepts(origin: &Framework, modified: &Framework) -> Vec<String> {
    use std::collections::HashMap;

    let origin_by_id: HashMap<&str, &super::roadmap::Concept> =
        origin.concepts().map(|c| (c.concept_id.as_str(), c)).collect();

    let mut changed: Vec<String> = Vec::new();
    for concept in modified.concepts() {
        match origin_by_id.get(concept.concept_id.as_str()) {
            None => changed.push(concept.concept_id.clone()),
            Some(before) => {
                if before.name != concept.name
                    || before.description != concept.description
                    || before.prerequisites != concept.prerequisites
                {
                    changed.push(concept.concept_id.clone());
                }
            }
        }
    }

    let modified_ids: std::collections::HashSet<&str> =
        modified.concepts().map(|c| c.concept_id.as_str()).collect();
    for concept in origin.concepts() {
        if !modified_ids.contains(concept.concept_id.as_str()) {
            changed.push(concept.concept_id.clone());
        }
    }

    changed
}
