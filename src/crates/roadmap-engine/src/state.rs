//! `RoadmapState` channel schema (spec §3 "Workflow State (channel values)").
//!
//! Mirrors `roadmap-core`'s JSON-first state representation: the whole
//! state is a `serde_json::Value` object, and a node's return value (a
//! `StateDelta`) is itself a partial object carrying only the channels it
//! touched. The [`StateSchema`](roadmap_core::state::StateSchema) applies
//! each channel's reducer when folding a delta into the running state,
//! generalized from `langgraph-core::state`'s `OverwriteReducer` /
//! `MergeReducer` / `AppendReducer` triad to this workflow's channel table.

use roadmap_core::state::{AppendReducer, MergeReducer, OverwriteReducer, StateSchema};
use serde_json::{json, Value};

/// A node's state update: a partial JSON object naming only the channels it
/// wrote (spec §3 reducer invariants — a merge-channel delta carries only
/// new entries, an append-channel delta only new items).
pub type StateDelta = Value;

/// The full workflow state, always a JSON object keyed by channel name.
pub type RoadmapState = Value;

const SCALAR_CHANNELS: &[&str] = &[
    "user_request",
    "task_id",
    "roadmap_id",
    "intent_analysis",
    "roadmap_framework",
    "validation_result",
    "edit_plan",
    "user_feedback",
    "edit_source",
    "validation_round",
    "modification_count",
    "current_step",
    "human_approved",
    "review_feedback_id",
    "edit_plan_record_id",
];

const MERGE_CHANNELS: &[&str] = &["tutorial_refs", "resource_refs", "quiz_refs"];

const APPEND_CHANNELS: &[&str] = &["failed_concepts", "execution_history"];

/// Builds the channel schema described in spec.md §3. Unknown channels fall
/// back to overwrite (the same default `StateSchema::apply` uses when a
/// field has no registered reducer).
pub fn build_schema() -> StateSchema {
    let mut schema = StateSchema::new().with_default_reducer(Box::new(OverwriteReducer));

    for channel in SCALAR_CHANNELS {
        schema.add_field(*channel, Box::new(OverwriteReducer));
    }
    for channel in MERGE_CHANNELS {
        schema.add_field(*channel, Box::new(MergeReducer));
    }
    for channel in APPEND_CHANNELS {
        schema.add_field(*channel, Box::new(AppendReducer));
    }

    schema
}

/// The empty initial state for a freshly created task, seeded with the
/// user's request (spec §4.8 "Build an initial RoadmapState").
pub fn initial_state(task_id: &str, user_request: &Value) -> RoadmapState {
    json!({
        "task_id": task_id,
        "user_request": user_request,
        "tutorial_refs": {},
        "resource_refs": {},
        "quiz_refs": {},
        "failed_concepts": [],
        "execution_history": [],
        "validation_round": 0,
        "modification_count": 0,
    })
}

pub fn get_str<'a>(state: &'a Value, field: &str) -> Option<&'a str> {
    state.get(field).and_then(Value::as_str)
}

pub fn get_i64(state: &Value, field: &str) -> i64 {
    state.get(field).and_then(Value::as_i64).unwrap_or(0)
}

pub fn get_bool(state: &Value, field: &str) -> Option<bool> {
    state.get(field).and_then(Value::as_bool)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn scalar_channel_overwrites() {
        let schema = build_schema();
        let mut state = json!({"current_step": "intent_analysis"});
        schema.apply(&mut state, &json!({"current_step": "curriculum_design"})).unwrap();
        assert_eq!(state["current_step"], "curriculum_design");
    }

    #[test]
    fn merge_channel_unions_keys() {
        let schema = build_schema();
        let mut state = json!({"tutorial_refs": {"c1": "ref1"}});
        schema.apply(&mut state, &json!({"tutorial_refs": {"c2": "ref2"}})).unwrap();
        assert_eq!(state["tutorial_refs"]["c1"], "ref1");
        assert_eq!(state["tutorial_refs"]["c2"], "ref2");
    }

    #[test]
    fn append_channel_accumulates() {
        let schema = build_schema();
        let mut state = json!({"execution_history": ["intent_analysis"]});
        schema.apply(&mut state, &json!({"execution_history": ["curriculum_design"]})).unwrap();
        assert_eq!(state["execution_history"], json!(["intent_analysis", "curriculum_design"]));
    }
}
