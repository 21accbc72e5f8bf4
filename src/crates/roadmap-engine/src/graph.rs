//! Graph Builder & Router (C7): the static node order implied by
//! [`WorkflowConfig`]'s skip flags, and the two router functions named in
//! spec.md §4.7 (`route_after_validation`, `route_after_human_review`).
//!
//! The teacher compiles a `roadmap_core::builder::WorkflowGraph` into a
//! reusable `CompiledGraph` with conditional-edge closures resolved at
//! `compile()` time. This workflow's branching — one validate/edit cycle,
//! one suspend point — is small and fixed enough that the
//! [`crate::executor::Executor`] walks it directly as plain control flow
//! instead of compiling a generic graph; these two functions are exactly
//! the router closures that graph would have held, kept standalone so
//! they can be unit tested without standing up an executor.

use crate::config::WorkflowConfig;
use crate::state::{get_bool, get_i64, RoadmapState};

/// What a router hands back to the executor: the name of the next node, or
/// that the workflow is done.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RouteTarget {
    EditRoadmap,
    HumanReview,
    ContentFanout,
    End,
}

/// After Structure Validation: retry the edit loop if invalid and the
/// retry budget remains, otherwise advance to whichever of Human Review /
/// Content Fan-out / End is next present per config.
pub fn route_after_validation(state: &RoadmapState, config: &WorkflowConfig) -> RouteTarget {
    let is_valid = state
        .get("validation_result")
        .and_then(|v| v.get("is_valid"))
        .and_then(|v| v.as_bool())
        .unwrap_or(true);
    let modification_count = get_i64(state, "modification_count");

    if !is_valid && modification_count < config.max_validation_rounds {
        return RouteTarget::EditRoadmap;
    }
    next_after_validation_stage(config)
}

/// After Human Review: `approved` routes to Content Fan-out (or End if
/// content generation is skipped); rejection routes back into the edit
/// loop.
pub fn route_after_human_review(state: &RoadmapState, config: &WorkflowConfig) -> RouteTarget {
    let approved = get_bool(state, "human_approved").unwrap_or(true);
    if approved {
        if config.skip_content {
            RouteTarget::End
        } else {
            RouteTarget::ContentFanout
        }
    } else {
        RouteTarget::EditRoadmap
    }
}

pub(crate) fn next_after_validation_stage(config: &WorkflowConfig) -> RouteTarget {
    if !config.skip_review {
        RouteTarget::HumanReview
    } else if !config.skip_content {
        RouteTarget::ContentFanout
    } else {
        RouteTarget::End
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn config() -> WorkflowConfig {
        WorkflowConfig::default()
    }

    #[test]
    fn invalid_with_budget_remaining_routes_to_edit() {
        let state = json!({
            "validation_result": {"is_valid": false},
            "modification_count": 0,
        });
        assert_eq!(route_after_validation(&state, &config()), RouteTarget::EditRoadmap);
    }

    #[test]
    fn invalid_with_exhausted_budget_routes_past_edit() {
        let state = json!({
            "validation_result": {"is_valid": false},
            "modification_count": 3,
        });
        assert_eq!(route_after_validation(&state, &config()), RouteTarget::HumanReview);
    }

    #[test]
    fn valid_routes_to_human_review_by_default() {
        let state = json!({"validation_result": {"is_valid": true}, "modification_count": 0});
        assert_eq!(route_after_validation(&state, &config()), RouteTarget::HumanReview);
    }

    #[test]
    fn valid_skips_review_routes_to_content_fanout() {
        let mut cfg = config();
        cfg.skip_review = true;
        let state = json!({"validation_result": {"is_valid": true}, "modification_count": 0});
        assert_eq!(route_after_validation(&state, &cfg), RouteTarget::ContentFanout);
    }

    #[test]
    fn approved_routes_to_content_fanout() {
        let state = json!({"human_approved": true});
        assert_eq!(route_after_human_review(&state, &config()), RouteTarget::ContentFanout);
    }

    #[test]
    fn approved_with_content_skipped_routes_to_end() {
        let mut cfg = config();
        cfg.skip_content = true;
        let state = json!({"human_approved": true});
        assert_eq!(route_after_human_review(&state, &cfg), RouteTarget::End);
    }

    #[test]
    fn rejected_routes_to_edit_roadmap() {
        let state = json!({"human_approved": false});
        assert_eq!(route_after_human_review(&state, &config()), RouteTarget::EditRoadmap);
    }
}
