//! The `Event` payload carried on the bus. Transient — durable history lives
//! in `roadmap-db`'s `ExecutionLogRepository` and the Task/Roadmap tables.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Event {
    Progress {
        task_id: String,
        status: String,
        current_step: String,
    },
    HumanReviewRequired {
        task_id: String,
        roadmap_title: String,
        stage_count: i64,
        concept_count: i64,
    },
    ConceptStart {
        task_id: String,
        concept_id: String,
        content_type: String,
    },
    ConceptComplete {
        task_id: String,
        concept_id: String,
        content_type: String,
    },
    ConceptFailed {
        task_id: String,
        concept_id: String,
        content_type: String,
        reason: String,
    },
    ConceptAllContentComplete {
        task_id: String,
        concept_id: String,
    },
    BatchStart {
        task_id: String,
        batch_index: usize,
        batch_size: usize,
    },
    BatchComplete {
        task_id: String,
        batch_index: usize,
    },
    Completed {
        task_id: String,
    },
    Failed {
        task_id: String,
        reason: String,
    },
    TaskRecovering {
        task_id: String,
    },
    RetryStarted {
        task_id: String,
        concept_ids: Vec<String>,
    },
    RetryCompleted {
        task_id: String,
    },
    Timeout {
        task_id: String,
    },
}

impl Event {
    pub fn task_id(&self) -> &str {
        match self {
            Event::Progress { task_id, .. }
            | Event::HumanReviewRequired { task_id, .. }
            | Event::ConceptStart { task_id, .. }
            | Event::ConceptComplete { task_id, .. }
            | Event::ConceptFailed { task_id, .. }
            | Event::ConceptAllContentComplete { task_id, .. }
            | Event::BatchStart { task_id, .. }
            | Event::BatchComplete { task_id, .. }
            | Event::Completed { task_id }
            | Event::Failed { task_id, .. }
            | Event::TaskRecovering { task_id }
            | Event::RetryStarted { task_id, .. }
            | Event::RetryCompleted { task_id }
            | Event::Timeout { task_id } => task_id,
        }
    }

    /// A terminal event closes the subscriber stream (spec §4.3).
    pub fn is_terminal(&self) -> bool {
        matches!(self, Event::Completed { .. } | Event::Failed { .. } | Event::Timeout { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn terminal_events_are_exactly_completed_failed_timeout() {
        assert!(Event::Completed { task_id: "t1".into() }.is_terminal());
        assert!(Event::Failed { task_id: "t1".into(), reason: "x".into() }.is_terminal());
        assert!(Event::Timeout { task_id: "t1".into() }.is_terminal());
        assert!(!Event::Progress { task_id: "t1".into(), status: "processing".into(), current_step: "intent".into() }.is_terminal());
    }

    #[test]
    fn serializes_with_type_tag() {
        let event = Event::ConceptFailed {
            task_id: "t1".into(),
            concept_id: "c1".into(),
            content_type: "tutorial".into(),
            reason: "timeout".into(),
        };
        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["type"], "concept_failed");
        assert_eq!(json["concept_id"], "c1");
    }
}
