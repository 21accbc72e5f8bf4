//! In-memory "what step is this task on right now" cache (spec §4.5, §5).
//!
//! This is deliberately NOT durable: it exists so a process answering a
//! status query doesn't have to hit the database for a value that changes
//! every few seconds, and it is fully reconstructible from the checkpoint
//! store on restart. Durable progress lives in `Task.current_step`; this
//! is the hot-path read cache in front of it, the same split
//! `roadmap-logger`'s buffered writer draws between "what tracing prints
//! now" and "what gets flushed to the execution_logs table".

use dashmap::DashMap;

#[derive(Debug, Default)]
pub struct LiveStepCache {
    steps: DashMap<String, String>,
}

impl LiveStepCache {
    pub fn new() -> Self {
        Self { steps: DashMap::new() }
    }

    pub fn set(&self, task_id: &str, step: impl Into<String>) {
        self.steps.insert(task_id.to_string(), step.into());
    }

    pub fn get(&self, task_id: &str) -> Option<String> {
        self.steps.get(task_id).map(|entry| entry.value().clone())
    }

    pub fn clear(&self, task_id: &str) {
        self.steps.remove(task_id);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn set_then_get_round_trips() {
        let cache = LiveStepCache::new();
        cache.set("t1", "curriculum_design");
        assert_eq!(cache.get("t1").as_deref(), Some("curriculum_design"));
    }

    #[test]
    fn clear_removes_entry() {
        let cache = LiveStepCache::new();
        cache.set("t1", "intent_analysis");
        cache.clear("t1");
        assert_eq!(cache.get("t1"), None);
    }
}
