//! Workflow configuration: feature flags and tunables loaded from TOML
//! with environment overrides, the same layering `roadmap-worker`'s
//! process config uses (env vars win, so an operator can flip a flag
//! without touching the checked-in file).

use serde::{Deserialize, Serialize};
use std::env;

fn default_max_validation_rounds() -> u32 {
    3
}
fn default_max_edit_rounds() -> u32 {
    2
}
fn default_parallel_concept_limit() -> usize {
    4
}
fn default_fanout_failure_ratio() -> f64 {
    0.5
}
fn default_true() -> bool {
    true
}

/// Tunables for one run of the curriculum workflow (spec §4.5, §4.10,
/// §5). Every field has a default so a worker can start from an empty
/// `WorkflowConfig::default()` and override only what the deployment
/// needs.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct WorkflowConfig {
    /// Skip structural validation / edit loop entirely (testing / trusted
    /// curriculum sources only).
    pub skip_validation: bool,
    /// Skip the human-in-the-loop review suspend point.
    pub skip_review: bool,
    /// Skip the content fan-out stage (intent + curriculum + validation
    /// only; used by integration tests that don't want to exercise agent
    /// fan-out).
    pub skip_content: bool,
    /// Maximum number of validation/edit retries before the workflow
    /// gives up and surfaces the last validation result as-is.
    #[serde(default = "default_max_validation_rounds")]
    pub max_validation_rounds: u32,
    /// Maximum number of edit rounds driven by human review feedback.
    #[serde(default = "default_max_edit_rounds")]
    pub max_edit_rounds: u32,
    /// Upper bound on concepts generating content concurrently.
    #[serde(default = "default_parallel_concept_limit")]
    pub parallel_concept_limit: usize,
    /// Fraction of attempted concepts that must fail before the fan-out
    /// scheduler aborts the remaining batches (spec §4.10 step 9).
    #[serde(default = "default_fanout_failure_ratio")]
    pub fanout_failure_ratio: f64,
    /// Generate a cover image per concept alongside tutorial/resources/quiz.
    #[serde(default = "default_true")]
    pub generate_cover_images: bool,
}

impl Default for WorkflowConfig {
    fn default() -> Self {
        Self {
            skip_validation: false,
            skip_review: false,
            skip_content: false,
            max_validation_rounds: default_max_validation_rounds(),
            max_edit_rounds: default_max_edit_rounds(),
            parallel_concept_limit: default_parallel_concept_limit(),
            fanout_failure_ratio: default_fanout_failure_ratio(),
            generate_cover_images: default_true(),
        }
    }
}

impl WorkflowConfig {
    /// Loads from a TOML file if present, then applies `ROADMAP_*` env
    /// overrides for the boolean flags (the knobs an operator is most
    /// likely to flip without a redeploy).
    pub fn load(path: Option<&str>) -> anyhow::Result<Self> {
        let mut cfg = match path {
            Some(p) if std::path::Path::new(p).exists() => {
                let text = std::fs::read_to_string(p)?;
                toml::from_str(&text)?
            }
            _ => Self::default(),
        };
        cfg.apply_env_overrides();
        Ok(cfg)
    }

    fn apply_env_overrides(&mut self) {
        if let Ok(v) = env::var("ROADMAP_SKIP_VALIDATION") {
            self.skip_validation = parse_bool(&v, self.skip_validation);
        }
        if let Ok(v) = env::var("ROADMAP_SKIP_REVIEW") {
            self.skip_review = parse_bool(&v, self.skip_review);
        }
        if let Ok(v) = env::var("ROADMAP_SKIP_CONTENT") {
            self.skip_content = parse_bool(&v, self.skip_content);
        }
        if let Ok(v) = env::var("ROADMAP_PARALLEL_CONCEPT_LIMIT") {
            if let Ok(n) = v.parse() {
                self.parallel_concept_limit = n;
            }
        }
    }
}

fn parse_bool(raw: &str, fallback: bool) -> bool {
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => true,
        "0" | "false" | "no" | "off" => false,
        _ => fallback,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_sane() {
        let cfg = WorkflowConfig::default();
        assert!(!cfg.skip_validation);
        assert_eq!(cfg.max_validation_rounds, 3);
        assert!(cfg.fanout_failure_ratio > 0.0 && cfg.fanout_failure_ratio <= 1.0);
    }

    #[test]
    fn env_override_flips_flag() {
        std::env::set_var("ROADMAP_SKIP_REVIEW", "true");
        let mut cfg = WorkflowConfig::default();
        cfg.apply_env_overrides();
        std::env::remove_var("ROADMAP_SKIP_REVIEW");
        assert!(cfg.skip_review);
    }
}
