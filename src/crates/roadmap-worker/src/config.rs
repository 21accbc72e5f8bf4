//! Process-level configuration: database locations and the workflow
//! tunables layered on top of them. Mirrors the teacher's
//! `orchestrator-server` binary's env-var-with-defaults style, minus the
//! HTTP listen address (no HTTP surface here, spec §1 non-goal).

use std::env;

pub struct ProcessConfig {
    pub metadata_database_url: String,
    pub checkpoint_database_url: String,
    pub workflow_config_path: Option<String>,
    pub recovery_sweep_interval_secs: u64,
    pub retention_days: i64,
}

impl ProcessConfig {
    pub fn from_env() -> Self {
        Self {
            metadata_database_url: env::var("ROADMAP_DATABASE_URL")
                .unwrap_or_else(|_| "sqlite://roadmap.db?mode=rwc".to_string()),
            checkpoint_database_url: env::var("ROADMAP_CHECKPOINT_DATABASE_URL")
                .unwrap_or_else(|_| "sqlite://roadmap_checkpoints.db?mode=rwc".to_string()),
            workflow_config_path: env::var("ROADMAP_WORKFLOW_CONFIG").ok(),
            recovery_sweep_interval_secs: env::var("ROADMAP_RECOVERY_SWEEP_SECS")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(300),
            retention_days: env::var("ROADMAP_RETENTION_DAYS")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(30),
        }
    }
}
