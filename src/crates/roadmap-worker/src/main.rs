//! Standalone worker process: opens the metadata and checkpoint pools,
//! recovers any task left `processing` by a previous crash, then stays up
//! running a periodic recovery sweep so a worker restart never strands a
//! task in `processing` for longer than the recovery window (spec §4.11).
//!
//! New work enters through [`roadmap_engine::Executor::execute`], called
//! directly by whatever process accepts `start_workflow` requests — no
//! HTTP/WebSocket surface lives in this crate (spec §1, §12), so this
//! binary only demonstrates wiring the engine into a long-running process,
//! not a request-handling one.

mod agents;
mod config;

use std::sync::Arc;
use std::time::Duration;

use roadmap_checkpoint::SqliteCheckpointSaver;
use roadmap_db::connection::MetadataDatabase;
use roadmap_db::repositories::RetentionSweeper;
use roadmap_events::EventBus;
use roadmap_logger::ExecutionLogger;
use roadmap_engine::{Executor, RecoveryManager, WorkflowBrain, WorkflowConfig};

use crate::config::ProcessConfig;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let rust_log = std::env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string());
    tracing_subscriber::fmt().with_env_filter(rust_log).init();

    let process_config = ProcessConfig::from_env();

    tracing::info!(url = %process_config.metadata_database_url, "connecting metadata database");
    let metadata_db = MetadataDatabase::connect(&process_config.metadata_database_url).await?;
    metadata_db.run_migrations().await?;

    tracing::info!(url = %process_config.checkpoint_database_url, "connecting checkpoint database");
    let checkpoints = SqliteCheckpointSaver::connect(&process_config.checkpoint_database_url).await?;

    let workflow_config = WorkflowConfig::load(process_config.workflow_config_path.as_deref())?;
    tracing::info!(?workflow_config, "workflow config loaded");

    let pool = metadata_db.pool().clone();
    let events = Arc::new(EventBus::new());
    let logger = Arc::new(ExecutionLogger::new(pool.clone()));

    let brain = Arc::new(WorkflowBrain::new(
        pool,
        Arc::new(checkpoints),
        events,
        logger,
        workflow_config,
    ));
    let executor = Executor::new(brain.clone(), agents::placeholder_agents());

    tracing::info!("running startup recovery sweep");
    let report = RecoveryManager::new(&brain, &executor).recover_interrupted().await?;
    tracing::info!(resumed = report.resumed, abandoned = report.abandoned, "recovery sweep complete");

    let mut ticker = tokio::time::interval(Duration::from_secs(process_config.recovery_sweep_interval_secs));
    loop {
        ticker.tick().await;
        let report = RecoveryManager::new(&brain, &executor).recover_interrupted().await?;
        if report.resumed > 0 || report.abandoned > 0 {
            tracing::info!(resumed = report.resumed, abandoned = report.abandoned, "periodic recovery sweep");
        }

        let purged = RetentionSweeper::sweep(brain.pool(), chrono::Duration::days(process_config.retention_days))
            .await?;
        if purged > 0 {
            tracing::info!(purged, "retention sweep removed soft-deleted roadmaps");
        }
    }
}
