//! Durable, buffered execution logger for the roadmap workflow engine.
//!
//! This is a *domain* log distinct from process-level `tracing`: it records
//! categorized, per-task workflow steps and agent outputs durably via
//! `roadmap-db`, while each call also emits a `tracing` event so operators
//! still see real-time process logs.

pub mod logger;

pub use logger::{ExecutionLogger, LogFields};
pub use roadmap_db::models::{LogCategory, LogLevel};
