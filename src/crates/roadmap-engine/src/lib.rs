//! Durable multi-agent workflow engine for generating personalized learning
//! roadmaps: state channels and reducers (C5 state model), the workflow
//! brain that owns checkpointing/logging/events (C5), one runner per graph
//! node (C6), the router functions between them (C7), the executor that
//! walks the graph (C8), and the recovery manager that resumes interrupted
//! tasks on worker restart (C9).

pub mod brain;
pub mod config;
pub mod error;
pub mod executor;
pub mod graph;
mod live_step;
pub mod recovery;
pub mod runners;
pub mod state;

pub use brain::{NodeContext, NodeExecutionGuard, WorkflowBrain};
pub use config::WorkflowConfig;
pub use error::{EngineError, Result, SuspendPayload};
pub use executor::{Agents, Executor};
pub use recovery::RecoveryManager;
