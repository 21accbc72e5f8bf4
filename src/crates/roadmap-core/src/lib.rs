//! # roadmap-core - State schema for the roadmap workflow engine
//!
//! Carries over the teacher's `StateSchema` / `Reducer` layer from its
//! full Pregel-based graph execution framework: a typed description of how
//! concurrent writes to the same state field are combined.
//!
//! [`roadmap-engine`](../roadmap_engine/index.html) uses this to declare,
//! per field, whether a later write overwrites, appends to, merges into,
//! or sums with an earlier one (see [`state::StateSchema`]), then drives
//! its own step-by-step execution on top of that schema rather than
//! compiling a graph through this crate.
//!
//! ## Example
//!
//! ```
//! use roadmap_core::state::{StateSchema, AppendReducer, OverwriteReducer};
//!
//! let mut schema = StateSchema::new();
//! schema.add_field("execution_history", Box::new(AppendReducer));
//! schema.add_field("current_step", Box::new(OverwriteReducer));
//! ```

pub mod state;

pub use state::{AppendReducer, MergeReducer, OverwriteReducer, Reducer, StateError, StateSchema, SumReducer};
