//! Per-task event bus for workflow progress notifications.
//!
//! Fire-and-forget and best-effort: this bus is not durable history. The
//! source of truth is `roadmap-db`'s repositories and execution log; a
//! client that misses events because it connected late must reconcile by
//! reading persisted state instead.
//!
//! # Modules
//! - [`event`] - the [`event::Event`] payload enum
//! - [`bus`] - [`bus::EventBus`] and its subscriber stream types

pub mod bus;
pub mod event;

pub use bus::{EventBus, EventStream, TimedEventStream};
pub use event::Event;
