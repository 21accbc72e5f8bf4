//! Typed metadata repositories for the roadmap workflow engine.
//!
//! This crate owns everything the workflow reads and writes that is *not*
//! graph checkpoint state: tasks, roadmaps, generated content, validation
//! history, edit history, human review feedback, and execution logs. State
//! that travels through the Pregel loop lives in `roadmap-checkpoint`
//! instead; this crate is its sibling, sized for larger connection pools
//! since content fan-out bursts many concurrent writers at once.
//!
//! # Modules
//! - [`connection`] - pool construction and migration bootstrap
//! - [`error`] - [`error::DbError`] and conversions from [`sqlx::Error`]
//! - [`models`] - row types and their JSON-column accessors
//! - [`repositories`] - one unit-struct repository per entity

pub mod connection;
pub mod error;
pub mod models;
pub mod repositories;

pub use connection::{DbPool, MetadataDatabase};
pub use error::{DbError, DbResult};
