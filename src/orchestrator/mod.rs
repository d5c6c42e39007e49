//! Search-and-enrichment orchestration: task fan-out, shared registry, export.
//!
//! This module owns the task registry and the shared result set, spawns one
//! independent pipeline per (category, location) pair, and answers status,
//! result and export queries with owned snapshots.

pub mod engine;
pub mod registry;

pub use engine::Harvester;
pub use registry::ResultStore;
