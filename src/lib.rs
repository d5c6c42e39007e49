//! # bizharvest
//!
//! Business discovery and enrichment engine driven by a places-search API.
//!
//! Given a set of categories and locations, bizharvest fans the request out
//! into one independent task per (category, location) pair, drives each task
//! through a multi-stage pipeline — paginated text search, per-item detail
//! fetch, best-effort email discovery from the business website — and merges
//! everything into a shared, concurrently-readable result set that can be
//! queried while tasks are still running and exported to CSV or Excel.
//!
//! ## Design
//!
//! - One fire-and-forget pipeline per task; the initiating call never blocks
//! - Pagination hidden behind a single logical record stream per search,
//!   with the provider's mandatory inter-page delay and retry policy inside
//! - Enrichment is strictly best-effort: a failed detail fetch or email
//!   scrape is logged and the record keeps its bare fields
//! - The task registry and result set live behind one lock and only hand
//!   out owned snapshots; a new search atomically supersedes the old run
//!
//! ## Example
//!
//! ```no_run
//! # async fn example() -> bizharvest::Result<()> {
//! let config = bizharvest::HarvestConfig::new("places-api-key");
//! let harvester = bizharvest::Harvester::new(&config)?;
//!
//! let request = bizharvest::SearchRequest::new(
//!     vec!["dentist".into()],
//!     vec!["Turkey".into()],
//! );
//! harvester.initiate_search(&request)?;
//!
//! // Poll progress while pipelines run.
//! for task in harvester.task_statuses() {
//!     println!("{} {} in {}: {}", task.id, task.category, task.location, task.state);
//! }
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod email;
pub mod error;
pub mod export;
pub mod http;
pub mod locations;
pub mod orchestrator;
pub mod places;
pub mod store;
pub mod types;

pub use config::HarvestConfig;
pub use error::{HarvestError, Result};
pub use orchestrator::Harvester;
pub use types::{
    Business, ExportFormat, ResultsSnapshot, RunStatus, SearchRequest, TaskState, TaskStatus,
};
