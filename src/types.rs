//! Core types: business records, task lifecycle, search requests and snapshots.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::HarvestError;

/// A discovered business, produced bare by the search stage and enriched
/// in place by the detail fetch and the email scrape.
///
/// Identity is the provider's place id and is stable across enrichment
/// steps — later writes target the same record, never a duplicate.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Business {
    /// Stable external place identifier.
    pub id: String,
    pub business_name: String,
    /// The category the provider actually lists the business under.
    pub real_category: String,
    /// The search category this record was discovered through.
    pub category: String,
    pub address: String,
    pub city: String,
    pub state: String,
    pub postal_code: String,
    pub country: String,
    pub phone: String,
    /// Absent until detail enrichment or the website scrape finds one.
    pub email: Option<String>,
    pub website: Option<String>,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub maps_link: String,
    pub details_link: Option<String>,
}

/// Lifecycle state of a single (category, location) task.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum TaskState {
    Pending,
    Processing,
    Completed,
    Failed,
}

impl TaskState {
    /// Whether the task has reached a terminal state.
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Completed | Self::Failed)
    }

    pub fn name(&self) -> &'static str {
        match self {
            Self::Pending => "PENDING",
            Self::Processing => "PROCESSING",
            Self::Completed => "COMPLETED",
            Self::Failed => "FAILED",
        }
    }
}

impl fmt::Display for TaskState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Progress and outcome of one (category, location) task.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskStatus {
    /// Opaque task id, unique per process run.
    pub id: String,
    pub category: String,
    pub location: String,
    pub state: TaskState,
    /// Records appended so far. Monotonically non-decreasing.
    pub processed_items: usize,
    /// Set once at completion, at which point it equals `processed_items`.
    pub total_items: usize,
    /// Failure message, present only for [`TaskState::Failed`].
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

/// A request to discover businesses for every (category, location) pair.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchRequest {
    pub categories: Vec<String>,
    pub locations: Vec<String>,
    /// Forward each enriched record to the upsert store. Defaults to true.
    #[serde(default = "default_save")]
    pub save_to_store: bool,
}

fn default_save() -> bool {
    true
}

impl SearchRequest {
    pub fn new(categories: Vec<String>, locations: Vec<String>) -> Self {
        Self {
            categories,
            locations,
            save_to_store: true,
        }
    }

    /// Validates the request shape before any task is created.
    pub fn validate(&self) -> crate::error::Result<()> {
        if self.categories.iter().all(|c| c.trim().is_empty()) {
            return Err(HarvestError::InvalidRequest(
                "at least one category is required".into(),
            ));
        }
        if self.locations.iter().all(|l| l.trim().is_empty()) {
            return Err(HarvestError::InvalidRequest(
                "at least one location is required".into(),
            ));
        }
        Ok(())
    }
}

/// Aggregate status of the current run, derived from task states.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum RunStatus {
    /// At least one task has not reached a terminal state.
    Processing,
    /// Every known task is Completed or Failed.
    Completed,
}

/// A point-in-time copy of the shared result set.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResultsSnapshot {
    pub businesses: Vec<Business>,
    pub total: usize,
    pub status: RunStatus,
}

/// Recognised export file formats.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExportFormat {
    Csv,
    Excel,
}

impl FromStr for ExportFormat {
    type Err = HarvestError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "csv" => Ok(Self::Csv),
            "xlsx" | "excel" => Ok(Self::Excel),
            other => Err(HarvestError::InvalidFormat(other.to_string())),
        }
    }
}
