//! Harvest orchestrator: request fan-out, per-task pipelines, queries, export.
//!
//! `initiate_search` expands the request into one task per (category,
//! location) pair and spawns an independent pipeline for each — the caller
//! is never blocked on pipeline completion. Within a task, records are
//! enriched one at a time in arrival order; across tasks, appends to the
//! shared result set interleave freely.

use std::path::PathBuf;
use std::sync::Arc;

use futures::TryStreamExt;

use crate::config::HarvestConfig;
use crate::email::{EmailScraper, EmailSource};
use crate::error::Result;
use crate::export;
use crate::locations;
use crate::places::{PlaceProvider, PlacesClient};
use crate::store::UpsertStore;
use crate::types::{Business, ExportFormat, ResultsSnapshot, SearchRequest, TaskStatus};

use super::registry::{ResultStore, RunId};

/// The search-and-enrichment engine.
///
/// Owns the task registry and the shared result set, and drives one
/// pipeline per (category, location) task against the places provider.
pub struct Harvester {
    store: Arc<ResultStore>,
    provider: Arc<dyn PlaceProvider>,
    email: Arc<dyn EmailSource>,
    persistence: Option<Arc<dyn UpsertStore>>,
    export_dir: PathBuf,
}

impl Harvester {
    /// Build a harvester backed by the real places client and email scraper.
    ///
    /// # Errors
    ///
    /// Returns a configuration or HTTP-client construction error.
    pub fn new(config: &HarvestConfig) -> Result<Self> {
        let provider = Arc::new(PlacesClient::new(config)?);
        let email = Arc::new(EmailScraper::new(config)?);
        Ok(Self {
            store: Arc::new(ResultStore::new()),
            provider,
            email,
            persistence: None,
            export_dir: config.export_dir.clone(),
        })
    }

    /// Build a harvester from injected collaborators.
    pub fn with_collaborators(
        provider: Arc<dyn PlaceProvider>,
        email: Arc<dyn EmailSource>,
        persistence: Option<Arc<dyn UpsertStore>>,
        export_dir: PathBuf,
    ) -> Self {
        Self {
            store: Arc::new(ResultStore::new()),
            provider,
            email,
            persistence,
            export_dir,
        }
    }

    /// Attach an upsert store that records are forwarded to when a
    /// request's persistence flag is set.
    pub fn with_persistence(mut self, store: Arc<dyn UpsertStore>) -> Self {
        self.persistence = Some(store);
        self
    }

    /// Start a new search run.
    ///
    /// Clears all prior tasks and results, expands country locations into
    /// cities, creates one Pending task per (category, expanded location)
    /// pair and spawns its pipeline. Returns immediately with an opaque
    /// run token; progress is queried in aggregate via
    /// [`Harvester::task_statuses`] and [`Harvester::results`].
    ///
    /// # Errors
    ///
    /// Returns [`crate::error::HarvestError::InvalidRequest`] for a
    /// request with no usable categories or locations. No task is created
    /// in that case.
    pub fn initiate_search(&self, request: &SearchRequest) -> Result<String> {
        request.validate()?;

        let run = self.store.begin_run();
        let expanded = locations::expand(&request.locations);
        tracing::info!(
            categories = request.categories.len(),
            locations = expanded.len(),
            original_locations = request.locations.len(),
            "starting search run"
        );

        for category in &request.categories {
            for location in &expanded {
                let Some(task_id) = self.store.create_task(run, category, location) else {
                    // A newer run has already superseded this one.
                    return Ok(uuid::Uuid::new_v4().to_string());
                };
                tokio::spawn(run_pipeline(PipelineContext {
                    store: Arc::clone(&self.store),
                    provider: Arc::clone(&self.provider),
                    email: Arc::clone(&self.email),
                    persistence: request
                        .save_to_store
                        .then(|| self.persistence.clone())
                        .flatten(),
                    run,
                    task_id,
                    category: category.clone(),
                    location: location.clone(),
                }));
            }
        }

        Ok(uuid::Uuid::new_v4().to_string())
    }

    /// Point-in-time copy of every task's status.
    pub fn task_statuses(&self) -> Vec<TaskStatus> {
        self.store.tasks_snapshot()
    }

    /// Point-in-time copy of the result set with its aggregate status.
    pub fn results(&self) -> ResultsSnapshot {
        self.store.results_snapshot()
    }

    /// Export the current result set to a file.
    ///
    /// # Errors
    ///
    /// [`crate::error::HarvestError::InvalidFormat`] for an unrecognised
    /// format name, [`crate::error::HarvestError::EmptyResult`] when no
    /// records exist, or an export I/O failure.
    pub fn export_results(&self, format: &str) -> Result<PathBuf> {
        let format: ExportFormat = format.parse()?;
        let snapshot = self.store.results_snapshot();
        if snapshot.businesses.is_empty() {
            return Err(crate::error::HarvestError::EmptyResult);
        }
        match format {
            ExportFormat::Csv => export::export_to_csv(&snapshot.businesses, &self.export_dir),
            ExportFormat::Excel => export::export_to_excel(&snapshot.businesses, &self.export_dir),
        }
    }
}

/// Everything one task pipeline needs, owned.
struct PipelineContext {
    store: Arc<ResultStore>,
    provider: Arc<dyn PlaceProvider>,
    email: Arc<dyn EmailSource>,
    persistence: Option<Arc<dyn UpsertStore>>,
    run: RunId,
    task_id: String,
    category: String,
    location: String,
}

/// Drive one task: search, enrich each record in arrival order, merge
/// into the shared result set, then settle the task's terminal state.
async fn run_pipeline(ctx: PipelineContext) {
    let task_id = ctx.task_id.clone();
    tracing::debug!(task_id, category = %ctx.category, location = %ctx.location, "task started");
    ctx.store.set_processing(ctx.run, &task_id);

    let mut stream = ctx.provider.search(&ctx.category, &ctx.location);
    loop {
        match stream.try_next().await {
            Ok(Some(record)) => {
                let record = enrich(&ctx, record).await;
                if let Some(persistence) = &ctx.persistence {
                    if let Err(err) = persistence.upsert(&record).await {
                        tracing::warn!(task_id, id = %record.id, error = %err, "upsert failed");
                    }
                }
                ctx.store.record_result(ctx.run, &task_id, record);
            }
            Ok(None) => {
                ctx.store.complete_task(ctx.run, &task_id);
                tracing::info!(task_id, "task completed");
                return;
            }
            Err(err) => {
                // Search-stage failure: terminal for this task only.
                tracing::error!(task_id, error = %err, "task failed");
                ctx.store.fail_task(ctx.run, &task_id, err.to_string());
                return;
            }
        }
    }
}

/// Enrich one bare record: category tags, detail fetch, email scrape.
///
/// Both enrichment stages are best-effort; their failures are logged and
/// the record keeps whatever fields it already has.
async fn enrich(ctx: &PipelineContext, mut record: Business) -> Business {
    record.category = ctx.category.clone();
    record.real_category = ctx.category.clone();

    match ctx.provider.details(&record.id).await {
        Ok(detail) => apply_details(&mut record, detail),
        Err(err) => {
            tracing::warn!(id = %record.id, error = %err, "detail fetch failed, keeping bare record");
        }
    }

    if record.email.is_none() {
        if let Some(website) = record.website.clone().filter(|w| !w.is_empty()) {
            if let Some(email) = ctx.email.extract(&website).await {
                tracing::debug!(id = %record.id, %email, "email scraped from website");
                record.email = Some(email);
            }
        }
    }

    record
}

/// Overwrite a bare record's fields with the detail-fetch result.
fn apply_details(record: &mut Business, detail: Business) {
    record.business_name = detail.business_name;
    record.address = detail.address;
    record.city = detail.city;
    record.state = detail.state;
    record.postal_code = detail.postal_code;
    record.country = detail.country;
    record.phone = detail.phone;
    record.email = detail.email;
    record.website = detail.website;
    record.details_link = detail.details_link;
}
