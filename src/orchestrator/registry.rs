//! Shared task registry and result set, guarded by a single lock.
//!
//! Many concurrent pipelines mutate the registry while status and results
//! queries read it, so the whole structure lives behind one [`Mutex`] and
//! only ever hands out owned snapshots. Starting a new run clears both the
//! task map and the result list in one critical section and bumps a run
//! generation; every later mutation carries the caller's generation and is
//! dropped when superseded. A query therefore sees one run's data in full,
//! never a mix of two runs.

use std::collections::HashMap;
use std::sync::Mutex;

use crate::types::{Business, ResultsSnapshot, RunStatus, TaskState, TaskStatus};

/// Identifies the search run a pipeline belongs to.
pub type RunId = u64;

/// Concurrently-shared registry of tasks and accumulated results.
#[derive(Default)]
pub struct ResultStore {
    inner: Mutex<Registry>,
}

#[derive(Default)]
struct Registry {
    run: RunId,
    next_task_id: u64,
    tasks: HashMap<String, TaskStatus>,
    results: Vec<Business>,
}

impl ResultStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Registry> {
        self.inner.lock().expect("registry lock poisoned")
    }

    /// Atomically discard all tasks and results and start a new run.
    ///
    /// Pipelines still running for the previous run keep their old run id;
    /// their later mutations are silently dropped.
    pub fn begin_run(&self) -> RunId {
        let mut registry = self.lock();
        registry.run += 1;
        registry.tasks.clear();
        registry.results.clear();
        registry.run
    }

    /// Register a Pending task for the given run, returning its id.
    ///
    /// Returns `None` when the run has been superseded.
    pub fn create_task(&self, run: RunId, category: &str, location: &str) -> Option<String> {
        let mut registry = self.lock();
        if registry.run != run {
            return None;
        }
        registry.next_task_id += 1;
        let id = registry.next_task_id.to_string();
        registry.tasks.insert(
            id.clone(),
            TaskStatus {
                id: id.clone(),
                category: category.to_owned(),
                location: location.to_owned(),
                state: TaskState::Pending,
                processed_items: 0,
                total_items: 0,
                message: None,
            },
        );
        Some(id)
    }

    /// Transition a task to Processing.
    pub fn set_processing(&self, run: RunId, task_id: &str) {
        let mut registry = self.lock();
        if registry.run != run {
            return;
        }
        if let Some(task) = registry.tasks.get_mut(task_id) {
            task.state = TaskState::Processing;
        }
    }

    /// Append an enriched record and bump the owning task's progress
    /// counter in one critical section.
    pub fn record_result(&self, run: RunId, task_id: &str, record: Business) {
        let mut registry = self.lock();
        if registry.run != run {
            tracing::debug!(task_id, "dropping record from superseded run");
            return;
        }
        registry.results.push(record);
        if let Some(task) = registry.tasks.get_mut(task_id) {
            task.processed_items += 1;
        }
    }

    /// Transition a task to Completed, fixing `total_items` at the number
    /// of records it processed.
    pub fn complete_task(&self, run: RunId, task_id: &str) {
        let mut registry = self.lock();
        if registry.run != run {
            return;
        }
        if let Some(task) = registry.tasks.get_mut(task_id) {
            task.state = TaskState::Completed;
            task.total_items = task.processed_items;
        }
    }

    /// Transition a task to Failed, recording the failure message.
    pub fn fail_task(&self, run: RunId, task_id: &str, message: String) {
        let mut registry = self.lock();
        if registry.run != run {
            return;
        }
        if let Some(task) = registry.tasks.get_mut(task_id) {
            task.state = TaskState::Failed;
            task.message = Some(message);
        }
    }

    /// Owned point-in-time copy of every task, sorted by numeric id.
    pub fn tasks_snapshot(&self) -> Vec<TaskStatus> {
        let registry = self.lock();
        let mut tasks: Vec<TaskStatus> = registry.tasks.values().cloned().collect();
        tasks.sort_by_key(|t| t.id.parse::<u64>().unwrap_or(u64::MAX));
        tasks
    }

    /// Owned point-in-time copy of the result set with its aggregate status.
    ///
    /// The status is Completed exactly when every known task is terminal
    /// (vacuously so before any search has been initiated).
    pub fn results_snapshot(&self) -> ResultsSnapshot {
        let registry = self.lock();
        let all_terminal = registry.tasks.values().all(|t| t.state.is_terminal());
        ResultsSnapshot {
            businesses: registry.results.clone(),
            total: registry.results.len(),
            status: if all_terminal {
                RunStatus::Completed
            } else {
                RunStatus::Processing
            },
        }
    }
}
