//! Integration tests for the orchestration engine.
//!
//! These tests drive the full per-task pipeline (search → detail → email
//! scrape → merge) through mock collaborators at the provider and scraper
//! seams, so they exercise fan-out, progress accounting, failure isolation
//! and run supersession without any network.

use std::path::PathBuf;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use futures::stream::{self, BoxStream};
use futures::StreamExt;

use bizharvest::email::EmailSource;
use bizharvest::places::PlaceProvider;
use bizharvest::store::{MemoryStore, UpsertStore};
use bizharvest::{
    Business, Harvester, HarvestError, Result, RunStatus, SearchRequest, TaskState,
};

/// Provider yielding a fixed number of bare records per search, with an
/// optional poisoned location whose search fails outright.
struct MockProvider {
    items_per_task: usize,
    fail_location: Option<String>,
    detail_email: Option<String>,
    fail_details: bool,
    detail_calls: AtomicUsize,
}

impl MockProvider {
    fn new(items_per_task: usize) -> Self {
        Self {
            items_per_task,
            fail_location: None,
            detail_email: None,
            fail_details: false,
            detail_calls: AtomicUsize::new(0),
        }
    }
}

#[async_trait]
impl PlaceProvider for MockProvider {
    fn search(&self, category: &str, location: &str) -> BoxStream<'static, Result<Business>> {
        if self.fail_location.as_deref() == Some(location) {
            return stream::iter(vec![Err(HarvestError::RequestDenied(
                "bad key".into(),
            ))])
            .boxed();
        }
        let items: Vec<Result<Business>> = (0..self.items_per_task)
            .map(|i| {
                Ok(Business {
                    id: format!("{category}-{location}-{i}"),
                    business_name: format!("Bare {i}"),
                    website: Some(format!("https://biz-{i}.example")),
                    ..Default::default()
                })
            })
            .collect();
        stream::iter(items).boxed()
    }

    async fn details(&self, place_id: &str) -> Result<Business> {
        self.detail_calls.fetch_add(1, Ordering::SeqCst);
        if self.fail_details {
            return Err(HarvestError::Upstream("NOT_FOUND".into()));
        }
        Ok(Business {
            id: place_id.to_owned(),
            business_name: format!("Detailed {place_id}"),
            city: "Springfield".into(),
            phone: "+1 555 0100".into(),
            email: self.detail_email.clone(),
            website: Some(format!("https://{place_id}.example")),
            ..Default::default()
        })
    }
}

/// Email source returning a fixed address and counting invocations.
struct MockEmailSource {
    email: Option<String>,
    calls: AtomicUsize,
}

impl MockEmailSource {
    fn none() -> Self {
        Self {
            email: None,
            calls: AtomicUsize::new(0),
        }
    }

    fn some(email: &str) -> Self {
        Self {
            email: Some(email.to_owned()),
            calls: AtomicUsize::new(0),
        }
    }
}

#[async_trait]
impl EmailSource for MockEmailSource {
    async fn extract(&self, _website: &str) -> Option<String> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.email.clone()
    }
}

fn harvester(provider: Arc<MockProvider>, email: Arc<MockEmailSource>) -> Harvester {
    Harvester::with_collaborators(provider, email, None, PathBuf::from("exports"))
}

/// Poll until every task of the current run reaches a terminal state.
async fn wait_until_settled(harvester: &Harvester) {
    for _ in 0..500 {
        if harvester.results().status == RunStatus::Completed {
            return;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    panic!("tasks did not reach a terminal state in time");
}

#[tokio::test]
async fn creates_one_task_per_category_location_pair() {
    let harvester = harvester(
        Arc::new(MockProvider::new(0)),
        Arc::new(MockEmailSource::none()),
    );
    let request = SearchRequest::new(
        vec!["cafe".into(), "dentist".into()],
        vec!["Berlin".into(), "Hamburg".into(), "Munich".into()],
    );

    let token = harvester.initiate_search(&request).expect("initiated");
    assert!(!token.is_empty());

    let tasks = harvester.task_statuses();
    assert_eq!(tasks.len(), 6);

    let mut ids: Vec<&str> = tasks.iter().map(|t| t.id.as_str()).collect();
    ids.sort_unstable();
    ids.dedup();
    assert_eq!(ids.len(), 6, "task ids must be unique");

    wait_until_settled(&harvester).await;
}

#[tokio::test]
async fn country_location_fans_out_into_cities() {
    let harvester = harvester(
        Arc::new(MockProvider::new(0)),
        Arc::new(MockEmailSource::none()),
    );
    let request = SearchRequest::new(vec!["dentist".into()], vec!["Turkey".into()]);

    harvester.initiate_search(&request).expect("initiated");
    let tasks = harvester.task_statuses();
    assert_eq!(tasks.len(), 81);
    assert!(tasks.iter().any(|t| t.location == "Ankara"));
    assert!(tasks.iter().all(|t| t.location != "Turkey"));

    wait_until_settled(&harvester).await;
}

#[tokio::test]
async fn pipeline_enriches_counts_and_completes() {
    let provider = Arc::new(MockProvider::new(3));
    let email = Arc::new(MockEmailSource::some("scraped@biz.example"));
    let harvester = harvester(Arc::clone(&provider), Arc::clone(&email));

    let request = SearchRequest::new(vec!["cafe".into()], vec!["Berlin".into()]);
    harvester.initiate_search(&request).expect("initiated");
    wait_until_settled(&harvester).await;

    let tasks = harvester.task_statuses();
    assert_eq!(tasks.len(), 1);
    let task = &tasks[0];
    assert_eq!(task.state, TaskState::Completed);
    assert_eq!(task.processed_items, 3);
    assert_eq!(task.total_items, 3);
    assert!(task.message.is_none());

    let snapshot = harvester.results();
    assert_eq!(snapshot.total, 3);
    for record in &snapshot.businesses {
        assert_eq!(record.category, "cafe");
        assert_eq!(record.real_category, "cafe");
        assert!(record.business_name.starts_with("Detailed"));
        assert_eq!(record.city, "Springfield");
        // Details had no email, so the website scrape filled it in.
        assert_eq!(record.email.as_deref(), Some("scraped@biz.example"));
    }
    assert_eq!(provider.detail_calls.load(Ordering::SeqCst), 3);
    assert_eq!(email.calls.load(Ordering::SeqCst), 3);
}

#[tokio::test]
async fn scrape_skipped_when_details_already_carry_email() {
    let provider = Arc::new(MockProvider {
        detail_email: Some("listed@biz.example".into()),
        ..MockProvider::new(2)
    });
    let email = Arc::new(MockEmailSource::some("scraped@biz.example"));
    let harvester = harvester(Arc::clone(&provider), Arc::clone(&email));

    harvester
        .initiate_search(&SearchRequest::new(
            vec!["cafe".into()],
            vec!["Berlin".into()],
        ))
        .expect("initiated");
    wait_until_settled(&harvester).await;

    let snapshot = harvester.results();
    assert!(snapshot
        .businesses
        .iter()
        .all(|r| r.email.as_deref() == Some("listed@biz.example")));
    assert_eq!(email.calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn detail_failure_keeps_bare_record_and_completes_task() {
    let provider = Arc::new(MockProvider {
        fail_details: true,
        ..MockProvider::new(2)
    });
    let harvester = harvester(provider, Arc::new(MockEmailSource::none()));

    harvester
        .initiate_search(&SearchRequest::new(
            vec!["cafe".into()],
            vec!["Berlin".into()],
        ))
        .expect("initiated");
    wait_until_settled(&harvester).await;

    let task = &harvester.task_statuses()[0];
    assert_eq!(task.state, TaskState::Completed);
    assert_eq!(task.processed_items, 2);

    let snapshot = harvester.results();
    assert_eq!(snapshot.total, 2);
    // Per-item enrichment failure is contained: bare fields survive.
    assert!(snapshot
        .businesses
        .iter()
        .all(|r| r.business_name.starts_with("Bare")));
}

#[tokio::test]
async fn search_failure_is_contained_to_its_task() {
    let provider = Arc::new(MockProvider {
        fail_location: Some("Badtown".into()),
        ..MockProvider::new(2)
    });
    let harvester = harvester(provider, Arc::new(MockEmailSource::none()));

    harvester
        .initiate_search(&SearchRequest::new(
            vec!["cafe".into()],
            vec!["Berlin".into(), "Badtown".into()],
        ))
        .expect("initiated");
    wait_until_settled(&harvester).await;

    let tasks = harvester.task_statuses();
    let failed = tasks
        .iter()
        .find(|t| t.location == "Badtown")
        .expect("failed task present");
    assert_eq!(failed.state, TaskState::Failed);
    assert!(failed
        .message
        .as_deref()
        .expect("failure message")
        .contains("bad key"));

    let completed = tasks
        .iter()
        .find(|t| t.location == "Berlin")
        .expect("healthy task present");
    assert_eq!(completed.state, TaskState::Completed);
    assert_eq!(completed.processed_items, 2);

    // Only the healthy task's records made it into the result set.
    assert_eq!(harvester.results().total, 2);
}

#[tokio::test]
async fn new_search_supersedes_previous_run() {
    let harvester = harvester(
        Arc::new(MockProvider::new(2)),
        Arc::new(MockEmailSource::none()),
    );

    harvester
        .initiate_search(&SearchRequest::new(
            vec!["cafe".into()],
            vec!["Berlin".into()],
        ))
        .expect("first run");
    wait_until_settled(&harvester).await;
    assert_eq!(harvester.results().total, 2);

    harvester
        .initiate_search(&SearchRequest::new(
            vec!["dentist".into()],
            vec!["Munich".into()],
        ))
        .expect("second run");
    wait_until_settled(&harvester).await;

    let tasks = harvester.task_statuses();
    assert_eq!(tasks.len(), 1);
    assert_eq!(tasks[0].category, "dentist");

    let snapshot = harvester.results();
    assert_eq!(snapshot.total, 2);
    assert!(snapshot
        .businesses
        .iter()
        .all(|r| r.category == "dentist"),
        "no records from the superseded run may remain");
}

#[tokio::test]
async fn persistence_flag_controls_upsert_forwarding() {
    let store = Arc::new(MemoryStore::new());
    let harvester = Harvester::with_collaborators(
        Arc::new(MockProvider::new(2)),
        Arc::new(MockEmailSource::none()),
        Some(Arc::clone(&store) as Arc<dyn UpsertStore>),
        PathBuf::from("exports"),
    );

    let mut request = SearchRequest::new(vec!["cafe".into()], vec!["Berlin".into()]);
    harvester.initiate_search(&request).expect("initiated");
    wait_until_settled(&harvester).await;
    assert_eq!(store.len(), 2);

    request.save_to_store = false;
    request.categories = vec!["dentist".into()];
    harvester.initiate_search(&request).expect("initiated");
    wait_until_settled(&harvester).await;
    // Still only the first run's records: the flag was off this time.
    assert_eq!(store.len(), 2);
}

#[tokio::test]
async fn invalid_request_creates_no_tasks() {
    let harvester = harvester(
        Arc::new(MockProvider::new(1)),
        Arc::new(MockEmailSource::none()),
    );
    let request = SearchRequest::new(vec![], vec!["Berlin".into()]);

    let err = harvester.initiate_search(&request).unwrap_err();
    assert!(matches!(err, HarvestError::InvalidRequest(_)));
    assert!(harvester.task_statuses().is_empty());
}

#[tokio::test]
async fn export_fails_on_empty_result_set_regardless_of_format() {
    let harvester = harvester(
        Arc::new(MockProvider::new(0)),
        Arc::new(MockEmailSource::none()),
    );
    assert!(matches!(
        harvester.export_results("csv").unwrap_err(),
        HarvestError::EmptyResult
    ));
    assert!(matches!(
        harvester.export_results("xlsx").unwrap_err(),
        HarvestError::EmptyResult
    ));
}

#[tokio::test]
async fn export_rejects_unknown_format() {
    let harvester = harvester(
        Arc::new(MockProvider::new(0)),
        Arc::new(MockEmailSource::none()),
    );
    let err = harvester.export_results("pdf").unwrap_err();
    assert!(matches!(err, HarvestError::InvalidFormat(_)));
}

#[tokio::test]
async fn export_writes_csv_after_a_completed_run() {
    let dir = tempfile::tempdir().expect("tempdir");
    let harvester = Harvester::with_collaborators(
        Arc::new(MockProvider::new(2)),
        Arc::new(MockEmailSource::none()),
        None,
        dir.path().to_path_buf(),
    );

    harvester
        .initiate_search(&SearchRequest::new(
            vec!["cafe".into()],
            vec!["Berlin".into()],
        ))
        .expect("initiated");
    wait_until_settled(&harvester).await;

    let path = harvester.export_results("csv").expect("export");
    let content = std::fs::read_to_string(&path).expect("read back");
    assert!(content.starts_with("Id,BusinessName"));
    assert_eq!(content.lines().count(), 3); // header + 2 rows
}
