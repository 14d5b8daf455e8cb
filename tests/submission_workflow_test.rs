//! Submission workflow against mocked and hand-written item stores.

use std::future;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use assert_matches::assert_matches;
use async_trait::async_trait;
use mockall::mock;
use rstest::rstest;
use tokio::sync::Semaphore;

use stockroom::errors::ServiceError;
use stockroom::models::item::{Category, ItemId, ItemRecord, Location, StockItem, StockStatus};
use stockroom::store::{InMemoryItemStore, ItemStore};
use stockroom::submission::{Banner, ItemForm, SubmissionSettings, SubmissionWorkflow, SubmitState};

mock! {
    pub Store {}

    #[async_trait]
    impl ItemStore for Store {
        async fn create(&self, collection: &str, item: &StockItem) -> Result<ItemId, ServiceError>;
        async fn list(&self, collection: &str) -> Result<Vec<ItemRecord>, ServiceError>;
    }
}

/// Holds every `create` until `release` is called.
struct GatedStore {
    calls: AtomicUsize,
    gate: Semaphore,
}

impl GatedStore {
    fn new() -> Self {
        Self {
            calls: AtomicUsize::new(0),
            gate: Semaphore::new(0),
        }
    }

    fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    fn release(&self) {
        self.gate.add_permits(1);
    }
}

#[async_trait]
impl ItemStore for GatedStore {
    async fn create(&self, _collection: &str, _item: &StockItem) -> Result<ItemId, ServiceError> {
        let call = self.calls.fetch_add(1, Ordering::SeqCst) + 1;
        let permit = self
            .gate
            .acquire()
            .await
            .map_err(|e| ServiceError::ExternalServiceError(e.to_string()))?;
        permit.forget();
        Ok(ItemId(format!("-Gated{}", call)))
    }

    async fn list(&self, _collection: &str) -> Result<Vec<ItemRecord>, ServiceError> {
        Ok(Vec::new())
    }
}

/// Never answers.
struct StalledStore;

#[async_trait]
impl ItemStore for StalledStore {
    async fn create(&self, _collection: &str, _item: &StockItem) -> Result<ItemId, ServiceError> {
        future::pending().await
    }

    async fn list(&self, _collection: &str) -> Result<Vec<ItemRecord>, ServiceError> {
        future::pending().await
    }
}

fn settings() -> SubmissionSettings {
    SubmissionSettings {
        collection: "items".into(),
        timeout: Duration::from_secs(5),
        success_display: Duration::from_secs(2),
    }
}

fn face_towels(form: &mut ItemForm) {
    form.name = "Toalhas de Rosto".into();
    form.category = Some(Category::Towels);
    form.quantity = "10".into();
    form.min_stock = "20".into();
    form.price = "15.50".into();
    form.location = Some(Location::RoomA2);
}

#[tokio::test]
async fn incomplete_form_never_reaches_the_store() {
    let mut store = MockStore::new();
    store.expect_create().never();
    let workflow = SubmissionWorkflow::new(Arc::new(store), settings());

    workflow.edit(|form| {
        face_towels(form);
        form.price.clear();
    });
    assert!(!workflow.can_submit());
    assert_matches!(workflow.submit().await, Err(ServiceError::ValidationError(msg)) if msg.contains("price"));
    assert_eq!(workflow.state(), SubmitState::Idle);

    workflow.edit(|form| form.quantity = "dez".into());
    assert_matches!(workflow.submit().await, Err(ServiceError::ValidationError(_)));
}

#[rstest]
#[case::blank_name(|form: &mut ItemForm| form.name.clear())]
#[case::whitespace_name(|form: &mut ItemForm| form.name = "   ".into())]
#[case::no_category(|form: &mut ItemForm| form.category = None)]
#[case::blank_quantity(|form: &mut ItemForm| form.quantity.clear())]
#[case::blank_min_stock(|form: &mut ItemForm| form.min_stock.clear())]
#[case::blank_price(|form: &mut ItemForm| form.price.clear())]
#[case::no_location(|form: &mut ItemForm| form.location = None)]
#[case::price_above_cap(|form: &mut ItemForm| {
    form.quantity = "1000".into();
    form.price = "100000000000000000000000000".into();
})]
#[tokio::test]
async fn each_invalid_field_blocks_the_store_call(#[case] spoil: fn(&mut ItemForm)) {
    let mut store = MockStore::new();
    store.expect_create().never();
    let workflow = SubmissionWorkflow::new(Arc::new(store), settings());

    workflow.edit(|form| {
        face_towels(form);
        spoil(form);
    });
    assert!(!workflow.can_submit());
    assert_matches!(workflow.submit().await, Err(ServiceError::ValidationError(_)));
    assert_eq!(workflow.state(), SubmitState::Idle);
    assert_eq!(workflow.banner(), None);
}

#[tokio::test]
async fn accepted_submission_sends_derived_record() {
    let mut store = MockStore::new();
    store
        .expect_create()
        .withf(|collection, item| {
            collection.to_string() == "items"
                && item.name == "Toalhas de Rosto"
                && item.status() == StockStatus::Low
                && item.created_at == item.last_updated
                && item.supplier.is_none()
        })
        .times(1)
        .returning(|_, _| Ok(ItemId::from("-NkT0w3lA5x1")));
    let workflow = SubmissionWorkflow::new(Arc::new(store), settings());
    workflow.edit(face_towels);
    assert!(workflow.can_submit());

    let record = workflow.submit().await.unwrap();
    assert_eq!(record.id.as_str(), "-NkT0w3lA5x1");
    assert_eq!(record.item.quantity(), 10);
    assert_eq!(
        workflow.banner(),
        Some(Banner::Success {
            id: ItemId::from("-NkT0w3lA5x1")
        })
    );

    // Still showing the confirmation: no second write.
    assert!(!workflow.can_submit());
    assert_matches!(workflow.submit().await, Err(ServiceError::SubmissionDisabled(_)));
}

#[tokio::test]
async fn failed_submission_keeps_values_for_retry() {
    let mut store = MockStore::new();
    let mut attempts = 0;
    store.expect_create().times(2).returning(move |_, _| {
        attempts += 1;
        if attempts == 1 {
            Err(ServiceError::ExternalServiceError(
                "push failed with status 503".into(),
            ))
        } else {
            Ok(ItemId::from("-NkRetry00001"))
        }
    });
    let workflow = SubmissionWorkflow::new(Arc::new(store), settings());
    workflow.edit(face_towels);
    let entered = workflow.form();

    assert_matches!(workflow.submit().await, Err(ServiceError::ExternalServiceError(_)));
    assert_eq!(workflow.state(), SubmitState::Idle);
    assert_eq!(workflow.form(), entered);
    assert_matches!(workflow.banner(), Some(Banner::Error { message }) if !message.contains("503"));
    assert!(workflow.can_submit());

    let record = workflow.submit().await.unwrap();
    assert_eq!(record.id.as_str(), "-NkRetry00001");
}

#[tokio::test]
async fn second_submit_while_in_flight_is_rejected() {
    let store = Arc::new(GatedStore::new());
    let workflow = Arc::new(SubmissionWorkflow::new(store.clone(), settings()));
    workflow.edit(face_towels);

    let first = tokio::spawn({
        let workflow = workflow.clone();
        async move { workflow.submit().await }
    });
    while store.calls() == 0 {
        tokio::task::yield_now().await;
    }

    assert_eq!(workflow.state(), SubmitState::Submitting);
    assert!(!workflow.can_submit());
    assert_matches!(workflow.submit().await, Err(ServiceError::SubmissionInProgress));

    store.release();
    let record = first.await.unwrap().unwrap();
    assert_eq!(record.id.as_str(), "-Gated1");
    assert_eq!(store.calls(), 1);
}

#[tokio::test]
async fn store_timeout_is_a_persistence_error() {
    let workflow = SubmissionWorkflow::new(
        Arc::new(StalledStore),
        SubmissionSettings {
            timeout: Duration::from_millis(50),
            ..settings()
        },
    );
    workflow.edit(face_towels);

    let err = workflow.submit().await.unwrap_err();
    assert_matches!(err, ServiceError::Timeout(50));
    assert!(err.is_persistence_failure());
    assert_eq!(workflow.state(), SubmitState::Idle);
    assert_eq!(workflow.form().name, "Toalhas de Rosto");
}

#[tokio::test]
async fn dropped_submission_returns_to_idle() {
    let workflow = SubmissionWorkflow::new(Arc::new(StalledStore), settings());
    workflow.edit(face_towels);

    let outcome = tokio::time::timeout(Duration::from_millis(20), workflow.submit()).await;
    assert!(outcome.is_err());
    assert_eq!(workflow.state(), SubmitState::Idle);
    assert!(workflow.can_submit());
}

#[tokio::test]
async fn form_is_cleared_after_success_display() {
    let store = Arc::new(InMemoryItemStore::new());
    let workflow = SubmissionWorkflow::new(
        store.clone(),
        SubmissionSettings {
            success_display: Duration::from_millis(20),
            ..settings()
        },
    );
    workflow.edit(face_towels);
    workflow.submit().await.unwrap();
    assert_eq!(workflow.form().name, "Toalhas de Rosto");

    workflow.settle().await;
    assert_eq!(workflow.state(), SubmitState::Idle);
    assert_eq!(workflow.form(), ItemForm::default());
    assert_eq!(workflow.banner(), None);
    assert_eq!(store.len("items").await, 1);
}

#[rstest]
#[case::below_threshold("10", "20", StockStatus::Low)]
#[case::at_threshold("20", "20", StockStatus::Low)]
#[case::above_threshold("21", "20", StockStatus::Normal)]
#[case::empty_shelf("0", "20", StockStatus::Out)]
#[case::empty_without_threshold("0", "0", StockStatus::Out)]
#[tokio::test]
async fn submitted_status_is_derived(
    #[case] quantity: &str,
    #[case] min_stock: &str,
    #[case] expected: StockStatus,
) {
    let store = Arc::new(InMemoryItemStore::new());
    let workflow = SubmissionWorkflow::new(store.clone(), settings());
    workflow.edit(|form| {
        face_towels(form);
        form.quantity = quantity.into();
        form.min_stock = min_stock.into();
    });

    let record = workflow.submit().await.unwrap();
    assert_eq!(record.item.status(), expected);

    let stored = store.list("items").await.unwrap();
    assert_eq!(stored.len(), 1);
    assert_eq!(stored[0].item.status(), expected);
}
