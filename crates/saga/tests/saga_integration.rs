//! Integration tests for the donation submission saga.

use std::time::Duration;

use async_trait::async_trait;
use domain::{
    ClothesPayload, DonationItem, DonationRequest, FoodPayload, ItemType, Record, ValidationError,
};
use row_store::{Filter, InMemoryRowStore, Operation, Row, RowStore, Table};
use saga::{
    DetailFailure, DonationWriter, RollbackOutcome, StorageFailure, SubmissionOutcome,
    SubmissionState,
};

struct TestHarness {
    writer: DonationWriter<InMemoryRowStore>,
    store: InMemoryRowStore,
}

impl TestHarness {
    fn new() -> Self {
        let store = InMemoryRowStore::new();
        Self {
            writer: DonationWriter::new(store.clone()),
            store,
        }
    }

    async fn assert_empty(&self) {
        for table in Table::ALL {
            assert_eq!(self.store.row_count(table).await, 0, "{table} not empty");
        }
    }
}

fn food() -> FoodPayload {
    FoodPayload::new("Rice", "grain", 5, "bag", "2025-01-01")
}

fn clothes() -> ClothesPayload {
    ClothesPayload::new("shirt", "M", "good", "cotton", 3)
}

fn request() -> DonationRequest {
    DonationRequest::new("d1", "o1", "pending")
}

#[tokio::test]
async fn test_food_donation_is_written() {
    let h = TestHarness::new();

    let report = h.writer.submit(&request().with_food(food())).await;

    let SubmissionOutcome::Success(receipt) = &report.outcome else {
        panic!("expected success, got {:?}", report.outcome);
    };
    assert_eq!(receipt.donation.donor_id, "d1");
    assert_eq!(receipt.items.len(), 1);
    assert_eq!(receipt.items[0].item_type, ItemType::Food);
    assert_eq!(receipt.details.len(), 1);
    assert_eq!(receipt.details[0]["name"], "Rice");

    assert_eq!(h.store.row_count(Table::Donations).await, 1);
    assert_eq!(h.store.row_count(Table::DonationItems).await, 1);
    assert_eq!(h.store.row_count(Table::Food).await, 1);
    assert_eq!(h.store.row_count(Table::Clothes).await, 0);

    assert_eq!(report.submission.state(), SubmissionState::Completed);
    assert_eq!(report.submission.donation_id(), Some(receipt.donation_id()));
    assert_eq!(
        report.submission.completed_steps(),
        &[
            "insert_donation",
            "insert_donation_items",
            "map_donation_items",
            "insert_food_detail"
        ]
    );
}

#[tokio::test]
async fn test_missing_food_field_rolls_back_everything() {
    let h = TestHarness::new();
    let payload = FoodPayload {
        exp_date: None,
        ..food()
    };

    let report = h.writer.submit(&request().with_food(payload)).await;

    let SubmissionOutcome::PartialFailure { failures, rollback } = &report.outcome else {
        panic!("expected partial failure, got {:?}", report.outcome);
    };
    assert_eq!(failures.len(), 1);
    assert_eq!(
        failures[0].to_string(),
        "Missing required food fields: exp_date"
    );
    assert_eq!(rollback, &RollbackOutcome::RolledBack);
    assert_eq!(report.submission.state(), SubmissionState::RolledBack);
    h.assert_empty().await;
}

#[tokio::test]
async fn test_invalid_clothes_voids_valid_food() {
    let h = TestHarness::new();
    let payload = ClothesPayload {
        size: None,
        ..clothes()
    };

    let report = h
        .writer
        .submit(&request().with_food(food()).with_clothes(payload))
        .await;

    let SubmissionOutcome::PartialFailure { failures, .. } = &report.outcome else {
        panic!("expected partial failure, got {:?}", report.outcome);
    };
    assert_eq!(failures.len(), 1);
    assert_eq!(failures[0].item_type(), ItemType::Clothes);

    // The food row was written, then compensated.
    let operations = h.store.operations().await;
    assert!(operations.contains(&(Operation::Insert, Table::Food)));
    assert!(operations.contains(&(Operation::Delete, Table::Food)));
    assert!(!operations.contains(&(Operation::Insert, Table::Clothes)));
    h.assert_empty().await;
}

#[tokio::test]
async fn test_no_items_writes_nothing() {
    let h = TestHarness::new();

    let report = h.writer.submit(&request()).await;

    assert_eq!(
        report.outcome,
        SubmissionOutcome::ValidationError(ValidationError::NoItems)
    );
    assert_eq!(report.submission.state(), SubmissionState::Rejected);
    assert!(h.store.operations().await.is_empty());
}

#[tokio::test]
async fn test_missing_top_level_fields_are_all_reported() {
    let h = TestHarness::new();
    let request = DonationRequest {
        org_id: Some("o1".to_string()),
        status: Some(String::new()),
        food: Some(food()),
        ..Default::default()
    };

    let report = h.writer.submit(&request).await;

    assert_eq!(
        report.outcome,
        SubmissionOutcome::ValidationError(ValidationError::MissingFields(vec![
            "donor_id", "status"
        ]))
    );
    assert!(h.store.operations().await.is_empty());
}

#[tokio::test]
async fn test_unknown_status_is_a_validation_error() {
    let h = TestHarness::new();

    let report = h
        .writer
        .submit(&DonationRequest::new("d1", "o1", "shipped").with_food(food()))
        .await;

    assert!(matches!(
        report.outcome,
        SubmissionOutcome::ValidationError(ValidationError::UnknownStatus(_))
    ));
    assert!(h.store.operations().await.is_empty());
}

#[tokio::test]
async fn test_both_malformed_types_are_reported() {
    let h = TestHarness::new();
    let request = request()
        .with_food(FoodPayload {
            name: None,
            ..food()
        })
        .with_clothes(ClothesPayload {
            qty: Some(serde_json::json!(0)),
            ..clothes()
        });

    let report = h.writer.submit(&request).await;

    let SubmissionOutcome::PartialFailure { failures, rollback } = &report.outcome else {
        panic!("expected partial failure, got {:?}", report.outcome);
    };
    let reasons: Vec<String> = failures.iter().map(ToString::to_string).collect();
    assert_eq!(
        reasons,
        vec![
            "Missing required food fields: name",
            "Missing required clothes fields: qty"
        ]
    );
    assert!(rollback.is_clean());
    h.assert_empty().await;
}

#[tokio::test]
async fn test_detail_rows_reference_items_of_their_type() {
    let h = TestHarness::new();

    let report = h
        .writer
        .submit(&request().with_food(food()).with_clothes(clothes()))
        .await;

    let receipt = report.outcome.receipt().expect("submission should succeed");
    assert_eq!(receipt.items.len(), 2);
    assert_eq!(h.store.row_count(Table::DonationItems).await, 2);

    for (table, item_type) in [(Table::Food, ItemType::Food), (Table::Clothes, ItemType::Clothes)] {
        let rows = h.store.rows(table).await;
        assert_eq!(rows.len(), 1);
        let item_id = rows[0]["donation_item_id"].as_str().unwrap().to_string();

        let item = h
            .store
            .select(Table::DonationItems, Filter::eq("id", item_id))
            .await
            .unwrap()
            .pop()
            .map(DonationItem::from_row)
            .unwrap()
            .unwrap();
        assert_eq!(item.item_type, item_type);
        assert_eq!(item.donation_id, receipt.donation_id());
    }
}

#[tokio::test]
async fn test_identical_submissions_are_independent() {
    let h = TestHarness::new();
    let request = request().with_food(food());

    let first = h.writer.submit(&request).await;
    let second = h.writer.submit(&request).await;

    let first_id = first.outcome.receipt().unwrap().donation_id();
    let second_id = second.outcome.receipt().unwrap().donation_id();
    assert_ne!(first_id, second_id);
    assert_eq!(h.store.row_count(Table::Donations).await, 2);
    assert_eq!(h.store.row_count(Table::DonationItems).await, 2);
    assert_eq!(h.store.row_count(Table::Food).await, 2);
}

#[tokio::test]
async fn test_parent_insert_failure_needs_no_rollback() {
    let h = TestHarness::new();
    h.store.fail_on(Operation::Insert, Table::Donations).await;

    let report = h.writer.submit(&request().with_food(food())).await;

    let SubmissionOutcome::StorageError { failure, rollback } = &report.outcome else {
        panic!("expected storage error, got {:?}", report.outcome);
    };
    assert_eq!(failure.summary(), "Failed to insert donation record");
    assert!(matches!(
        failure,
        StorageFailure::Rejected { code: Some(code), .. } if code == "P0001"
    ));
    assert_eq!(rollback, &RollbackOutcome::NotNeeded);
    assert_eq!(report.submission.state(), SubmissionState::Rejected);
    assert!(!h
        .store
        .operations()
        .await
        .iter()
        .any(|(op, _)| *op == Operation::Delete));
}

#[tokio::test]
async fn test_item_insert_failure_removes_donation() {
    let h = TestHarness::new();
    h.store.fail_on(Operation::Insert, Table::DonationItems).await;

    let report = h.writer.submit(&request().with_food(food())).await;

    let SubmissionOutcome::StorageError { failure, rollback } = &report.outcome else {
        panic!("expected storage error, got {:?}", report.outcome);
    };
    assert_eq!(failure.summary(), "Failed to insert donation items");
    assert_eq!(rollback, &RollbackOutcome::RolledBack);
    assert_eq!(report.submission.compensated_steps(), &["delete_donation"]);
    h.assert_empty().await;
}

#[tokio::test]
async fn test_unreturned_items_are_still_compensated() {
    let h = TestHarness::new();
    h.store.return_nothing_on_insert(Table::DonationItems).await;

    let report = h.writer.submit(&request().with_food(food())).await;

    let SubmissionOutcome::StorageError { failure, rollback } = &report.outcome else {
        panic!("expected storage error, got {:?}", report.outcome);
    };
    assert_eq!(
        failure,
        &StorageFailure::MissingReturnedRows {
            step: "insert_donation_items"
        }
    );
    assert_eq!(rollback, &RollbackOutcome::RolledBack);
    h.assert_empty().await;
}

#[tokio::test]
async fn test_detail_storage_failure_is_partial_failure() {
    let h = TestHarness::new();
    h.store.fail_on(Operation::Insert, Table::Clothes).await;

    let report = h
        .writer
        .submit(&request().with_food(food()).with_clothes(clothes()))
        .await;

    let SubmissionOutcome::PartialFailure { failures, rollback } = &report.outcome else {
        panic!("expected partial failure, got {:?}", report.outcome);
    };
    assert!(matches!(
        &failures[..],
        [DetailFailure::Storage { item_type: ItemType::Clothes, code: Some(_), .. }]
    ));
    assert_eq!(rollback, &RollbackOutcome::RolledBack);
    assert_eq!(
        report.submission.compensated_steps(),
        &["delete_food_detail", "delete_donation_items", "delete_donation"]
    );
    h.assert_empty().await;
}

#[tokio::test]
async fn test_food_storage_failure_still_writes_then_removes_clothes() {
    let h = TestHarness::new();
    h.store.fail_on(Operation::Insert, Table::Food).await;

    let report = h
        .writer
        .submit(&request().with_food(food()).with_clothes(clothes()))
        .await;

    let SubmissionOutcome::PartialFailure { failures, rollback } = &report.outcome else {
        panic!("expected partial failure, got {:?}", report.outcome);
    };
    assert!(matches!(
        &failures[..],
        [DetailFailure::Storage { item_type: ItemType::Food, .. }]
    ));
    assert_eq!(rollback, &RollbackOutcome::RolledBack);

    let operations = h.store.operations().await;
    let clothes_insert = operations
        .iter()
        .position(|op| *op == (Operation::Insert, Table::Clothes))
        .expect("clothes detail should still be attempted");
    let clothes_delete = operations
        .iter()
        .position(|op| *op == (Operation::Delete, Table::Clothes))
        .expect("clothes detail should be compensated");
    assert!(clothes_insert < clothes_delete);
    assert!(!operations.contains(&(Operation::Delete, Table::Food)));
    assert_eq!(
        report.submission.compensated_steps(),
        &["delete_clothes_detail", "delete_donation_items", "delete_donation"]
    );
    h.assert_empty().await;
}

#[tokio::test]
async fn test_numeric_string_qty_is_accepted() {
    let h = TestHarness::new();
    let payload = FoodPayload {
        qty: Some(serde_json::json!("5")),
        ..food()
    };

    let report = h.writer.submit(&request().with_food(payload)).await;

    let receipt = report.outcome.receipt().expect("submission should succeed");
    assert_eq!(receipt.details[0]["qty"], 5);
    assert_eq!(h.store.row_count(Table::Food).await, 1);
}

#[tokio::test]
async fn test_failed_rollback_is_recorded() {
    let h = TestHarness::new();
    h.store.fail_on(Operation::Delete, Table::Donations).await;
    let payload = FoodPayload {
        qty: None,
        ..food()
    };

    let report = h.writer.submit(&request().with_food(payload)).await;

    let SubmissionOutcome::PartialFailure { rollback, .. } = &report.outcome else {
        panic!("expected partial failure, got {:?}", report.outcome);
    };
    let RollbackOutcome::RollbackFailed { failures } = rollback else {
        panic!("expected rollback failure, got {rollback:?}");
    };
    assert_eq!(failures.len(), 1);
    assert_eq!(failures[0].step, "delete_donation");

    assert_eq!(report.submission.state(), SubmissionState::RollbackFailed);
    assert_eq!(h.store.row_count(Table::Donations).await, 1);
    assert_eq!(h.store.row_count(Table::DonationItems).await, 0);
}

/// Store that drops item rows of one type from insert results.
struct DroppingStore {
    inner: InMemoryRowStore,
    hide: ItemType,
}

#[async_trait]
impl RowStore for DroppingStore {
    async fn insert(&self, table: Table, rows: Vec<Row>) -> row_store::Result<Vec<Row>> {
        let stored = self.inner.insert(table, rows).await?;
        if table != Table::DonationItems {
            return Ok(stored);
        }
        Ok(stored
            .into_iter()
            .filter(|row| row["type"] != self.hide.as_str())
            .collect())
    }

    async fn select(&self, table: Table, filter: Filter) -> row_store::Result<Vec<Row>> {
        self.inner.select(table, filter).await
    }

    async fn delete(&self, table: Table, filter: Filter) -> row_store::Result<u64> {
        self.inner.delete(table, filter).await
    }
}

#[tokio::test]
async fn test_incomplete_item_mapping_rolls_back() {
    let inner = InMemoryRowStore::new();
    let writer = DonationWriter::new(DroppingStore {
        inner: inner.clone(),
        hide: ItemType::Clothes,
    });

    let report = writer
        .submit(&request().with_food(food()).with_clothes(clothes()))
        .await;

    let SubmissionOutcome::StorageError { failure, rollback } = &report.outcome else {
        panic!("expected storage error, got {:?}", report.outcome);
    };
    let StorageFailure::InconsistentItemMapping { expected, received } = failure else {
        panic!("expected mapping failure, got {failure:?}");
    };
    assert_eq!(expected, &vec![ItemType::Food, ItemType::Clothes]);
    assert_eq!(received.keys().copied().collect::<Vec<_>>(), vec![ItemType::Food]);
    assert_eq!(rollback, &RollbackOutcome::RolledBack);
    assert_eq!(inner.total_rows().await, 0);
}

/// Store that panics when a detail table is written.
struct PanickingStore {
    inner: InMemoryRowStore,
}

#[async_trait]
impl RowStore for PanickingStore {
    async fn insert(&self, table: Table, rows: Vec<Row>) -> row_store::Result<Vec<Row>> {
        if table == Table::Food {
            panic!("food table unavailable");
        }
        self.inner.insert(table, rows).await
    }

    async fn select(&self, table: Table, filter: Filter) -> row_store::Result<Vec<Row>> {
        self.inner.select(table, filter).await
    }

    async fn delete(&self, table: Table, filter: Filter) -> row_store::Result<u64> {
        self.inner.delete(table, filter).await
    }
}

#[tokio::test]
async fn test_panic_becomes_unexpected_fault() {
    let inner = InMemoryRowStore::new();
    let writer = DonationWriter::new(PanickingStore {
        inner: inner.clone(),
    });

    let report = writer.submit(&request().with_food(food())).await;

    let SubmissionOutcome::UnexpectedFault { message, rollback } = &report.outcome else {
        panic!("expected unexpected fault, got {:?}", report.outcome);
    };
    assert_eq!(message, "food table unavailable");
    assert_eq!(rollback, &RollbackOutcome::RolledBack);
    assert_eq!(report.submission.state(), SubmissionState::RolledBack);
    assert_eq!(inner.total_rows().await, 0);
}

/// Holds every item insert long enough for a caller to give up mid-write.
#[derive(Clone)]
struct SlowItemsStore {
    inner: InMemoryRowStore,
}

#[async_trait]
impl RowStore for SlowItemsStore {
    async fn insert(&self, table: Table, rows: Vec<Row>) -> row_store::Result<Vec<Row>> {
        if table == Table::DonationItems {
            tokio::time::sleep(Duration::from_millis(200)).await;
        }
        self.inner.insert(table, rows).await
    }

    async fn select(&self, table: Table, filter: Filter) -> row_store::Result<Vec<Row>> {
        self.inner.select(table, filter).await
    }

    async fn delete(&self, table: Table, filter: Filter) -> row_store::Result<u64> {
        self.inner.delete(table, filter).await
    }
}

#[tokio::test]
async fn test_abandoned_detached_submission_still_rolls_back() {
    let inner = InMemoryRowStore::new();
    let writer = DonationWriter::new(SlowItemsStore {
        inner: inner.clone(),
    });
    let payload = FoodPayload {
        exp_date: None,
        ..food()
    };

    let pending = writer.submit_detached(request().with_food(payload));
    assert!(
        tokio::time::timeout(Duration::from_millis(50), pending)
            .await
            .is_err()
    );
    assert_eq!(inner.row_count(Table::Donations).await, 1);

    tokio::time::sleep(Duration::from_millis(500)).await;
    for table in Table::ALL {
        assert_eq!(inner.row_count(table).await, 0, "{table} not empty");
    }
}

#[tokio::test]
async fn test_abandoned_detached_submission_still_completes() {
    let inner = InMemoryRowStore::new();
    let writer = DonationWriter::new(SlowItemsStore {
        inner: inner.clone(),
    });

    let pending = writer.submit_detached(request().with_food(food()));
    assert!(
        tokio::time::timeout(Duration::from_millis(50), pending)
            .await
            .is_err()
    );

    tokio::time::sleep(Duration::from_millis(500)).await;
    assert_eq!(inner.row_count(Table::Donations).await, 1);
    assert_eq!(inner.row_count(Table::DonationItems).await, 1);
    assert_eq!(inner.row_count(Table::Food).await, 1);
}
