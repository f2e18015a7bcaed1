//! Donation Writer: orchestrates the submission write protocol.

use std::any::Any;
use std::collections::BTreeMap;
use std::panic::AssertUnwindSafe;

use common::RowId;
use domain::{Donation, DonationItem, DonationRequest, ItemType, Record};
use futures_util::FutureExt;
use row_store::{Row, RowStore, RowStoreExt, Table};
use serde_json::Value;

use crate::compensation::{CompensationStack, RollbackOutcome, UndoAction};
use crate::details::{DetailFailure, insert_detail};
use crate::donation_submission;
use crate::error::{Result, SagaError};
use crate::events::SubmissionEvent;
use crate::outcome::{StorageFailure, SubmissionOutcome, SubmissionReceipt, SubmissionReport};
use crate::submission::Submission;

/// Per-submission working state: the journal and the undo actions.
#[derive(Debug, Default)]
struct SubmissionContext {
    submission: Submission,
    compensations: CompensationStack,
}

impl SubmissionContext {
    fn record(&mut self, event: SubmissionEvent) {
        self.submission.apply(event);
    }
}

/// Writes a donation, its items and their detail rows, all or nothing.
///
/// The store offers no multi-table transaction, so every successful write
/// registers its inverse on a compensation stack. When a later step fails
/// the stack is unwound before the outcome is returned.
#[derive(Debug, Clone)]
pub struct DonationWriter<S: RowStore> {
    store: S,
}

impl<S: RowStore> DonationWriter<S> {
    /// Creates a new writer over `store`.
    pub fn new(store: S) -> Self {
        Self { store }
    }

    /// Returns a reference to the underlying store.
    pub fn store(&self) -> &S {
        &self.store
    }

    /// Submits a donation.
    ///
    /// Never fails: every failure, including a panic inside a step, is
    /// reported through the returned outcome after compensation.
    #[tracing::instrument(
        skip_all,
        fields(saga_type = donation_submission::SAGA_TYPE, submission_id = tracing::field::Empty)
    )]
    pub async fn submit(&self, request: &DonationRequest) -> SubmissionReport {
        metrics::counter!("donation_submissions_total").increment(1);
        let started = std::time::Instant::now();

        let submission_id = RowId::new();
        tracing::Span::current().record("submission_id", tracing::field::display(submission_id));

        let mut ctx = SubmissionContext::default();
        ctx.record(SubmissionEvent::started(submission_id, request.item_types()));

        let result = AssertUnwindSafe(self.run(request, &mut ctx))
            .catch_unwind()
            .await
            .unwrap_or_else(|payload| Err(SagaError::Unexpected(panic_message(payload))));

        let outcome = match result {
            Ok(receipt) => {
                ctx.record(SubmissionEvent::completed(receipt.donation_id()));
                metrics::counter!("donation_submissions_completed").increment(1);
                tracing::info!(donation_id = %receipt.donation_id(), "donation submission completed");
                SubmissionOutcome::Success(receipt)
            }
            Err(error) => self.fail(error, &mut ctx).await,
        };

        metrics::histogram!("donation_submission_duration_seconds")
            .record(started.elapsed().as_secs_f64());

        SubmissionReport {
            outcome,
            submission: ctx.submission,
        }
    }

    /// Runs the forward steps. Each step gates the next.
    async fn run(
        &self,
        request: &DonationRequest,
        ctx: &mut SubmissionContext,
    ) -> Result<SubmissionReceipt> {
        // 1. Validate the top-level payload
        let new_donation = request.validate()?;
        let item_types = request.item_types();

        // 2. Insert the donation
        tracing::info!(step = donation_submission::STEP_INSERT_DONATION, "saga step started");
        let row = self
            .store
            .insert_one(Table::Donations, new_donation.to_row())
            .await
            .map_err(|e| SagaError::from_store(donation_submission::STEP_INSERT_DONATION, e))?
            .ok_or(SagaError::MissingReturnedRows {
                step: donation_submission::STEP_INSERT_DONATION,
                table: Table::Donations,
            })?;
        let donation_id = row_id(&row).ok_or_else(|| {
            SagaError::Unexpected("Donation ID is missing after insertion".to_string())
        })?;
        ctx.compensations.push(UndoAction::DeleteDonation { donation_id });
        ctx.record(SubmissionEvent::step_completed(
            donation_submission::STEP_INSERT_DONATION,
            Some(donation_id),
        ));
        let donation = Donation::from_row(row).map_err(|e| SagaError::Unexpected(e.to_string()))?;

        // 3. Insert one item row per present type, in one batch
        tracing::info!(step = donation_submission::STEP_INSERT_ITEMS, "saga step started");
        let rows = item_types
            .iter()
            .map(|item_type| DonationItem::new_row(donation_id, *item_type))
            .collect();
        let returned = self
            .store
            .insert(Table::DonationItems, rows)
            .await
            .map_err(|e| SagaError::from_store(donation_submission::STEP_INSERT_ITEMS, e))?;
        ctx.compensations.push(UndoAction::DeleteItems { donation_id });
        ctx.record(SubmissionEvent::step_completed(
            donation_submission::STEP_INSERT_ITEMS,
            None,
        ));
        if returned.is_empty() {
            return Err(SagaError::MissingReturnedRows {
                step: donation_submission::STEP_INSERT_ITEMS,
                table: Table::DonationItems,
            });
        }

        // 4. Map item types to their generated identities
        let items = decode_items(returned, donation_id);
        let mapping: BTreeMap<ItemType, RowId> = items
            .iter()
            .map(|item| (item.item_type, item.id))
            .collect();
        if item_types.iter().any(|t| !mapping.contains_key(t)) {
            tracing::error!(
                expected = ?item_types,
                received = ?mapping,
                "donation item mapping incomplete"
            );
            return Err(SagaError::InconsistentItemMapping {
                expected: item_types,
                received: mapping,
            });
        }
        ctx.record(SubmissionEvent::items_mapped(mapping.clone()));

        // 5. Insert every type's detail row, collecting failures
        let mut details = Vec::new();
        let mut failures = Vec::new();
        for detail in request.details() {
            let item_type = detail.item_type();
            let step = donation_submission::detail_step(item_type);
            let Some(&item_id) = mapping.get(&item_type) else {
                continue;
            };
            tracing::info!(step, "saga step started");

            let result = insert_detail(&self.store, detail, donation_id, item_id).await;
            if result.is_ok() || result.as_ref().is_err_and(DetailFailure::may_have_written) {
                ctx.compensations.push(UndoAction::DeleteDetail {
                    item_type,
                    donation_item_id: item_id,
                });
            }
            match result {
                Ok(row) => {
                    ctx.record(SubmissionEvent::step_completed(step, row_id(&row)));
                    details.push(row);
                }
                Err(failure) => {
                    tracing::error!(step, reason = %failure, "saga step failed");
                    ctx.record(SubmissionEvent::step_failed(step, failure.to_string()));
                    failures.push(failure);
                }
            }
        }

        // 6. Any detail failure voids the whole submission
        if !failures.is_empty() {
            return Err(SagaError::DetailsFailed(failures));
        }

        Ok(SubmissionReceipt {
            donation,
            items,
            details,
        })
    }

    /// Compensates what was written and builds the failure outcome.
    async fn fail(&self, error: SagaError, ctx: &mut SubmissionContext) -> SubmissionOutcome {
        let step = error.step();
        if !matches!(error, SagaError::DetailsFailed(_)) {
            tracing::error!(step, error = %error, "saga step failed");
            ctx.record(SubmissionEvent::step_failed(step, error.to_string()));
        }

        let rollback = if ctx.compensations.is_empty() {
            RollbackOutcome::NotNeeded
        } else {
            tracing::warn!(from_step = step, "rolling back donation submission");
            ctx.record(SubmissionEvent::compensation_started(step));
            ctx.compensations
                .unwind(&self.store, &mut ctx.submission)
                .await
        };
        if let RollbackOutcome::RollbackFailed { failures } = &rollback {
            tracing::error!(
                donation_id = ?ctx.submission.donation_id(),
                failures = failures.len(),
                "rollback failed, rows may be orphaned"
            );
        }

        ctx.record(SubmissionEvent::failed(error.to_string()));
        metrics::counter!("donation_submissions_failed", "reason" => error.reason()).increment(1);
        tracing::warn!(reason = %error, rollback = %rollback, "donation submission failed");

        match error {
            SagaError::Validation(e) => SubmissionOutcome::ValidationError(e),
            SagaError::StepFailed { step, source } => SubmissionOutcome::StorageError {
                failure: StorageFailure::Rejected {
                    step,
                    error: source.to_string(),
                    code: source.code(),
                    details: source.details(),
                },
                rollback,
            },
            SagaError::MissingReturnedRows { step, .. } => SubmissionOutcome::StorageError {
                failure: StorageFailure::MissingReturnedRows { step },
                rollback,
            },
            SagaError::InconsistentItemMapping { expected, received } => {
                SubmissionOutcome::StorageError {
                    failure: StorageFailure::InconsistentItemMapping { expected, received },
                    rollback,
                }
            }
            SagaError::DetailsFailed(failures) => {
                SubmissionOutcome::PartialFailure { failures, rollback }
            }
            SagaError::Unexpected(message) => SubmissionOutcome::UnexpectedFault { message, rollback },
        }
    }
}

impl<S: RowStore + Clone + 'static> DonationWriter<S> {
    /// Submits a donation on its own task.
    ///
    /// Dropping the returned future does not stop the submission: once the
    /// first write lands, the pipeline still runs to success or compensation.
    /// Callers on a connection that can go away use this rather than
    /// [`DonationWriter::submit`].
    pub async fn submit_detached(&self, request: DonationRequest) -> SubmissionReport {
        let writer = self.clone();
        let task = tokio::spawn(async move { writer.submit(&request).await });
        match task.await {
            Ok(report) => report,
            Err(e) => {
                tracing::error!(error = %e, "donation submission task did not finish");
                metrics::counter!("donation_submissions_failed", "reason" => "unexpected")
                    .increment(1);
                SubmissionReport {
                    outcome: SubmissionOutcome::UnexpectedFault {
                        message: e.to_string(),
                        rollback: RollbackOutcome::RollbackFailed { failures: vec![] },
                    },
                    submission: Submission::default(),
                }
            }
        }
    }
}

/// Reads the generated `id` of a stored row.
fn row_id(row: &Row) -> Option<RowId> {
    row.get("id")
        .and_then(Value::as_str)
        .and_then(|id| id.parse().ok())
}

/// Decodes returned item rows belonging to `donation_id`, skipping malformed ones.
fn decode_items(rows: Vec<Row>, donation_id: RowId) -> Vec<DonationItem> {
    rows.into_iter()
        .filter_map(|row| match DonationItem::from_row(row) {
            Ok(item) if item.donation_id == donation_id => Some(item),
            Ok(item) => {
                tracing::warn!(item_id = %item.id, "item row references another donation");
                None
            }
            Err(e) => {
                tracing::warn!(error = %e, "skipping malformed donation item row");
                None
            }
        })
        .collect()
}

fn panic_message(payload: Box<dyn Any + Send>) -> String {
    payload
        .downcast_ref::<&str>()
        .map(|s| s.to_string())
        .or_else(|| payload.downcast_ref::<String>().cloned())
        .unwrap_or_else(|| "panic during donation submission".to_string())
}
