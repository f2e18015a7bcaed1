//! Compensating deletes for partially written submissions.

use common::RowId;
use domain::ItemType;
use row_store::{Filter, RowStore, StoreError, Table};
use serde::Serialize;

use crate::events::SubmissionEvent;
use crate::submission::Submission;

/// The inverse of one successful forward write.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UndoAction {
    /// Delete the detail row referencing an item.
    DeleteDetail {
        item_type: ItemType,
        donation_item_id: RowId,
    },

    /// Delete every item row of a donation.
    DeleteItems { donation_id: RowId },

    /// Delete the donation row.
    DeleteDonation { donation_id: RowId },
}

impl UndoAction {
    /// Returns the compensation step name.
    pub fn step_name(&self) -> &'static str {
        match self {
            UndoAction::DeleteDetail {
                item_type: ItemType::Food,
                ..
            } => "delete_food_detail",
            UndoAction::DeleteDetail {
                item_type: ItemType::Clothes,
                ..
            } => "delete_clothes_detail",
            UndoAction::DeleteItems { .. } => "delete_donation_items",
            UndoAction::DeleteDonation { .. } => "delete_donation",
        }
    }

    /// Returns the table the delete runs against.
    pub fn table(&self) -> Table {
        match self {
            UndoAction::DeleteDetail { item_type, .. } => item_type.detail_table(),
            UndoAction::DeleteItems { .. } => Table::DonationItems,
            UndoAction::DeleteDonation { .. } => Table::Donations,
        }
    }

    /// Returns the filter selecting the rows to delete.
    pub fn filter(&self) -> Filter {
        match self {
            UndoAction::DeleteDetail {
                donation_item_id, ..
            } => Filter::eq_id("donation_item_id", *donation_item_id),
            UndoAction::DeleteItems { donation_id } => Filter::eq_id("donation_id", *donation_id),
            UndoAction::DeleteDonation { donation_id } => Filter::id(*donation_id),
        }
    }

    async fn execute<S: RowStore + ?Sized>(&self, store: &S) -> Result<u64, StoreError> {
        store.delete(self.table(), self.filter()).await
    }
}

/// A compensating delete that did not succeed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CompensationFailure {
    pub step: &'static str,
    pub table: Table,
    pub error: String,
    pub code: Option<String>,
}

/// How compensation ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RollbackOutcome {
    /// Nothing had been written.
    NotNeeded,

    /// Every compensating delete succeeded.
    RolledBack,

    /// At least one compensating delete failed; rows may be orphaned.
    RollbackFailed { failures: Vec<CompensationFailure> },
}

impl RollbackOutcome {
    /// Returns true if any compensating delete was attempted.
    pub fn attempted(&self) -> bool {
        !matches!(self, RollbackOutcome::NotNeeded)
    }

    /// Returns true if the store is known to hold no rows of the submission.
    pub fn is_clean(&self) -> bool {
        !matches!(self, RollbackOutcome::RollbackFailed { .. })
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            RollbackOutcome::NotNeeded => "not_needed",
            RollbackOutcome::RolledBack => "rolled_back",
            RollbackOutcome::RollbackFailed { .. } => "rollback_failed",
        }
    }
}

impl std::fmt::Display for RollbackOutcome {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Undo actions registered by completed forward writes.
///
/// Actions are unwound last-in first-out, so detail rows go before item rows
/// and item rows go before the donation row.
#[derive(Debug, Default)]
pub struct CompensationStack {
    actions: Vec<UndoAction>,
}

impl CompensationStack {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers the inverse of a write that just succeeded.
    pub fn push(&mut self, action: UndoAction) {
        self.actions.push(action);
    }

    pub fn len(&self) -> usize {
        self.actions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.actions.is_empty()
    }

    /// Returns the registered actions in registration order.
    pub fn actions(&self) -> &[UndoAction] {
        &self.actions
    }

    /// Runs every registered action in reverse order.
    ///
    /// Each action is attempted exactly once; a failure is recorded and the
    /// remaining actions still run. Deleting zero rows counts as success.
    #[tracing::instrument(skip_all, fields(actions = self.actions.len()))]
    pub async fn unwind<S: RowStore + ?Sized>(
        &mut self,
        store: &S,
        submission: &mut Submission,
    ) -> RollbackOutcome {
        if self.actions.is_empty() {
            return RollbackOutcome::NotNeeded;
        }

        let mut failures = Vec::new();
        while let Some(action) = self.actions.pop() {
            let step = action.step_name();
            match action.execute(store).await {
                Ok(rows_deleted) => {
                    tracing::info!(step, rows_deleted, "compensation step completed");
                    submission.apply(SubmissionEvent::compensation_step_completed(
                        step,
                        rows_deleted,
                    ));
                }
                Err(e) => {
                    tracing::error!(step, error = %e, "compensation step failed");
                    submission.apply(SubmissionEvent::compensation_step_failed(
                        step,
                        e.to_string(),
                    ));
                    failures.push(CompensationFailure {
                        step,
                        table: action.table(),
                        error: e.to_string(),
                        code: e.code(),
                    });
                }
            }
        }

        let outcome = if failures.is_empty() {
            RollbackOutcome::RolledBack
        } else {
            RollbackOutcome::RollbackFailed { failures }
        };
        metrics::counter!("donation_rollbacks_total", "outcome" => outcome.as_str()).increment(1);
        outcome
    }
}
