//! Submission outcomes.

use std::collections::BTreeMap;

use common::RowId;
use domain::{Donation, DonationItem, ItemType, ValidationError};
use row_store::Row;

use crate::compensation::RollbackOutcome;
use crate::details::DetailFailure;
use crate::donation_submission;
use crate::submission::Submission;

/// Rows written by a successful submission.
#[derive(Debug, Clone, PartialEq)]
pub struct SubmissionReceipt {
    pub donation: Donation,
    pub items: Vec<DonationItem>,
    /// Detail rows as stored, one per item type.
    pub details: Vec<Row>,
}

impl SubmissionReceipt {
    pub fn donation_id(&self) -> RowId {
        self.donation.id
    }
}

/// A structural storage fault in one of the writer's own steps.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StorageFailure {
    /// The store rejected the write.
    Rejected {
        step: &'static str,
        error: String,
        code: Option<String>,
        details: Option<String>,
    },

    /// The store acknowledged the insert but returned no rows.
    MissingReturnedRows { step: &'static str },

    /// The returned items do not cover every requested type.
    InconsistentItemMapping {
        expected: Vec<ItemType>,
        received: BTreeMap<ItemType, RowId>,
    },
}

impl StorageFailure {
    /// Returns the caller-facing summary of the failure.
    pub fn summary(&self) -> &'static str {
        match self {
            StorageFailure::Rejected { step, .. }
                if *step == donation_submission::STEP_INSERT_DONATION =>
            {
                "Failed to insert donation record"
            }
            StorageFailure::Rejected { .. } => "Failed to insert donation items",
            StorageFailure::MissingReturnedRows { step }
                if *step == donation_submission::STEP_INSERT_DONATION =>
            {
                "No donation data returned after insertion"
            }
            StorageFailure::MissingReturnedRows { .. } => {
                "No donation item data returned after insertion"
            }
            StorageFailure::InconsistentItemMapping { .. } => {
                "Missing expected donation item IDs after insertion"
            }
        }
    }
}

/// How a submission ended.
#[derive(Debug, Clone, PartialEq)]
pub enum SubmissionOutcome {
    /// Every row was written.
    Success(SubmissionReceipt),

    /// The payload was invalid; nothing was written.
    ValidationError(ValidationError),

    /// One of the writer's own steps failed.
    StorageError {
        failure: StorageFailure,
        rollback: RollbackOutcome,
    },

    /// One or more detail rows could not be written.
    PartialFailure {
        failures: Vec<DetailFailure>,
        rollback: RollbackOutcome,
    },

    /// A fault outside the modelled paths.
    UnexpectedFault {
        message: String,
        rollback: RollbackOutcome,
    },
}

impl SubmissionOutcome {
    pub fn is_success(&self) -> bool {
        matches!(self, SubmissionOutcome::Success(_))
    }

    /// Returns the outcome name.
    pub fn kind(&self) -> &'static str {
        match self {
            SubmissionOutcome::Success(_) => "success",
            SubmissionOutcome::ValidationError(_) => "validation_error",
            SubmissionOutcome::StorageError { .. } => "storage_error",
            SubmissionOutcome::PartialFailure { .. } => "partial_failure",
            SubmissionOutcome::UnexpectedFault { .. } => "unexpected_fault",
        }
    }

    /// Returns how compensation ended, for failures that reached the store.
    pub fn rollback(&self) -> Option<&RollbackOutcome> {
        match self {
            SubmissionOutcome::StorageError { rollback, .. }
            | SubmissionOutcome::PartialFailure { rollback, .. }
            | SubmissionOutcome::UnexpectedFault { rollback, .. } => Some(rollback),
            SubmissionOutcome::Success(_) | SubmissionOutcome::ValidationError(_) => None,
        }
    }

    pub fn receipt(&self) -> Option<&SubmissionReceipt> {
        match self {
            SubmissionOutcome::Success(receipt) => Some(receipt),
            _ => None,
        }
    }
}

/// The outcome of a submission together with its journal.
#[derive(Debug, Clone)]
pub struct SubmissionReport {
    pub outcome: SubmissionOutcome,
    pub submission: Submission,
}

impl SubmissionReport {
    pub fn into_outcome(self) -> SubmissionOutcome {
        self.outcome
    }
}
