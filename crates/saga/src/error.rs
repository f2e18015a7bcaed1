//! Submission error types.

use std::collections::BTreeMap;

use common::RowId;
use domain::{ItemType, ValidationError};
use row_store::{StoreError, Table};
use thiserror::Error;

use crate::details::DetailFailure;
use crate::donation_submission;

/// Errors that abort a donation submission.
///
/// These never leave the writer: each one is turned into a
/// [`SubmissionOutcome`](crate::SubmissionOutcome) after compensation.
#[derive(Debug, Error)]
pub enum SagaError {
    /// The top-level payload is invalid.
    #[error(transparent)]
    Validation(#[from] ValidationError),

    /// The store rejected a write.
    #[error("Saga step '{step}' failed: {source}")]
    StepFailed {
        step: &'static str,
        #[source]
        source: StoreError,
    },

    /// An insert reported success but returned no rows.
    #[error("No {table} rows returned by step '{step}'")]
    MissingReturnedRows { step: &'static str, table: Table },

    /// The returned items do not cover every requested type.
    #[error("Missing expected donation item IDs after insertion")]
    InconsistentItemMapping {
        expected: Vec<ItemType>,
        received: BTreeMap<ItemType, RowId>,
    },

    /// One or more detail inserts failed.
    #[error("{} donation detail insert(s) failed", .0.len())]
    DetailsFailed(Vec<DetailFailure>),

    /// A fault outside the modelled failures.
    #[error("{0}")]
    Unexpected(String),
}

impl SagaError {
    /// Maps a store error raised by `step`.
    ///
    /// Rejections are storage failures of the step; anything else (a bad
    /// column, an undecodable payload) is an unexpected fault.
    pub fn from_store(step: &'static str, error: StoreError) -> Self {
        if error.is_rejection() {
            SagaError::StepFailed {
                step,
                source: error,
            }
        } else {
            SagaError::Unexpected(format!("{step}: {error}"))
        }
    }

    /// Returns the step this error was raised by.
    pub fn step(&self) -> &'static str {
        match self {
            SagaError::Validation(_) => donation_submission::STEP_VALIDATE,
            SagaError::StepFailed { step, .. } | SagaError::MissingReturnedRows { step, .. } => {
                step
            }
            SagaError::InconsistentItemMapping { .. } => donation_submission::STEP_MAP_ITEMS,
            SagaError::DetailsFailed(_) => donation_submission::STEP_INSERT_DETAILS,
            SagaError::Unexpected(_) => donation_submission::STEP_UNEXPECTED,
        }
    }

    /// Returns the metrics label for this failure.
    pub fn reason(&self) -> &'static str {
        match self {
            SagaError::Validation(_) => "validation",
            SagaError::StepFailed { .. }
            | SagaError::MissingReturnedRows { .. }
            | SagaError::InconsistentItemMapping { .. } => "storage",
            SagaError::DetailsFailed(_) => "partial",
            SagaError::Unexpected(_) => "unexpected",
        }
    }
}

/// Convenience type alias for submission results.
pub type Result<T> = std::result::Result<T, SagaError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rejection_maps_to_step_failure() {
        let error = SagaError::from_store(
            donation_submission::STEP_INSERT_ITEMS,
            StoreError::rejected(Table::DonationItems, "duplicate"),
        );
        assert!(matches!(
            error,
            SagaError::StepFailed {
                step: "insert_donation_items",
                ..
            }
        ));
        assert_eq!(error.reason(), "storage");
    }

    #[test]
    fn test_unknown_column_maps_to_unexpected() {
        let error = SagaError::from_store(
            donation_submission::STEP_INSERT_DONATION,
            StoreError::UnknownColumn {
                table: Table::Donations,
                column: "bogus".to_string(),
            },
        );
        assert!(matches!(error, SagaError::Unexpected(_)));
        assert_eq!(error.step(), donation_submission::STEP_UNEXPECTED);
    }

    #[test]
    fn test_validation_step() {
        let error = SagaError::from(ValidationError::NoItems);
        assert_eq!(error.step(), "validate_request");
        assert_eq!(
            error.to_string(),
            "At least one donation item (food or clothes) is required"
        );
    }
}
