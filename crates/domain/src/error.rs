//! Domain error types.

use row_store::StoreError;
use thiserror::Error;

use crate::donation::RecordError;

/// Errors that can occur during domain operations.
#[derive(Debug, Error)]
pub enum DomainError {
    /// An error occurred in the row store.
    #[error("Row store error: {0}")]
    Store(#[from] StoreError),

    /// A stored row could not be read as a record.
    #[error(transparent)]
    Record(#[from] RecordError),
}
