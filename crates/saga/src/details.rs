//! Detail Inserter: writes one type-specific detail row.

use common::RowId;
use domain::{ItemDetail, ItemType, MissingDetailFields};
use row_store::{Row, RowStore, RowStoreExt};

/// Why a detail row was not written.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DetailFailure {
    /// The payload lacks required fields; no write was attempted.
    Validation(MissingDetailFields),

    /// The store rejected the row.
    Storage {
        item_type: ItemType,
        message: String,
        code: Option<String>,
        details: Option<String>,
    },

    /// The insert succeeded but the row was not returned.
    MissingReturnedRow { item_type: ItemType },
}

impl DetailFailure {
    pub fn item_type(&self) -> ItemType {
        match self {
            DetailFailure::Validation(e) => e.item_type,
            DetailFailure::Storage { item_type, .. }
            | DetailFailure::MissingReturnedRow { item_type } => *item_type,
        }
    }

    /// Returns true if the row may exist despite the failure.
    pub fn may_have_written(&self) -> bool {
        matches!(self, DetailFailure::MissingReturnedRow { .. })
    }
}

impl std::fmt::Display for DetailFailure {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DetailFailure::Validation(e) => write!(f, "{e}"),
            DetailFailure::Storage { message, .. } => write!(f, "{message}"),
            DetailFailure::MissingReturnedRow { item_type } => {
                write!(f, "No {item_type} detail data returned after insertion")
            }
        }
    }
}

/// Validates `detail` and inserts its row.
///
/// Returns the stored row. Validation happens before any write, so a
/// [`DetailFailure::Validation`] never leaves a row behind.
#[tracing::instrument(skip(store, detail), fields(item_type = %detail.item_type()))]
pub async fn insert_detail<S: RowStore + ?Sized>(
    store: &S,
    detail: &dyn ItemDetail,
    donation_id: RowId,
    item_id: RowId,
) -> Result<Row, DetailFailure> {
    let row = detail.build_row(donation_id, item_id).map_err(|e| {
        tracing::warn!(missing = ?e.fields, "detail payload incomplete");
        DetailFailure::Validation(e)
    })?;

    match store.insert_one(detail.table(), row).await {
        Ok(Some(stored)) => Ok(stored),
        Ok(None) => Err(DetailFailure::MissingReturnedRow {
            item_type: detail.item_type(),
        }),
        Err(e) => {
            tracing::error!(error = %e, "detail insert failed");
            Err(DetailFailure::Storage {
                item_type: detail.item_type(),
                message: e.to_string(),
                code: e.code(),
                details: e.details(),
            })
        }
    }
}
