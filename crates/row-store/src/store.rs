use async_trait::async_trait;

use crate::{Filter, Result, Row, StoreError, Table};

/// Core trait for row store implementations.
///
/// Each method is a single, independent call against the store. There is no
/// way to group calls into one atomic unit; every call either fully applies
/// or fully fails on its own. All implementations must be thread-safe
/// (Send + Sync).
#[async_trait]
pub trait RowStore: Send + Sync {
    /// Inserts a batch of rows into `table`.
    ///
    /// Returns the rows as stored, including generated columns such as `id`.
    async fn insert(&self, table: Table, rows: Vec<Row>) -> Result<Vec<Row>>;

    /// Retrieves the rows of `table` matching `filter`.
    async fn select(&self, table: Table, filter: Filter) -> Result<Vec<Row>>;

    /// Deletes the rows of `table` matching `filter`.
    ///
    /// Returns the number of rows removed.
    async fn delete(&self, table: Table, filter: Filter) -> Result<u64>;
}

/// Extension trait providing convenience methods for row stores.
#[async_trait]
pub trait RowStoreExt: RowStore {
    /// Inserts a single row and returns it as stored.
    ///
    /// Returns `None` if the store acknowledged the insert but returned no row.
    async fn insert_one(&self, table: Table, row: Row) -> Result<Option<Row>> {
        Ok(self.insert(table, vec![row]).await?.into_iter().next())
    }

    /// Retrieves the row with the given primary key.
    async fn find_by_id(&self, table: Table, id: crate::RowId) -> Result<Option<Row>> {
        Ok(self
            .select(table, Filter::id(id))
            .await?
            .into_iter()
            .next())
    }
}

// Blanket implementation for all RowStore implementations
impl<T: RowStore + ?Sized> RowStoreExt for T {}

/// Validates rows before inserting: every column must belong to `table`.
pub fn validate_rows_for_insert(table: Table, rows: &[Row]) -> Result<()> {
    for row in rows {
        if let Some(column) = row.keys().find(|c| !table.has_column(c)) {
            return Err(StoreError::UnknownColumn {
                table,
                column: column.clone(),
            });
        }
    }
    Ok(())
}

/// Validates that a filter targets a column of `table`.
pub fn validate_filter(table: Table, filter: &Filter) -> Result<()> {
    if table.has_column(filter.column()) {
        Ok(())
    } else {
        Err(StoreError::UnknownColumn {
            table,
            column: filter.column().to_string(),
        })
    }
}
