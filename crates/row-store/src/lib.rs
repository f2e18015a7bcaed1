//! Row-level storage gateway.
//!
//! The gateway exposes single-call insert, select and delete operations
//! against named tables. It deliberately offers no multi-table transaction:
//! callers that need all-or-nothing semantics across tables must compensate
//! failed writes themselves.

pub mod error;
pub mod memory;
pub mod postgres;
pub mod store;
pub mod table;

pub use common::RowId;
pub use error::{Result, StoreError};
pub use memory::{InMemoryRowStore, Operation};
pub use postgres::PostgresRowStore;
pub use store::{RowStore, RowStoreExt, validate_rows_for_insert};
pub use table::{Filter, Row, Table};
