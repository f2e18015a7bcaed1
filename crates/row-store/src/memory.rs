use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use serde_json::Value;
use tokio::sync::RwLock;

use crate::{
    Filter, Result, Row, RowId, StoreError, Table,
    store::{RowStore, validate_filter, validate_rows_for_insert},
};

/// Kind of call made against the store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operation {
    Insert,
    Select,
    Delete,
}

impl std::fmt::Display for Operation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Operation::Insert => "insert",
            Operation::Select => "select",
            Operation::Delete => "delete",
        };
        write!(f, "{name}")
    }
}

#[derive(Debug, Default)]
struct InMemoryState {
    tables: HashMap<Table, Vec<Row>>,
    failures: HashSet<(Operation, Table)>,
    silent_inserts: HashSet<Table>,
    journal: Vec<(Operation, Table)>,
}

/// In-memory row store implementation for testing.
///
/// Behaves like the PostgreSQL implementation (generated `id` and
/// `created_at` columns, column checks) and additionally lets tests inject
/// failures per operation and table.
#[derive(Debug, Clone, Default)]
pub struct InMemoryRowStore {
    state: Arc<RwLock<InMemoryState>>,
}

impl InMemoryRowStore {
    /// Creates a new empty in-memory row store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Makes every subsequent `operation` on `table` fail with a rejection.
    pub async fn fail_on(&self, operation: Operation, table: Table) {
        self.state.write().await.failures.insert((operation, table));
    }

    /// Clears an injected failure.
    pub async fn clear_failure(&self, operation: Operation, table: Table) {
        self.state.write().await.failures.remove(&(operation, table));
    }

    /// Makes inserts into `table` persist their rows but return none,
    /// as a misbehaving store might.
    pub async fn return_nothing_on_insert(&self, table: Table) {
        self.state.write().await.silent_inserts.insert(table);
    }

    /// Returns the number of rows currently stored in `table`.
    pub async fn row_count(&self, table: Table) -> usize {
        self.state
            .read()
            .await
            .tables
            .get(&table)
            .map_or(0, Vec::len)
    }

    /// Returns the total number of rows across all tables.
    pub async fn total_rows(&self) -> usize {
        self.state.read().await.tables.values().map(Vec::len).sum()
    }

    /// Returns a copy of every row in `table`.
    pub async fn rows(&self, table: Table) -> Vec<Row> {
        self.state
            .read()
            .await
            .tables
            .get(&table)
            .cloned()
            .unwrap_or_default()
    }

    /// Returns every call made so far, in order.
    pub async fn operations(&self) -> Vec<(Operation, Table)> {
        self.state.read().await.journal.clone()
    }

    /// Clears all rows, injected failures and the call journal.
    pub async fn clear(&self) {
        let mut state = self.state.write().await;
        *state = InMemoryState::default();
    }

    fn rejection(operation: Operation, table: Table) -> StoreError {
        StoreError::Rejected {
            table,
            message: format!("simulated {operation} failure on {table}"),
            code: Some("P0001".to_string()),
            details: Some("failure injected by InMemoryRowStore".to_string()),
        }
    }
}

impl InMemoryState {
    fn record(&mut self, operation: Operation, table: Table) -> Result<()> {
        self.journal.push((operation, table));
        if self.failures.contains(&(operation, table)) {
            return Err(InMemoryRowStore::rejection(operation, table));
        }
        Ok(())
    }
}

#[async_trait]
impl RowStore for InMemoryRowStore {
    async fn insert(&self, table: Table, rows: Vec<Row>) -> Result<Vec<Row>> {
        let mut state = self.state.write().await;
        state.record(Operation::Insert, table)?;
        validate_rows_for_insert(table, &rows)?;

        let stored: Vec<Row> = rows
            .into_iter()
            .map(|mut row| {
                row.entry("id")
                    .or_insert_with(|| Value::String(RowId::new().to_string()));
                if table.has_created_at() {
                    row.entry("created_at")
                        .or_insert_with(|| Value::String(Utc::now().to_rfc3339()));
                }
                row
            })
            .collect();

        state
            .tables
            .entry(table)
            .or_default()
            .extend(stored.iter().cloned());

        if state.silent_inserts.contains(&table) {
            return Ok(vec![]);
        }
        Ok(stored)
    }

    async fn select(&self, table: Table, filter: Filter) -> Result<Vec<Row>> {
        let mut state = self.state.write().await;
        state.record(Operation::Select, table)?;
        validate_filter(table, &filter)?;

        Ok(state
            .tables
            .get(&table)
            .map(|rows| rows.iter().filter(|r| filter.matches(r)).cloned().collect())
            .unwrap_or_default())
    }

    async fn delete(&self, table: Table, filter: Filter) -> Result<u64> {
        let mut state = self.state.write().await;
        state.record(Operation::Delete, table)?;
        validate_filter(table, &filter)?;

        let Some(rows) = state.tables.get_mut(&table) else {
            return Ok(0);
        };
        let before = rows.len();
        rows.retain(|r| !filter.matches(r));
        Ok((before - rows.len()) as u64)
    }
}
