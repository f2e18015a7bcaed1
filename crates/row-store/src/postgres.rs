use std::collections::BTreeSet;
use std::time::Instant;

use async_trait::async_trait;
use serde_json::Value;
use sqlx::PgPool;
use sqlx::postgres::PgPoolOptions;

use crate::{
    Filter, Result, Row, Table,
    store::{RowStore, validate_filter, validate_rows_for_insert},
};

/// PostgreSQL-backed row store implementation.
///
/// Rows travel as JSON: inserts go through `jsonb_populate_recordset` so
/// that one statement handles any table in the catalogue, and results come
/// back through `to_jsonb`. Column defaults (`id`, `created_at`) apply to
/// every column a batch leaves out.
#[derive(Clone)]
pub struct PostgresRowStore {
    pool: PgPool,
}

impl PostgresRowStore {
    /// Creates a new PostgreSQL row store.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Connects to `database_url` with a pool of at most `max_connections`.
    pub async fn connect(database_url: &str, max_connections: u32) -> Result<Self> {
        let pool = PgPoolOptions::new()
            .max_connections(max_connections)
            .connect(database_url)
            .await?;
        Ok(Self::new(pool))
    }

    /// Gets a reference to the underlying connection pool.
    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    /// Runs the database migrations.
    pub async fn run_migrations(&self) -> Result<()> {
        sqlx::migrate!("../../migrations").run(&self.pool).await?;
        Ok(())
    }

    fn into_rows(values: Vec<Value>) -> Result<Vec<Row>> {
        values
            .into_iter()
            .map(|v| serde_json::from_value::<Row>(v).map_err(Into::into))
            .collect()
    }

    fn record_duration(operation: &'static str, table: Table, start: Instant) {
        metrics::histogram!(
            "row_store_query_duration_seconds",
            "operation" => operation,
            "table" => table.as_str()
        )
        .record(start.elapsed().as_secs_f64());
    }
}

/// Builds the column list for a batch: every column any row sets.
fn insert_columns(rows: &[Row]) -> Vec<&str> {
    let columns: BTreeSet<&str> = rows
        .iter()
        .flat_map(|row| row.keys().map(String::as_str))
        .collect();
    columns.into_iter().collect()
}

/// Builds the predicate for `filter`. The bound text is cast to the column's
/// type so that indexes on the column stay usable.
fn filter_predicate(table: Table, filter: &Filter) -> String {
    let column = filter.column();
    let column_type = table.column_type(column).unwrap_or("text");
    format!("\"{column}\" = $1::{column_type}")
}

fn quoted(columns: &[&str]) -> String {
    columns
        .iter()
        .map(|c| format!("\"{c}\""))
        .collect::<Vec<_>>()
        .join(", ")
}

#[async_trait]
impl RowStore for PostgresRowStore {
    #[tracing::instrument(skip(self, rows), fields(table = %table, rows = rows.len()))]
    async fn insert(&self, table: Table, rows: Vec<Row>) -> Result<Vec<Row>> {
        validate_rows_for_insert(table, &rows)?;
        if rows.is_empty() {
            return Ok(vec![]);
        }

        let start = Instant::now();
        let columns = quoted(&insert_columns(&rows));
        let sql = format!(
            "INSERT INTO {t} ({columns}) \
             SELECT {columns} FROM jsonb_populate_recordset(NULL::{t}, $1) \
             RETURNING to_jsonb({t}.*)",
            t = table.as_str(),
        );

        let payload = Value::Array(rows.into_iter().map(Value::Object).collect());
        let values: Vec<Value> = sqlx::query_scalar(&sql)
            .bind(payload)
            .fetch_all(&self.pool)
            .await?;

        Self::record_duration("insert", table, start);
        Self::into_rows(values)
    }

    #[tracing::instrument(skip(self, filter), fields(table = %table, column = filter.column()))]
    async fn select(&self, table: Table, filter: Filter) -> Result<Vec<Row>> {
        validate_filter(table, &filter)?;

        let start = Instant::now();
        let sql = format!(
            "SELECT to_jsonb(t.*) FROM {} t WHERE t.{}",
            table.as_str(),
            filter_predicate(table, &filter)
        );
        let values: Vec<Value> = sqlx::query_scalar(&sql)
            .bind(filter.value_text())
            .fetch_all(&self.pool)
            .await?;

        Self::record_duration("select", table, start);
        Self::into_rows(values)
    }

    #[tracing::instrument(skip(self, filter), fields(table = %table, column = filter.column()))]
    async fn delete(&self, table: Table, filter: Filter) -> Result<u64> {
        validate_filter(table, &filter)?;

        let start = Instant::now();
        let sql = format!(
            "DELETE FROM {} WHERE {}",
            table.as_str(),
            filter_predicate(table, &filter)
        );
        let result = sqlx::query(&sql)
            .bind(filter.value_text())
            .execute(&self.pool)
            .await?;

        Self::record_duration("delete", table, start);
        Ok(result.rows_affected())
    }
}
