//! SQLite order store implementation.
//!
//! Provides the `SqliteStore` struct that implements the `OrderStore` trait
//! using sqlx. A table replace runs as a single transaction while holding the
//! store's write lock, so readers see either the previous table or the new
//! one and a failed load rolls back to the last known-good contents.

use super::{ColumnInfo, OrderStore, QueryResult, Row, StoreLocation, Value};
use crate::error::{InsightsError, Result};
use crate::source::{OrderRecord, RecordSet, ORDER_COLUMNS};
use async_trait::async_trait;
use chrono::NaiveDate;
use futures::future::try_join_all;
use sqlx::sqlite::{
    Sqlite, SqliteColumn, SqliteConnectOptions, SqliteConnection, SqliteJournalMode,
    SqlitePool, SqlitePoolOptions, SqliteRow,
};
use sqlx::{Column, Executor, QueryBuilder, Row as SqlxRow, Statement, TypeInfo, ValueRef};
use std::str::FromStr;
use std::time::{Duration, Instant};
use tokio::sync::RwLock;
use tracing::{debug, info, warn};

/// Name of the table owned by the store.
pub const ORDERS_TABLE: &str = "orders";

/// SQL types of the canonical columns, aligned with `ORDER_COLUMNS`.
const ORDER_COLUMN_TYPES: [&str; 7] = ["TEXT", "DATE", "TEXT", "TEXT", "TEXT", "REAL", "REAL"];

/// Upper bound on bind parameters per INSERT statement.
const MAX_BIND_PARAMS: usize = 900;

/// Connections kept for a file-backed store.
const FILE_POOL_SIZE: u32 = 4;

/// SQLite-backed order store.
#[derive(Debug)]
pub struct SqliteStore {
    pool: SqlitePool,
    table_lock: RwLock<()>,
    location: StoreLocation,
}

impl SqliteStore {
    /// Opens (or creates) the store at `location` and ensures the orders
    /// table exists, so a fresh store answers queries with empty results.
    pub async fn open(location: &StoreLocation) -> Result<Self> {
        let (options, max_connections) = match location {
            // A single long-lived connection: each in-memory connection is
            // its own database.
            StoreLocation::Memory => (
                SqliteConnectOptions::from_str("sqlite::memory:")
                    .map_err(|e| InsightsError::storage(format!("Invalid store options: {e}")))?,
                1,
            ),
            StoreLocation::File(path) => {
                if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
                    std::fs::create_dir_all(parent).map_err(|e| {
                        InsightsError::storage(format!(
                            "Failed to create data directory {}: {e}",
                            parent.display()
                        ))
                    })?;
                }
                (
                    SqliteConnectOptions::new()
                        .filename(path)
                        .create_if_missing(true)
                        .journal_mode(SqliteJournalMode::Wal)
                        .busy_timeout(Duration::from_secs(5)),
                    FILE_POOL_SIZE,
                )
            }
        };

        let pool = SqlitePoolOptions::new()
            .max_connections(max_connections)
            .min_connections(1)
            .idle_timeout(None)
            .max_lifetime(None)
            .acquire_timeout(Duration::from_secs(10))
            .connect_with(options)
            .await
            .map_err(|e| {
                InsightsError::storage(format!("Failed to open order store at {location}: {e}"))
            })?;

        sqlx::query(&create_table_sql("CREATE TABLE IF NOT EXISTS", &[]))
            .execute(&pool)
            .await
            .map_err(|e| InsightsError::storage(format!("Failed to prepare orders table: {e}")))?;

        info!("Order store opened at {location}");
        Ok(Self {
            pool,
            table_lock: RwLock::new(()),
            location: location.clone(),
        })
    }

    /// Opens a fresh in-memory store.
    pub async fn open_in_memory() -> Result<Self> {
        Self::open(&StoreLocation::Memory).await
    }

    /// Returns where this store keeps its data.
    pub fn location(&self) -> &StoreLocation {
        &self.location
    }

    async fn replace_in_transaction(&self, records: &RecordSet) -> Result<()> {
        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| InsightsError::ingestion(format!("Failed to begin transaction: {e}")))?;

        match write_table(&mut tx, records).await {
            Ok(()) => tx
                .commit()
                .await
                .map_err(|e| InsightsError::ingestion(format!("Failed to commit orders: {e}"))),
            Err(e) => {
                if let Err(rollback_error) = tx.rollback().await {
                    warn!("Rollback of failed ingestion also failed: {rollback_error}");
                }
                Err(e)
            }
        }
    }

    /// Runs one query. Callers hold the read side of `table_lock`.
    async fn run_query(&self, sql: &str) -> Result<QueryResult> {
        let start = Instant::now();

        let result = sqlx::query(sql)
            .fetch_all(&self.pool)
            .await
            .map_err(|e| InsightsError::query(format_query_error(e)))?;

        let execution_time = start.elapsed();

        let columns: Vec<ColumnInfo> = match result.first() {
            Some(first_row) => first_row
                .columns()
                .iter()
                .map(|col| ColumnInfo::new(col.name(), col.type_info().name()))
                .collect(),
            None => self.describe_columns(sql).await,
        };

        let rows = result.iter().map(convert_row).collect::<Result<Vec<Row>>>()?;
        debug!("Query returned {} rows in {:?}", rows.len(), execution_time);

        Ok(QueryResult::with_data(columns, rows).with_execution_time(execution_time))
    }

    /// Best-effort column metadata for a query that returned no rows.
    async fn describe_columns(&self, sql: &str) -> Vec<ColumnInfo> {
        match (&self.pool).prepare(sql).await {
            Ok(statement) => statement
                .columns()
                .iter()
                .map(|col| ColumnInfo::new(col.name(), col.type_info().name()))
                .collect(),
            Err(_) => Vec::new(),
        }
    }
}

#[async_trait]
impl OrderStore for SqliteStore {
    async fn replace_orders(&self, records: &RecordSet) -> Result<usize> {
        let _guard = self.table_lock.write().await;
        let start = Instant::now();

        match self.replace_in_transaction(records).await {
            Ok(()) => {
                info!(
                    "Replaced {ORDERS_TABLE} with {} rows in {:?}",
                    records.len(),
                    start.elapsed()
                );
                Ok(records.len())
            }
            Err(e) => {
                warn!("Ingestion failed, previous {ORDERS_TABLE} table kept: {e}");
                Err(e)
            }
        }
    }

    async fn execute_query(&self, sql: &str) -> Result<QueryResult> {
        let _guard = self.table_lock.read().await;
        self.run_query(sql).await
    }

    async fn execute_batch(&self, sqls: &[&str]) -> Result<Vec<QueryResult>> {
        let _guard = self.table_lock.read().await;
        try_join_all(sqls.iter().map(|sql| self.run_query(sql))).await
    }

    async fn close(&self) -> Result<()> {
        self.pool.close().await;
        Ok(())
    }
}

/// Drops, recreates and fills the orders table on one connection.
async fn write_table(conn: &mut SqliteConnection, records: &RecordSet) -> Result<()> {
    sqlx::query(&format!("DROP TABLE IF EXISTS {ORDERS_TABLE}"))
        .execute(&mut *conn)
        .await
        .map_err(|e| InsightsError::ingestion(format!("Failed to drop orders table: {e}")))?;

    sqlx::query(&create_table_sql("CREATE TABLE", &records.extra_columns))
        .execute(&mut *conn)
        .await
        .map_err(|e| InsightsError::ingestion(format!("Failed to create orders table: {e}")))?;

    let width = ORDER_COLUMNS.len() + records.extra_columns.len();
    let rows_per_statement = (MAX_BIND_PARAMS / width).max(1);

    for (chunk_index, chunk) in records.records.chunks(rows_per_statement).enumerate() {
        let offset = chunk_index * rows_per_statement;
        for (i, record) in chunk.iter().enumerate() {
            if record.extras.len() != records.extra_columns.len() {
                return Err(InsightsError::ingestion(format!(
                    "Row {} has {} extra values, expected {}",
                    offset + i + 1,
                    record.extras.len(),
                    records.extra_columns.len()
                )));
            }
        }

        insert_builder(&records.extra_columns, chunk)
            .build()
            .execute(&mut *conn)
            .await
            .map_err(|e| InsightsError::ingestion(format!("Failed to insert orders: {e}")))?;
    }

    Ok(())
}

/// Quotes an identifier for use in SQL text.
fn quote_ident(name: &str) -> String {
    format!("\"{}\"", name.replace('"', "\"\""))
}

fn create_table_sql(verb: &str, extra_columns: &[String]) -> String {
    let columns = ORDER_COLUMNS
        .iter()
        .zip(ORDER_COLUMN_TYPES.iter())
        .map(|(name, ty)| format!("{} {ty}", quote_ident(name)))
        .chain(
            extra_columns
                .iter()
                .map(|name| format!("{} TEXT", quote_ident(name))),
        )
        .collect::<Vec<_>>()
        .join(", ");
    format!("{verb} {ORDERS_TABLE} ({columns})")
}

fn insert_builder<'a>(
    extra_columns: &[String],
    chunk: &'a [OrderRecord],
) -> QueryBuilder<'a, Sqlite> {
    let column_list = ORDER_COLUMNS
        .iter()
        .map(|c| quote_ident(c))
        .chain(extra_columns.iter().map(|c| quote_ident(c)))
        .collect::<Vec<_>>()
        .join(", ");

    let mut builder = QueryBuilder::new(format!("INSERT INTO {ORDERS_TABLE} ({column_list}) "));
    builder.push_values(chunk, |mut row, record| {
        row.push_bind(record.order_id.as_str())
            .push_bind(record.order_date.format("%Y-%m-%d").to_string())
            .push_bind(record.customer_id.as_str())
            .push_bind(record.region.as_str())
            .push_bind(record.category.as_str())
            .push_bind(record.sales)
            .push_bind(record.profit);
        for extra in &record.extras {
            row.push_bind(extra.as_str());
        }
    });
    builder
}

/// Converts a sqlx SqliteRow to our Row type.
fn convert_row(row: &SqliteRow) -> Result<Row> {
    row.columns()
        .iter()
        .enumerate()
        .map(|(i, col)| convert_value(row, i, col))
        .collect()
}

/// Converts a single column value from a SqliteRow to our Value type.
///
/// SQLite types values dynamically, so dispatch is on each value's storage
/// class; the declared column type only decides whether text is a date.
/// A value that cannot be decoded fails the query.
fn convert_value(row: &SqliteRow, index: usize, column: &SqliteColumn) -> Result<Value> {
    let decode_error =
        |e: sqlx::Error| InsightsError::query(format!("Cannot read column {}: {e}", column.name()));

    let raw = row.try_get_raw(index).map_err(decode_error)?;
    if raw.is_null() {
        return Ok(Value::Null);
    }
    let storage_class = raw.type_info().name().to_uppercase();

    let value = match storage_class.as_str() {
        "INTEGER" | "INT" | "BIGINT" | "BOOLEAN" => {
            Value::from(row.try_get::<i64, _>(index).map_err(decode_error)?)
        }
        "REAL" | "FLOAT" | "DOUBLE" | "NUMERIC" => {
            Value::from(row.try_get::<f64, _>(index).map_err(decode_error)?)
        }
        "BLOB" => Value::from(row.try_get::<Vec<u8>, _>(index).map_err(decode_error)?),
        _ => {
            let text = row.try_get::<String, _>(index).map_err(decode_error)?;
            let is_date = column.type_info().name().eq_ignore_ascii_case("DATE");
            match is_date
                .then(|| NaiveDate::parse_from_str(&text, "%Y-%m-%d").ok())
                .flatten()
            {
                Some(date) => Value::from(date),
                None => Value::from(text),
            }
        }
    };
    Ok(value)
}

/// Formats a query error, preferring the database's own message.
fn format_query_error(error: sqlx::Error) -> String {
    match error.as_database_error() {
        Some(db_error) => format!("ERROR: {}", db_error.message()),
        None => error.to_string(),
    }
}
