//! Order store abstraction for Retail Insights.
//!
//! Provides a trait-based interface over the relational `orders` table so the
//! analytics layer receives its store handle by injection rather than sharing
//! ambient connection state.

mod mock;
mod sqlite;
mod types;

pub use mock::FailingStore;
pub use sqlite::{SqliteStore, ORDERS_TABLE};
pub use types::{ColumnInfo, QueryResult, Row, Value};

use crate::error::Result;
use crate::source::RecordSet;
use async_trait::async_trait;
use std::fmt;
use std::path::PathBuf;
use std::sync::Arc;

/// Location label that selects a non-persistent store.
pub const MEMORY_LOCATION: &str = ":memory:";

/// Where the orders table lives.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreLocation {
    /// In-process only; contents vanish when the store is closed.
    Memory,
    /// SQLite database file; contents persist across restarts.
    File(PathBuf),
}

impl StoreLocation {
    /// Parses a location string. `:memory:` selects the in-memory store.
    pub fn parse(s: &str) -> Self {
        if s.trim() == MEMORY_LOCATION {
            Self::Memory
        } else {
            Self::File(PathBuf::from(s.trim()))
        }
    }

    /// Returns the default database file for the current platform.
    ///
    /// - Linux: `~/.local/share/retail-insights/retail.db`
    /// - macOS: `~/Library/Application Support/retail-insights/retail.db`
    pub fn default_file() -> Self {
        let dir = dirs::data_dir().unwrap_or_else(|| PathBuf::from("."));
        Self::File(dir.join("retail-insights").join("retail.db"))
    }
}

impl fmt::Display for StoreLocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Memory => write!(f, "{MEMORY_LOCATION}"),
            Self::File(path) => write!(f, "{}", path.display()),
        }
    }
}

/// Opens the SQLite-backed order store at the given location.
///
/// This is the central factory function for store handles.
pub async fn open(location: &StoreLocation) -> Result<Arc<dyn OrderStore>> {
    let store = SqliteStore::open(location).await?;
    Ok(Arc::new(store))
}

/// Trait defining the interface for order stores.
///
/// Implementations must never let a query observe a table mid-replacement:
/// `replace_orders` excludes all readers for its duration, while queries may
/// run concurrently with each other.
#[async_trait]
pub trait OrderStore: Send + Sync {
    /// Replaces the entire orders table with `records`, returning the row count.
    ///
    /// On failure the previous table contents remain in place.
    async fn replace_orders(&self, records: &RecordSet) -> Result<usize>;

    /// Executes a SQL query and returns the results.
    async fn execute_query(&self, sql: &str) -> Result<QueryResult>;

    /// Executes several queries against one snapshot of the table.
    ///
    /// No replacement can land between the queries, so their results are
    /// mutually consistent. Fails on the first query that fails.
    async fn execute_batch(&self, sqls: &[&str]) -> Result<Vec<QueryResult>>;

    /// Closes the store.
    async fn close(&self) -> Result<()>;
}
