//! Failing store for testing error propagation.

use super::{OrderStore, QueryResult};
use crate::error::{InsightsError, Result};
use crate::source::RecordSet;
use async_trait::async_trait;

/// An order store whose every operation fails with a storage fault.
#[derive(Debug, Clone)]
pub struct FailingStore {
    message: String,
}

impl FailingStore {
    /// Creates a failing store reporting the given message.
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

impl Default for FailingStore {
    fn default() -> Self {
        Self::new("disk I/O error")
    }
}

#[async_trait]
impl OrderStore for FailingStore {
    async fn replace_orders(&self, _records: &RecordSet) -> Result<usize> {
        Err(InsightsError::ingestion(self.message.clone()))
    }

    async fn execute_query(&self, _sql: &str) -> Result<QueryResult> {
        Err(InsightsError::query(self.message.clone()))
    }

    async fn execute_batch(&self, _sqls: &[&str]) -> Result<Vec<QueryResult>> {
        Err(InsightsError::query(self.message.clone()))
    }

    async fn close(&self) -> Result<()> {
        Ok(())
    }
}
