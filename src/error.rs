//! Error types for Retail Insights.
//!
//! Defines the main error enum used throughout the pipeline.

use std::path::Path;
use thiserror::Error;

/// Label used as the "path" of a data source that is not backed by a file.
pub const STREAM_SOURCE: &str = "<stream>";

/// Main error type for Retail Insights operations.
#[derive(Error, Debug)]
pub enum InsightsError {
    /// Unreadable input, unknown encoding, missing columns or uncoercible cells.
    #[error("Data source error in {path}: {cause}")]
    DataSource { path: String, cause: String },

    /// The store could not be opened or prepared.
    #[error("Storage error: {0}")]
    Storage(String),

    /// Storage failure while replacing the orders table.
    #[error("Ingestion error: {0}")]
    Ingestion(String),

    /// Malformed query or storage fault during a read.
    #[error("Query error: {0}")]
    Query(String),

    /// Configuration errors (invalid config file, bad thresholds, etc.)
    #[error("Configuration error: {0}")]
    Config(String),

    /// Internal application errors (unexpected states, bugs, etc.)
    #[error("Internal error: {0}")]
    Internal(String),
}

impl InsightsError {
    /// Creates a data source error for the given path.
    pub fn data_source(path: &Path, cause: impl Into<String>) -> Self {
        Self::DataSource {
            path: path.display().to_string(),
            cause: cause.into(),
        }
    }

    /// Creates a data source error for an input that has no file path.
    pub fn stream_source(cause: impl Into<String>) -> Self {
        Self::DataSource {
            path: STREAM_SOURCE.to_string(),
            cause: cause.into(),
        }
    }

    /// Creates a storage error with the given message.
    pub fn storage(msg: impl Into<String>) -> Self {
        Self::Storage(msg.into())
    }

    /// Creates an ingestion error with the given message.
    pub fn ingestion(msg: impl Into<String>) -> Self {
        Self::Ingestion(msg.into())
    }

    /// Creates a query error with the given message.
    pub fn query(msg: impl Into<String>) -> Self {
        Self::Query(msg.into())
    }

    /// Creates a configuration error with the given message.
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Creates an internal error with the given message.
    pub fn internal(msg: impl Into<String>) -> Self {
        Self::Internal(msg.into())
    }

    /// Returns the error category as a string for display purposes.
    pub fn category(&self) -> &'static str {
        match self {
            Self::DataSource { .. } => "Data Source Error",
            Self::Storage(_) => "Storage Error",
            Self::Ingestion(_) => "Ingestion Error",
            Self::Query(_) => "Query Error",
            Self::Config(_) => "Configuration Error",
            Self::Internal(_) => "Internal Error",
        }
    }

    /// Re-labels a stream data source error with a concrete path.
    pub(crate) fn with_path(self, path: &Path) -> Self {
        match self {
            Self::DataSource { cause, .. } => Self::data_source(path, cause),
            other => other,
        }
    }
}

/// Result type alias using InsightsError.
pub type Result<T> = std::result::Result<T, InsightsError>;
