//! Search index error types.
//!
//! This module defines the error types that can occur during search index operations.

use std::time::Duration;

use thiserror::Error;

/// Errors that can occur during search index operations.
#[derive(Debug, Clone, Error)]
pub enum SearchIndexError {
    /// Validation error (e.g., missing required fields).
    #[error("Validation error: {0}")]
    ValidationError(String),

    /// Failed to establish connection to the search engine.
    #[error("Connection error: {0}")]
    ConnectionError(String),

    /// Failed to index a document.
    #[error("Index error: {0}")]
    IndexError(String),

    /// Failed to delete a document.
    #[error("Delete error: {0}")]
    DeleteError(String),

    /// Failed to create an index or change its aliases.
    #[error("Index administration error: {0}")]
    AdminError(String),

    /// A search or count request failed.
    #[error("Query error: {0}")]
    QueryError(String),

    /// Bulk operation had failures.
    #[error("Bulk operation error: {0}")]
    BulkOperationError(String),

    /// Batch size exceeds configured maximum.
    #[error("Batch size {provided} exceeds maximum {max}")]
    BatchSizeExceeded { provided: usize, max: usize },

    /// The request did not complete within the configured timeout.
    #[error("{operation} timed out after {after:?}")]
    Timeout {
        operation: &'static str,
        after: Duration,
    },

    /// Unknown error.
    #[error("Unknown error: {0}")]
    Unknown(String),
}

impl SearchIndexError {
    /// Create a validation error.
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::ValidationError(msg.into())
    }

    /// Create a connection error.
    pub fn connection(msg: impl Into<String>) -> Self {
        Self::ConnectionError(msg.into())
    }

    /// Create an index error.
    pub fn index(msg: impl Into<String>) -> Self {
        Self::IndexError(msg.into())
    }

    /// Create a delete error.
    pub fn delete(msg: impl Into<String>) -> Self {
        Self::DeleteError(msg.into())
    }

    /// Create an index administration error.
    pub fn admin(msg: impl Into<String>) -> Self {
        Self::AdminError(msg.into())
    }

    /// Create a query error.
    pub fn query(msg: impl Into<String>) -> Self {
        Self::QueryError(msg.into())
    }

    /// Create a bulk operation error.
    pub fn bulk_operation(msg: impl Into<String>) -> Self {
        Self::BulkOperationError(msg.into())
    }

    /// Create a batch size exceeded error.
    pub fn batch_size_exceeded(provided: usize, max: usize) -> Self {
        Self::BatchSizeExceeded { provided, max }
    }

    /// Create a timeout error.
    pub fn timeout(operation: &'static str, after: Duration) -> Self {
        Self::Timeout { operation, after }
    }

    /// Create an unknown error.
    pub fn unknown(msg: impl Into<String>) -> Self {
        Self::Unknown(msg.into())
    }

    pub fn is_timeout(&self) -> bool {
        matches!(self, Self::Timeout { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_timeout_display() {
        let err = SearchIndexError::timeout("upsert", Duration::from_millis(1500));
        assert!(err.is_timeout());
        assert_eq!(err.to_string(), "upsert timed out after 1.5s");
    }

    #[test]
    fn test_batch_size_display() {
        let err = SearchIndexError::batch_size_exceeded(1001, 1000);
        assert_eq!(err.to_string(), "Batch size 1001 exceeds maximum 1000");
        assert!(!err.is_timeout());
    }
}
