//! Record store error types.

use index_sync_shared::EntityKind;
use thiserror::Error;

/// Errors that can occur while reading or writing records.
#[derive(Debug, Clone, Error)]
pub enum StoreError {
    /// A record matching the lookup does not exist.
    #[error("Record not found in {table}: {detail}")]
    RecordNotFound { table: String, detail: String },

    /// The store could not be reached.
    #[error("Connection error: {0}")]
    ConnectionError(String),

    /// A query failed to execute.
    #[error("Query error: {0}")]
    QueryError(String),

    /// A row could not be decoded into its record type.
    #[error("Decode error: {0}")]
    DecodeError(String),

    /// The store does not hold records of this kind.
    #[error("Unsupported entity kind: {0}")]
    UnsupportedKind(EntityKind),
}

impl StoreError {
    /// Create a record not found error.
    pub fn not_found(table: impl Into<String>, detail: impl Into<String>) -> Self {
        Self::RecordNotFound {
            table: table.into(),
            detail: detail.into(),
        }
    }

    /// Create a connection error.
    pub fn connection(msg: impl Into<String>) -> Self {
        Self::ConnectionError(msg.into())
    }

    /// Create a query error.
    pub fn query(msg: impl Into<String>) -> Self {
        Self::QueryError(msg.into())
    }

    /// Create a decode error.
    pub fn decode(msg: impl Into<String>) -> Self {
        Self::DecodeError(msg.into())
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::RecordNotFound { .. })
    }
}

impl From<sqlx::Error> for StoreError {
    fn from(err: sqlx::Error) -> Self {
        match err {
            sqlx::Error::RowNotFound => Self::not_found("unknown", "no rows returned"),
            sqlx::Error::Io(_)
            | sqlx::Error::Tls(_)
            | sqlx::Error::PoolTimedOut
            | sqlx::Error::PoolClosed
            | sqlx::Error::WorkerCrashed => Self::ConnectionError(err.to_string()),
            sqlx::Error::ColumnDecode { .. } | sqlx::Error::Decode(_) => {
                Self::DecodeError(err.to_string())
            }
            other => Self::QueryError(other.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sqlx_row_not_found_is_not_found() {
        let err = StoreError::from(sqlx::Error::RowNotFound);
        assert!(err.is_not_found());
    }

    #[test]
    fn test_sqlx_pool_errors_are_connection_errors() {
        assert!(matches!(
            StoreError::from(sqlx::Error::PoolTimedOut),
            StoreError::ConnectionError(_)
        ));
        assert!(matches!(
            StoreError::from(sqlx::Error::PoolClosed),
            StoreError::ConnectionError(_)
        ));
    }

    #[test]
    fn test_other_sqlx_errors_are_query_errors() {
        let err = StoreError::from(sqlx::Error::ColumnNotFound("granule_id".to_string()));
        assert!(matches!(err, StoreError::QueryError(_)));
    }

    #[test]
    fn test_display() {
        let err = StoreError::not_found("collections", "cumulus_id=4");
        assert_eq!(err.to_string(), "Record not found in collections: cumulus_id=4");
    }
}
