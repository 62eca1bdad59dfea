//! Pipeline error types.

use serde_json::Value;
use thiserror::Error;

use index_sync_repository::SearchIndexError;
use index_sync_shared::{EntityKind, FailureReason};
use index_sync_store::StoreError;

/// Invalid run configuration. Raised before any record is read.
#[derive(Debug, Clone, Error)]
pub enum ConfigurationError {
    /// The concurrency value is not a positive integer.
    #[error("Invalid {setting} value {value}: concurrency must be an integer greater than 0")]
    InvalidConcurrency { setting: &'static str, value: String },

    /// A numeric setting is not a positive integer.
    #[error("Invalid {setting} value {value:?}: expected an integer greater than 0")]
    InvalidSetting { setting: &'static str, value: String },
}

impl ConfigurationError {
    pub fn invalid_setting(setting: &'static str, value: impl Into<String>) -> Self {
        Self::InvalidSetting {
            setting,
            value: value.into(),
        }
    }

    pub fn invalid_concurrency(setting: &'static str, value: &Value) -> Self {
        let value = match value {
            Value::String(s) => format!("{:?}", s),
            other => other.to_string(),
        };
        Self::InvalidConcurrency { setting, value }
    }
}

/// A record could not be translated into a search document.
#[derive(Debug, Clone, Error)]
pub enum MappingError {
    /// A referenced relation does not exist in the store.
    #[error("{kind} {key} references missing {relation} with cumulus_id {cumulus_id}")]
    MissingRelation {
        kind: EntityKind,
        key: String,
        relation: EntityKind,
        cumulus_id: i64,
    },

    /// A resolved relation has an unexpected kind.
    #[error("{kind} {key} resolved {relation} to a {found} record")]
    RelationKindMismatch {
        kind: EntityKind,
        key: String,
        relation: EntityKind,
        found: EntityKind,
    },

    /// The document could not be serialized.
    #[error("Failed to serialize {kind} {key}: {message}")]
    Serialization {
        kind: EntityKind,
        key: String,
        message: String,
    },
}

impl MappingError {
    pub fn missing_relation(kind: EntityKind, key: impl Into<String>, relation: EntityKind, cumulus_id: i64) -> Self {
        Self::MissingRelation {
            kind,
            key: key.into(),
            relation,
            cumulus_id,
        }
    }

    pub fn serialization(kind: EntityKind, key: impl Into<String>, err: serde_json::Error) -> Self {
        Self::Serialization {
            kind,
            key: key.into(),
            message: err.to_string(),
        }
    }
}

/// Why one record failed to synchronize.
#[derive(Debug, Clone, Error)]
pub enum RecordError {
    #[error(transparent)]
    Mapping(#[from] MappingError),

    #[error(transparent)]
    IndexWrite(#[from] SearchIndexError),

    /// A relation lookup failed for a reason other than the record being absent.
    #[error("Relation lookup failed: {0}")]
    Store(#[from] StoreError),

    /// The record task panicked.
    #[error("Record task panicked: {0}")]
    Panicked(String),
}

impl RecordError {
    pub fn reason(&self) -> FailureReason {
        match self {
            RecordError::Mapping(_) | RecordError::Panicked(_) => FailureReason::Mapping,
            RecordError::IndexWrite(err) if err.is_timeout() => FailureReason::Timeout,
            RecordError::IndexWrite(_) => FailureReason::IndexWrite,
            RecordError::Store(_) => FailureReason::Store,
        }
    }
}

/// Errors that reject a synchronization run as a whole.
#[derive(Debug, Clone, Error)]
pub enum PipelineError {
    #[error("Configuration error: {0}")]
    Configuration(#[from] ConfigurationError),
}
