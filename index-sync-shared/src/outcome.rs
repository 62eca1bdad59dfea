//! Per-record results of a synchronization run.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::EntityKind;

/// Why a record could not be indexed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureReason {
    /// The document could not be built from the record.
    Mapping,
    /// The search index rejected or failed the write.
    IndexWrite,
    /// The write did not complete within the request timeout.
    Timeout,
    /// Looking up a related record failed.
    Store,
    /// The record's task was aborted before it produced a result.
    Aborted,
}

impl fmt::Display for FailureReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            FailureReason::Mapping => "mapping",
            FailureReason::IndexWrite => "index_write",
            FailureReason::Timeout => "timeout",
            FailureReason::Store => "store",
            FailureReason::Aborted => "aborted",
        };
        f.write_str(name)
    }
}

/// A captured failure for a single record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SyncFailure {
    pub kind: EntityKind,
    /// Natural key of the record.
    pub key: String,
    /// Internal identity of the record, when it has one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cumulus_id: Option<i64>,
    pub reason: FailureReason,
    /// Human readable error detail.
    pub error: String,
}

/// The result of processing one record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum SyncOutcome {
    Indexed { kind: EntityKind, key: String },
    Failed(SyncFailure),
}

impl SyncOutcome {
    pub fn indexed(kind: EntityKind, key: impl Into<String>) -> Self {
        Self::Indexed {
            kind,
            key: key.into(),
        }
    }

    pub fn failed(
        kind: EntityKind,
        key: impl Into<String>,
        cumulus_id: Option<i64>,
        reason: FailureReason,
        error: impl Into<String>,
    ) -> Self {
        Self::Failed(SyncFailure {
            kind,
            key: key.into(),
            cumulus_id,
            reason,
            error: error.into(),
        })
    }

    pub fn kind(&self) -> EntityKind {
        match self {
            SyncOutcome::Indexed { kind, .. } => *kind,
            SyncOutcome::Failed(failure) => failure.kind,
        }
    }

    pub fn key(&self) -> &str {
        match self {
            SyncOutcome::Indexed { key, .. } => key,
            SyncOutcome::Failed(failure) => &failure.key,
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, SyncOutcome::Indexed { .. })
    }

    pub fn failure(&self) -> Option<&SyncFailure> {
        match self {
            SyncOutcome::Indexed { .. } => None,
            SyncOutcome::Failed(failure) => Some(failure),
        }
    }
}
