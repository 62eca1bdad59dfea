//! Request and response types for search index operations.

use serde_json::{json, Value};

use crate::errors::SearchIndexError;
use index_sync_shared::{EntityKind, SearchDocument};

/// Identifies one document by kind and natural key.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct DocumentRef {
    pub kind: EntityKind,
    pub key: String,
}

impl DocumentRef {
    pub fn new(kind: EntityKind, key: impl Into<String>) -> Self {
        Self {
            kind,
            key: key.into(),
        }
    }

    /// The index `_id` of the referenced document.
    pub fn document_id(&self) -> String {
        SearchDocument::id_for(self.kind, &self.key)
    }
}

impl From<&SearchDocument> for DocumentRef {
    fn from(document: &SearchDocument) -> Self {
        Self::new(document.kind, document.key.clone())
    }
}

/// One step of an atomic alias update.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AliasAction {
    Add { index: String, alias: String },
    Remove { index: String, alias: String },
}

impl AliasAction {
    pub fn add(index: impl Into<String>, alias: impl Into<String>) -> Self {
        Self::Add {
            index: index.into(),
            alias: alias.into(),
        }
    }

    pub fn remove(index: impl Into<String>, alias: impl Into<String>) -> Self {
        Self::Remove {
            index: index.into(),
            alias: alias.into(),
        }
    }

    /// Render the action in `_aliases` request form.
    pub fn to_json(&self) -> Value {
        match self {
            AliasAction::Add { index, alias } => json!({ "add": { "index": index, "alias": alias } }),
            AliasAction::Remove { index, alias } => {
                json!({ "remove": { "index": index, "alias": alias } })
            }
        }
    }
}

/// Result of a batch operation for a single item.
///
/// This struct represents the outcome of a single operation within a batch (e.g.,
/// upserting or deleting one document). It indicates whether the operation
/// succeeded and includes error details if it failed.
#[derive(Debug, Clone)]
pub struct BatchOperationResult {
    /// The `_id` of the document the item refers to.
    pub document_id: String,
    /// Whether the operation succeeded.
    pub success: bool,
    /// Error if the operation failed.
    pub error: Option<SearchIndexError>,
}

impl BatchOperationResult {
    pub fn succeeded(document_id: impl Into<String>) -> Self {
        Self {
            document_id: document_id.into(),
            success: true,
            error: None,
        }
    }

    pub fn failed(document_id: impl Into<String>, error: SearchIndexError) -> Self {
        Self {
            document_id: document_id.into(),
            success: false,
            error: Some(error),
        }
    }
}

/// Summary of a batch operation containing aggregate statistics and individual results.
///
/// This struct provides a complete overview of a bulk operation, including the total
/// number of items processed, how many succeeded and failed, and detailed results for
/// each individual item. This allows callers to handle partial failures gracefully.
#[derive(Debug, Clone, Default)]
pub struct BatchOperationSummary {
    /// Total number of items in the batch.
    pub total: usize,
    /// Number of successful operations.
    pub succeeded: usize,
    /// Number of failed operations.
    pub failed: usize,
    /// Individual results for each item.
    pub results: Vec<BatchOperationResult>,
}

impl BatchOperationSummary {
    pub fn empty() -> Self {
        Self::default()
    }

    /// Build a summary by counting `results`.
    pub fn from_results(results: Vec<BatchOperationResult>) -> Self {
        let succeeded = results.iter().filter(|r| r.success).count();
        Self {
            total: results.len(),
            succeeded,
            failed: results.len() - succeeded,
            results,
        }
    }

    /// The results that failed.
    pub fn failures(&self) -> impl Iterator<Item = &BatchOperationResult> {
        self.results.iter().filter(|r| !r.success)
    }
}
