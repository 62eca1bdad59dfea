//! The search document written for every synchronized record.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::EntityKind;

/// Build the collection identifier embedded in dependent documents.
///
/// Uses format: `{name}___{version}`.
pub fn collection_id(name: &str, version: &str) -> String {
    format!("{}___{}", name, version)
}

/// A kind-tagged, flattened representation of one record.
///
/// Documents are keyed by the record's natural key, so indexing the same
/// record twice replaces the earlier document instead of adding another.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchDocument {
    /// Kind of the record the document was built from.
    pub kind: EntityKind,
    /// Natural key of the record.
    pub key: String,
    /// Key of the owning document, if any (collection id for granules).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent: Option<String>,
    /// The denormalized document body.
    pub source: Value,
    /// When the document was built.
    pub indexed_at: DateTime<Utc>,
}

impl SearchDocument {
    /// Create a new document stamped with the current time.
    pub fn new(kind: EntityKind, key: impl Into<String>, source: Value) -> Self {
        Self {
            kind,
            key: key.into(),
            parent: None,
            source,
            indexed_at: Utc::now(),
        }
    }

    /// Set the parent document key.
    pub fn with_parent(mut self, parent: impl Into<String>) -> Self {
        self.parent = Some(parent.into());
        self
    }

    /// Identifier of the document in the index.
    ///
    /// Uses format: `{kind}:{key}` so kinds never share a key space.
    pub fn document_id(&self) -> String {
        Self::id_for(self.kind, &self.key)
    }

    /// Identifier of the document for `kind` and `key`.
    pub fn id_for(kind: EntityKind, key: &str) -> String {
        format!("{}:{}", kind.as_str(), key)
    }

    /// Whether two documents carry the same content, ignoring when they were built.
    pub fn same_content(&self, other: &SearchDocument) -> bool {
        self.kind == other.kind
            && self.key == other.key
            && self.parent == other.parent
            && self.source == other.source
    }
}
