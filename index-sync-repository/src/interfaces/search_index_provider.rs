//! Search index provider trait definition.
//!
//! This module defines the abstract interface for search index operations,
//! allowing for different backend implementations (OpenSearch, in-memory, etc.).

use async_trait::async_trait;
use serde_json::Value;

use crate::errors::SearchIndexError;
use crate::types::{AliasAction, BatchOperationSummary, DocumentRef};
use index_sync_shared::{EntityKind, SearchDocument};

/// Abstracts the underlying search index implementation (OpenSearch, in-memory, etc.).
///
/// This trait defines the interface for all search index backend implementations. Implementations
/// are injected into `SearchIndexClient` to enable dependency injection and easy testing with
/// mock implementations.
///
/// Documents are addressed by `SearchDocument::document_id`, so writing the same
/// kind and key twice replaces the earlier document.
#[async_trait]
pub trait SearchIndexProvider: Send + Sync {
    /// Write a document, replacing any document with the same ID.
    ///
    /// # Arguments
    ///
    /// * `index` - The index or alias to write to
    /// * `document` - The document to write
    ///
    /// # Returns
    ///
    /// * `Ok(())` - If the write was acknowledged
    /// * `Err(SearchIndexError)` - If the write failed or was not acknowledged
    async fn upsert_document(&self, index: &str, document: &SearchDocument) -> Result<(), SearchIndexError>;

    /// Delete a document from the search index.
    ///
    /// If the document doesn't exist, the operation is considered successful.
    async fn delete_document(&self, index: &str, document: &DocumentRef) -> Result<(), SearchIndexError>;

    /// Write multiple documents in one request and report each item's result.
    ///
    /// # Returns
    ///
    /// * `Ok(BatchOperationSummary)` - Contains aggregate statistics and individual results
    /// * `Err(SearchIndexError)` - If the bulk operation fails entirely
    async fn bulk_upsert_documents(
        &self,
        index: &str,
        documents: &[SearchDocument],
    ) -> Result<BatchOperationSummary, SearchIndexError>;

    /// Delete multiple documents in one request and report each item's result.
    ///
    /// Documents that don't exist are considered successful deletions.
    async fn bulk_delete_documents(
        &self,
        index: &str,
        documents: &[DocumentRef],
    ) -> Result<BatchOperationSummary, SearchIndexError>;

    /// Check whether an index or alias named `index` exists.
    async fn index_exists(&self, index: &str) -> Result<bool, SearchIndexError>;

    /// Create `index` with the given settings and mappings.
    async fn create_index(&self, index: &str, settings: &Value) -> Result<(), SearchIndexError>;

    /// Apply alias actions atomically.
    async fn update_aliases(&self, actions: &[AliasAction]) -> Result<(), SearchIndexError>;

    /// Fetch up to `size` documents of `kind`, ordered by key.
    async fn search_by_kind(
        &self,
        index: &str,
        kind: EntityKind,
        size: usize,
    ) -> Result<Vec<SearchDocument>, SearchIndexError>;

    /// Count documents of `kind`, or of every kind when `None`.
    async fn count_by_kind(&self, index: &str, kind: Option<EntityKind>) -> Result<u64, SearchIndexError>;

    /// Make recent writes to `index` visible to search.
    async fn refresh(&self, index: &str) -> Result<(), SearchIndexError>;

    /// Check that the search engine is reachable and healthy.
    async fn health_check(&self) -> Result<bool, SearchIndexError>;
}
