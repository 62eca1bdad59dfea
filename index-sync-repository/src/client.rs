//! Search index client implementation.
//!
//! This module provides the main client for interacting with one search index.
//! The synchronization pipeline writes documents through it; operators use it
//! to bootstrap the index and swap aliases between index generations.

use std::future::Future;
use std::sync::Arc;

use tracing::{debug, info, instrument};

use crate::config::SearchIndexConfig;
use crate::errors::SearchIndexError;
use crate::interfaces::SearchIndexProvider;
use crate::opensearch::IndexConfig;
use crate::types::{AliasAction, BatchOperationSummary, DocumentRef};
use index_sync_shared::{EntityKind, SearchDocument};

/// The main client for interacting with the search index.
///
/// Every write is bounded by `SearchIndexConfig::request_timeout`; a write
/// that does not finish in time fails with `SearchIndexError::Timeout`.
#[derive(Clone)]
pub struct SearchIndexClient {
    provider: Arc<dyn SearchIndexProvider>,
    index_name: String,
    config: SearchIndexConfig,
}

impl SearchIndexClient {
    /// Create a new SearchIndexClient with default configuration.
    pub fn new(provider: Arc<dyn SearchIndexProvider>, index_name: impl Into<String>) -> Self {
        Self::with_config(provider, index_name, SearchIndexConfig::default())
    }

    /// Create a new SearchIndexClient with custom configuration.
    pub fn with_config(
        provider: Arc<dyn SearchIndexProvider>,
        index_name: impl Into<String>,
        config: SearchIndexConfig,
    ) -> Self {
        Self {
            provider,
            index_name: index_name.into(),
            config,
        }
    }

    pub fn index_name(&self) -> &str {
        &self.index_name
    }

    pub fn config(&self) -> &SearchIndexConfig {
        &self.config
    }

    /// Check if batch size exceeds the configured limit.
    fn validate_batch_size(&self, size: usize) -> Result<(), SearchIndexError> {
        if let Some(max) = self.config.max_batch_size {
            if size > max {
                return Err(SearchIndexError::batch_size_exceeded(size, max));
            }
        }
        Ok(())
    }

    fn validate_key(key: &str) -> Result<(), SearchIndexError> {
        if key.trim().is_empty() {
            return Err(SearchIndexError::validation("document key is required"));
        }
        Ok(())
    }

    async fn with_timeout<T, F>(&self, operation: &'static str, request: F) -> Result<T, SearchIndexError>
    where
        F: Future<Output = Result<T, SearchIndexError>>,
    {
        let timeout = self.config.request_timeout;
        tokio::time::timeout(timeout, request)
            .await
            .map_err(|_| SearchIndexError::timeout(operation, timeout))?
    }

    /// Write a document, replacing any previous version with the same kind and key.
    /// Input: SearchDocument (key required)
    /// Output: Result<(), SearchIndexError>
    pub async fn upsert(&self, document: &SearchDocument) -> Result<(), SearchIndexError> {
        Self::validate_key(&document.key)?;

        self.with_timeout(
            "upsert",
            self.provider.upsert_document(&self.index_name, document),
        )
        .await?;

        debug!(doc_id = %document.document_id(), "Upserted document");
        Ok(())
    }

    /// Delete a document. Deleting a document that does not exist succeeds.
    pub async fn delete(&self, kind: EntityKind, key: &str) -> Result<(), SearchIndexError> {
        Self::validate_key(key)?;

        let reference = DocumentRef::new(kind, key);
        self.with_timeout(
            "delete",
            self.provider.delete_document(&self.index_name, &reference),
        )
        .await
    }

    /// Write multiple documents in one request.
    /// Input: Vec<SearchDocument> (batch of documents to write)
    /// Output: Result<BatchOperationSummary, SearchIndexError>
    ///
    /// Individual failures are reported in the summary.
    ///
    /// The batch size is limited by the configured max_batch_size (default: 1000).
    pub async fn batch_upsert(
        &self,
        documents: Vec<SearchDocument>,
    ) -> Result<BatchOperationSummary, SearchIndexError> {
        if documents.is_empty() {
            return Ok(BatchOperationSummary::empty());
        }

        self.validate_batch_size(documents.len())?;

        for document in &documents {
            Self::validate_key(&document.key)
                .map_err(|_| SearchIndexError::validation("All documents must have a key"))?;
        }

        self.with_timeout(
            "bulk upsert",
            self.provider
                .bulk_upsert_documents(&self.index_name, &documents),
        )
        .await
    }

    /// Delete multiple documents in one request.
    ///
    /// Documents that don't exist are considered successful deletes.
    pub async fn batch_delete(
        &self,
        documents: Vec<DocumentRef>,
    ) -> Result<BatchOperationSummary, SearchIndexError> {
        if documents.is_empty() {
            return Ok(BatchOperationSummary::empty());
        }

        self.validate_batch_size(documents.len())?;

        for document in &documents {
            Self::validate_key(&document.key)
                .map_err(|_| SearchIndexError::validation("All documents must have a key"))?;
        }

        self.with_timeout(
            "bulk delete",
            self.provider
                .bulk_delete_documents(&self.index_name, &documents),
        )
        .await
    }

    /// Create the client's index when missing and point `alias` at it.
    ///
    /// Safe to call repeatedly: an existing index is left as is and re-adding
    /// an alias is a no-op.
    #[instrument(skip(self), fields(index = %self.index_name))]
    pub async fn bootstrap(&self, alias: &str, index_config: &IndexConfig) -> Result<(), SearchIndexError> {
        if !self.provider.index_exists(&self.index_name).await? {
            self.provider
                .create_index(&self.index_name, &index_config.settings())
                .await?;
            info!("Created index");
        }

        if alias != self.index_name {
            self.provider
                .update_aliases(&[AliasAction::add(self.index_name.as_str(), alias)])
                .await?;
            info!(alias = %alias, "Alias points at index");
        }

        Ok(())
    }

    /// Atomically move `alias` from index `from` to index `to`.
    #[instrument(skip(self))]
    pub async fn swap_alias(&self, alias: &str, from: &str, to: &str) -> Result<(), SearchIndexError> {
        if from == to {
            return Err(SearchIndexError::validation(
                "alias swap needs two different indices",
            ));
        }

        self.provider
            .update_aliases(&[AliasAction::remove(from, alias), AliasAction::add(to, alias)])
            .await
    }

    /// Fetch up to `size` documents of `kind`, ordered by key.
    pub async fn query_by_kind(
        &self,
        kind: EntityKind,
        size: usize,
    ) -> Result<Vec<SearchDocument>, SearchIndexError> {
        self.provider
            .search_by_kind(&self.index_name, kind, size)
            .await
    }

    /// Count documents of `kind`, or of every kind when `None`.
    pub async fn count_by_kind(&self, kind: Option<EntityKind>) -> Result<u64, SearchIndexError> {
        self.provider.count_by_kind(&self.index_name, kind).await
    }

    /// Make recent writes visible to queries.
    pub async fn refresh(&self) -> Result<(), SearchIndexError> {
        self.provider.refresh(&self.index_name).await
    }

    pub async fn health_check(&self) -> Result<bool, SearchIndexError> {
        self.provider.health_check().await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::InMemorySearchIndex;
    use crate::types::BatchOperationResult;
    use async_trait::async_trait;
    use serde_json::{json, Value};
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    /// Mock provider for testing
    struct MockProvider {
        upserts: AtomicUsize,
        delay: Option<Duration>,
        should_fail: bool,
    }

    impl MockProvider {
        fn new() -> Self {
            Self {
                upserts: AtomicUsize::new(0),
                delay: None,
                should_fail: false,
            }
        }

        fn slow(delay: Duration) -> Self {
            Self {
                delay: Some(delay),
                ..Self::new()
            }
        }

        fn failing() -> Self {
            Self {
                should_fail: true,
                ..Self::new()
            }
        }
    }

    #[async_trait]
    impl SearchIndexProvider for MockProvider {
        async fn upsert_document(&self, _index: &str, _document: &SearchDocument) -> Result<(), SearchIndexError> {
            if let Some(delay) = self.delay {
                tokio::time::sleep(delay).await;
            }
            if self.should_fail {
                return Err(SearchIndexError::index("Mock failure"));
            }
            self.upserts.fetch_add(1, Ordering::SeqCst);
            Ok(())
        }

        async fn delete_document(&self, _index: &str, _document: &DocumentRef) -> Result<(), SearchIndexError> {
            Ok(())
        }

        async fn bulk_upsert_documents(
            &self,
            _index: &str,
            documents: &[SearchDocument],
        ) -> Result<BatchOperationSummary, SearchIndexError> {
            if self.should_fail {
                return Err(SearchIndexError::bulk_operation("Mock failure"));
            }
            Ok(BatchOperationSummary::from_results(
                documents
                    .iter()
                    .map(|d| BatchOperationResult::succeeded(d.document_id()))
                    .collect(),
            ))
        }

        async fn bulk_delete_documents(
            &self,
            _index: &str,
            documents: &[DocumentRef],
        ) -> Result<BatchOperationSummary, SearchIndexError> {
            Ok(BatchOperationSummary::from_results(
                documents
                    .iter()
                    .map(|d| BatchOperationResult::succeeded(d.document_id()))
                    .collect(),
            ))
        }

        async fn index_exists(&self, _index: &str) -> Result<bool, SearchIndexError> {
            Ok(false)
        }

        async fn create_index(&self, _index: &str, _settings: &Value) -> Result<(), SearchIndexError> {
            Ok(())
        }

        async fn update_aliases(&self, _actions: &[AliasAction]) -> Result<(), SearchIndexError> {
            Ok(())
        }

        async fn search_by_kind(
            &self,
            _index: &str,
            _kind: EntityKind,
            _size: usize,
        ) -> Result<Vec<SearchDocument>, SearchIndexError> {
            Ok(vec![])
        }

        async fn count_by_kind(&self, _index: &str, _kind: Option<EntityKind>) -> Result<u64, SearchIndexError> {
            Ok(0)
        }

        async fn refresh(&self, _index: &str) -> Result<(), SearchIndexError> {
            Ok(())
        }

        async fn health_check(&self) -> Result<bool, SearchIndexError> {
            Ok(true)
        }
    }

    fn granule(key: &str) -> SearchDocument {
        SearchDocument::new(EntityKind::Granule, key, json!({ "granuleId": key }))
            .with_parent("MOD09GQ___006")
    }

    #[tokio::test]
    async fn test_upsert() {
        let provider = Arc::new(MockProvider::new());
        let client = SearchIndexClient::new(provider.clone(), "cumulus");

        client.upsert(&granule("G1")).await.unwrap();

        assert_eq!(provider.upserts.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_upsert_validation_empty_key() {
        let client = SearchIndexClient::new(Arc::new(MockProvider::new()), "cumulus");

        let result = client.upsert(&granule(" ")).await;
        assert!(matches!(result, Err(SearchIndexError::ValidationError(_))));
    }

    #[tokio::test]
    async fn test_upsert_propagates_provider_error() {
        let client = SearchIndexClient::new(Arc::new(MockProvider::failing()), "cumulus");

        let result = client.upsert(&granule("G1")).await;
        assert!(matches!(result, Err(SearchIndexError::IndexError(_))));
    }

    #[tokio::test(start_paused = true)]
    async fn test_upsert_times_out() {
        let config = SearchIndexConfig::default().request_timeout(Duration::from_millis(100));
        let client = SearchIndexClient::with_config(
            Arc::new(MockProvider::slow(Duration::from_secs(5))),
            "cumulus",
            config,
        );

        let err = client.upsert(&granule("G1")).await.unwrap_err();
        assert!(err.is_timeout());
    }

    #[tokio::test]
    async fn test_batch_upsert_empty() {
        let client = SearchIndexClient::new(Arc::new(MockProvider::new()), "cumulus");

        let result = client.batch_upsert(vec![]).await.unwrap();

        assert_eq!(result.total, 0);
        assert_eq!(result.succeeded, 0);
        assert_eq!(result.failed, 0);
        assert!(result.results.is_empty());
    }

    #[tokio::test]
    async fn test_batch_upsert_multiple() {
        let client = SearchIndexClient::new(Arc::new(MockProvider::new()), "cumulus");

        let result = client
            .batch_upsert(vec![granule("G1"), granule("G2"), granule("G3")])
            .await
            .unwrap();

        assert_eq!(result.total, 3);
        assert_eq!(result.succeeded, 3);
        assert!(result.results.iter().all(|r| r.success));
        assert_eq!(result.results[0].document_id, "granule:G1");
    }

    #[tokio::test]
    async fn test_batch_upsert_exceeds_limit() {
        let client = SearchIndexClient::with_config(
            Arc::new(MockProvider::new()),
            "cumulus",
            SearchIndexConfig::with_max_batch_size(2),
        );

        let result = client
            .batch_upsert(vec![granule("G1"), granule("G2"), granule("G3")])
            .await;

        assert!(matches!(
            result,
            Err(SearchIndexError::BatchSizeExceeded { provided: 3, max: 2 })
        ));
    }

    #[tokio::test]
    async fn test_batch_upsert_unlimited() {
        let client = SearchIndexClient::with_config(
            Arc::new(MockProvider::new()),
            "cumulus",
            SearchIndexConfig::unlimited(),
        );

        let documents: Vec<SearchDocument> = (0..1500).map(|i| granule(&format!("G{}", i))).collect();
        let result = client.batch_upsert(documents).await.unwrap();
        assert_eq!(result.succeeded, 1500);
    }

    #[tokio::test]
    async fn test_batch_delete_validation() {
        let client = SearchIndexClient::new(Arc::new(MockProvider::new()), "cumulus");

        let result = client
            .batch_delete(vec![DocumentRef::new(EntityKind::Rule, "")])
            .await;
        assert!(matches!(result, Err(SearchIndexError::ValidationError(_))));
    }

    #[tokio::test]
    async fn test_bootstrap_creates_index_and_alias() {
        let index = Arc::new(InMemorySearchIndex::new());
        let client = SearchIndexClient::new(index.clone(), "cumulus-2024-01");

        client.bootstrap("cumulus", &IndexConfig::default()).await.unwrap();
        client.bootstrap("cumulus", &IndexConfig::default()).await.unwrap();

        assert_eq!(index.alias_target("cumulus").await.as_deref(), Some("cumulus-2024-01"));
    }

    #[tokio::test]
    async fn test_swap_alias() {
        let index = Arc::new(InMemorySearchIndex::new());
        let old = SearchIndexClient::new(index.clone(), "cumulus-v1");
        let new = SearchIndexClient::new(index.clone(), "cumulus-v2");
        old.bootstrap("cumulus", &IndexConfig::default()).await.unwrap();
        new.bootstrap("cumulus-v2", &IndexConfig::default()).await.unwrap();

        new.swap_alias("cumulus", "cumulus-v1", "cumulus-v2").await.unwrap();

        assert_eq!(index.alias_target("cumulus").await.as_deref(), Some("cumulus-v2"));
        assert!(new.swap_alias("cumulus", "cumulus-v2", "cumulus-v2").await.is_err());
    }

    #[tokio::test]
    async fn test_query_and_count_by_kind() {
        let client = SearchIndexClient::new(Arc::new(InMemorySearchIndex::new()), "cumulus");
        client.upsert(&granule("G2")).await.unwrap();
        client.upsert(&granule("G1")).await.unwrap();

        let documents = client.query_by_kind(EntityKind::Granule, 10).await.unwrap();
        assert_eq!(documents.len(), 2);
        assert_eq!(documents[0].key, "G1");
        assert_eq!(documents[0].parent.as_deref(), Some("MOD09GQ___006"));

        assert_eq!(client.count_by_kind(Some(EntityKind::Granule)).await.unwrap(), 2);
        assert_eq!(client.count_by_kind(Some(EntityKind::Pdr)).await.unwrap(), 0);
    }
}
