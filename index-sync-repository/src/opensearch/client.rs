//! OpenSearch client implementation.
//!
//! This module provides the concrete implementation of `SearchIndexProvider`
//! using the OpenSearch Rust client.

use async_trait::async_trait;
use opensearch::{
    cluster::ClusterHealthParts,
    http::response::Response,
    http::transport::{SingleNodeConnectionPool, TransportBuilder},
    indices::{IndicesCreateParts, IndicesExistsParts, IndicesRefreshParts},
    BulkParts, CountParts, DeleteParts, IndexParts, OpenSearch, SearchParts,
};
use serde_json::{json, Value};
use tracing::{debug, error, info, instrument, warn};
use url::Url;

use super::bulk::{self, DELETE_ACTION, INDEX_ACTION};
use crate::errors::SearchIndexError;
use crate::interfaces::SearchIndexProvider;
use crate::types::{AliasAction, BatchOperationSummary, DocumentRef};
use index_sync_shared::{EntityKind, SearchDocument};

/// OpenSearch client implementation.
///
/// # Example
///
/// ```ignore
/// let client = OpenSearchClient::new("http://localhost:9200").await?;
/// let document = SearchDocument::new(EntityKind::Provider, "s3_provider", json!({ "id": "s3_provider" }));
///
/// // Replaces any existing provider document with the same key
/// client.upsert_document("cumulus", &document).await?;
/// ```
pub struct OpenSearchClient {
    client: OpenSearch,
}

impl OpenSearchClient {
    /// Create a new OpenSearch client connected to the specified URL.
    ///
    /// # Arguments
    ///
    /// * `url` - The OpenSearch server URL (e.g., "http://localhost:9200")
    ///
    /// # Returns
    ///
    /// * `Ok(OpenSearchClient)` - A new client instance
    /// * `Err(SearchIndexError)` - If connection setup fails
    pub async fn new(url: &str) -> Result<Self, SearchIndexError> {
        let parsed_url =
            Url::parse(url).map_err(|e| SearchIndexError::connection(e.to_string()))?;

        let conn_pool = SingleNodeConnectionPool::new(parsed_url);
        let transport = TransportBuilder::new(conn_pool)
            .disable_proxy()
            .build()
            .map_err(|e| SearchIndexError::connection(e.to_string()))?;

        let client = OpenSearch::new(transport);

        info!(url = %url, "Created OpenSearch client");

        Ok(Self { client })
    }

    /// Read the body of a non-success response for error reporting.
    async fn failure_body(response: Response) -> String {
        response.text().await.unwrap_or_default()
    }

    fn kind_query(kind: Option<EntityKind>) -> Value {
        match kind {
            Some(kind) => json!({ "term": { "kind": kind.as_str() } }),
            None => json!({ "match_all": {} }),
        }
    }
}

#[async_trait]
impl SearchIndexProvider for OpenSearchClient {
    /// Write a document with the index API so that it fully replaces any
    /// existing document with the same ID.
    async fn upsert_document(&self, index: &str, document: &SearchDocument) -> Result<(), SearchIndexError> {
        let doc_id = document.document_id();

        let response = self
            .client
            .index(IndexParts::IndexId(index, &doc_id))
            .body(document)
            .send()
            .await
            .map_err(|e| SearchIndexError::index(e.to_string()))?;

        let status = response.status_code();
        if !status.is_success() {
            let error_body = Self::failure_body(response).await;
            warn!(doc_id = %doc_id, status = %status, body = %error_body, "Index request failed");
            return Err(SearchIndexError::index(format!(
                "Index of {} failed with status {}: {}",
                doc_id, status, error_body
            )));
        }

        debug!(doc_id = %doc_id, "Document indexed");
        Ok(())
    }

    /// Delete a document from the search index.
    ///
    /// A 404 means the document was already absent and is not an error.
    async fn delete_document(&self, index: &str, document: &DocumentRef) -> Result<(), SearchIndexError> {
        let doc_id = document.document_id();

        let response = self
            .client
            .delete(DeleteParts::IndexId(index, &doc_id))
            .send()
            .await
            .map_err(|e| SearchIndexError::delete(e.to_string()))?;

        let status = response.status_code();

        if !status.is_success() && status.as_u16() != 404 {
            let error_body = Self::failure_body(response).await;
            error!(status = %status, body = %error_body, "Delete request failed");
            return Err(SearchIndexError::delete(format!(
                "Delete failed with status {}: {}",
                status, error_body
            )));
        }

        debug!(doc_id = %doc_id, "Document deleted");
        Ok(())
    }

    #[instrument(skip(self, documents), fields(count = documents.len()))]
    async fn bulk_upsert_documents(
        &self,
        index: &str,
        documents: &[SearchDocument],
    ) -> Result<BatchOperationSummary, SearchIndexError> {
        if documents.is_empty() {
            return Ok(BatchOperationSummary::empty());
        }

        let (body, ids) = bulk::upsert_body(documents)?;

        let response = self
            .client
            .bulk(BulkParts::Index(index))
            .body(body)
            .send()
            .await
            .map_err(|e| SearchIndexError::bulk_operation(e.to_string()))?;

        let status = response.status_code();
        if !status.is_success() {
            let error_body = Self::failure_body(response).await;
            error!(status = %status, body = %error_body, "Bulk request failed");
            return Err(SearchIndexError::bulk_operation(format!(
                "Bulk failed with status {}: {}",
                status, error_body
            )));
        }

        let response_body: Value = response
            .json()
            .await
            .map_err(|e| SearchIndexError::bulk_operation(e.to_string()))?;

        let summary = bulk::summarize(INDEX_ACTION, &ids, &response_body);
        if summary.failed > 0 {
            warn!(failed = summary.failed, total = summary.total, "Bulk upsert had item failures");
        }
        Ok(summary)
    }

    #[instrument(skip(self, documents), fields(count = documents.len()))]
    async fn bulk_delete_documents(
        &self,
        index: &str,
        documents: &[DocumentRef],
    ) -> Result<BatchOperationSummary, SearchIndexError> {
        if documents.is_empty() {
            return Ok(BatchOperationSummary::empty());
        }

        let (body, ids) = bulk::delete_body(documents);

        let response = self
            .client
            .bulk(BulkParts::Index(index))
            .body(body)
            .send()
            .await
            .map_err(|e| SearchIndexError::bulk_operation(e.to_string()))?;

        let status = response.status_code();
        if !status.is_success() {
            let error_body = Self::failure_body(response).await;
            error!(status = %status, body = %error_body, "Bulk request failed");
            return Err(SearchIndexError::bulk_operation(format!(
                "Bulk failed with status {}: {}",
                status, error_body
            )));
        }

        let response_body: Value = response
            .json()
            .await
            .map_err(|e| SearchIndexError::bulk_operation(e.to_string()))?;

        Ok(bulk::summarize(DELETE_ACTION, &ids, &response_body))
    }

    async fn index_exists(&self, index: &str) -> Result<bool, SearchIndexError> {
        let response = self
            .client
            .indices()
            .exists(IndicesExistsParts::Index(&[index]))
            .send()
            .await
            .map_err(|e| SearchIndexError::admin(e.to_string()))?;

        match response.status_code().as_u16() {
            200 => Ok(true),
            404 => Ok(false),
            status => Err(SearchIndexError::admin(format!(
                "Exists check for {} returned status {}",
                index, status
            ))),
        }
    }

    async fn create_index(&self, index: &str, settings: &Value) -> Result<(), SearchIndexError> {
        let response = self
            .client
            .indices()
            .create(IndicesCreateParts::Index(index))
            .body(settings)
            .send()
            .await
            .map_err(|e| SearchIndexError::admin(e.to_string()))?;

        let status = response.status_code();
        if !status.is_success() {
            let error_body = Self::failure_body(response).await;
            return Err(SearchIndexError::admin(format!(
                "Create of {} failed with status {}: {}",
                index, status, error_body
            )));
        }

        info!(index = %index, "Created index");
        Ok(())
    }

    async fn update_aliases(&self, actions: &[AliasAction]) -> Result<(), SearchIndexError> {
        let actions: Vec<Value> = actions.iter().map(AliasAction::to_json).collect();

        let response = self
            .client
            .indices()
            .update_aliases()
            .body(json!({ "actions": actions }))
            .send()
            .await
            .map_err(|e| SearchIndexError::admin(e.to_string()))?;

        let status = response.status_code();
        let body: Value = response
            .json()
            .await
            .map_err(|e| SearchIndexError::admin(e.to_string()))?;

        let acknowledged = body
            .get("acknowledged")
            .and_then(Value::as_bool)
            .unwrap_or(false);
        if !status.is_success() || !acknowledged {
            return Err(SearchIndexError::admin(format!(
                "Alias update was not acknowledged (status {}): {}",
                status, body
            )));
        }

        info!(actions = actions.len(), "Updated aliases");
        Ok(())
    }

    async fn search_by_kind(
        &self,
        index: &str,
        kind: EntityKind,
        size: usize,
    ) -> Result<Vec<SearchDocument>, SearchIndexError> {
        let response = self
            .client
            .search(SearchParts::Index(&[index]))
            .body(json!({
                "query": Self::kind_query(Some(kind)),
                "sort": [ { "key": "asc" } ],
                "size": size
            }))
            .send()
            .await
            .map_err(|e| SearchIndexError::query(e.to_string()))?;

        let status = response.status_code();
        if !status.is_success() {
            let error_body = Self::failure_body(response).await;
            return Err(SearchIndexError::query(format!(
                "Search failed with status {}: {}",
                status, error_body
            )));
        }

        let body: Value = response
            .json()
            .await
            .map_err(|e| SearchIndexError::query(e.to_string()))?;

        let hits = body
            .get("hits")
            .and_then(|h| h.get("hits"))
            .and_then(Value::as_array)
            .cloned()
            .unwrap_or_default();

        hits.into_iter()
            .map(|mut hit| {
                let source = hit.get_mut("_source").map(Value::take).unwrap_or(Value::Null);
                serde_json::from_value(source).map_err(|e| SearchIndexError::query(e.to_string()))
            })
            .collect()
    }

    async fn count_by_kind(&self, index: &str, kind: Option<EntityKind>) -> Result<u64, SearchIndexError> {
        let response = self
            .client
            .count(CountParts::Index(&[index]))
            .body(json!({ "query": Self::kind_query(kind) }))
            .send()
            .await
            .map_err(|e| SearchIndexError::query(e.to_string()))?;

        let status = response.status_code();
        if !status.is_success() {
            let error_body = Self::failure_body(response).await;
            return Err(SearchIndexError::query(format!(
                "Count failed with status {}: {}",
                status, error_body
            )));
        }

        let body: Value = response
            .json()
            .await
            .map_err(|e| SearchIndexError::query(e.to_string()))?;

        body.get("count")
            .and_then(Value::as_u64)
            .ok_or_else(|| SearchIndexError::query(format!("Count response without count: {}", body)))
    }

    async fn refresh(&self, index: &str) -> Result<(), SearchIndexError> {
        let response = self
            .client
            .indices()
            .refresh(IndicesRefreshParts::Index(&[index]))
            .send()
            .await
            .map_err(|e| SearchIndexError::admin(e.to_string()))?;

        let status = response.status_code();
        if !status.is_success() {
            return Err(SearchIndexError::admin(format!(
                "Refresh of {} failed with status {}",
                index, status
            )));
        }
        Ok(())
    }

    async fn health_check(&self) -> Result<bool, SearchIndexError> {
        let response = self
            .client
            .cluster()
            .health(ClusterHealthParts::None)
            .send()
            .await
            .map_err(|e| SearchIndexError::connection(e.to_string()))?;

        let health: Value = response
            .json()
            .await
            .map_err(|e| SearchIndexError::connection(e.to_string()))?;
        let status = health
            .get("status")
            .and_then(Value::as_str)
            .unwrap_or("unknown");

        info!(status = %status, "OpenSearch cluster status");
        Ok(status == "green" || status == "yellow")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_query() {
        assert_eq!(
            OpenSearchClient::kind_query(Some(EntityKind::ReconciliationReport)),
            json!({ "term": { "kind": "reconciliationReport" } })
        );
        assert_eq!(
            OpenSearchClient::kind_query(None),
            json!({ "match_all": {} })
        );
    }

    #[tokio::test]
    async fn test_new_rejects_invalid_url() {
        let result = OpenSearchClient::new("not a url").await;
        assert!(matches!(result, Err(SearchIndexError::ConnectionError(_))));
    }
}
