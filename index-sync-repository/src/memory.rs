//! In-memory search index.
//!
//! Behaves like a single-node cluster with auto-created indices: aliases
//! resolve to their index, writes replace by `_id`, and deleting a missing
//! document succeeds. Used for dry runs and tests.

use std::collections::{BTreeMap, HashMap};

use async_trait::async_trait;
use serde_json::Value;
use tokio::sync::Mutex;

use crate::errors::SearchIndexError;
use crate::interfaces::SearchIndexProvider;
use crate::types::{AliasAction, BatchOperationResult, BatchOperationSummary, DocumentRef};
use index_sync_shared::{EntityKind, SearchDocument};

#[derive(Default)]
struct State {
    indices: HashMap<String, BTreeMap<String, SearchDocument>>,
    aliases: HashMap<String, String>,
}

impl State {
    fn resolve<'a>(&'a self, name: &'a str) -> &'a str {
        self.aliases.get(name).map_or(name, String::as_str)
    }
}

#[derive(Default)]
pub struct InMemorySearchIndex {
    state: Mutex<State>,
}

impl InMemorySearchIndex {
    pub fn new() -> Self {
        Self::default()
    }

    /// Every document in `index`, ordered by `_id`.
    pub async fn documents(&self, index: &str) -> Vec<SearchDocument> {
        let state = self.state.lock().await;
        state
            .indices
            .get(state.resolve(index))
            .map(|documents| documents.values().cloned().collect())
            .unwrap_or_default()
    }

    /// Look up a document by kind and key.
    pub async fn get(&self, index: &str, kind: EntityKind, key: &str) -> Option<SearchDocument> {
        let state = self.state.lock().await;
        state
            .indices
            .get(state.resolve(index))
            .and_then(|documents| documents.get(&SearchDocument::id_for(kind, key)))
            .cloned()
    }

    /// The index an alias points to.
    pub async fn alias_target(&self, alias: &str) -> Option<String> {
        self.state.lock().await.aliases.get(alias).cloned()
    }
}

#[async_trait]
impl SearchIndexProvider for InMemorySearchIndex {
    async fn upsert_document(&self, index: &str, document: &SearchDocument) -> Result<(), SearchIndexError> {
        let mut state = self.state.lock().await;
        let target = state.resolve(index).to_string();
        state
            .indices
            .entry(target)
            .or_default()
            .insert(document.document_id(), document.clone());
        Ok(())
    }

    async fn delete_document(&self, index: &str, document: &DocumentRef) -> Result<(), SearchIndexError> {
        let mut state = self.state.lock().await;
        let target = state.resolve(index).to_string();
        if let Some(documents) = state.indices.get_mut(&target) {
            documents.remove(&document.document_id());
        }
        Ok(())
    }

    async fn bulk_upsert_documents(
        &self,
        index: &str,
        documents: &[SearchDocument],
    ) -> Result<BatchOperationSummary, SearchIndexError> {
        let mut results = Vec::with_capacity(documents.len());
        for document in documents {
            self.upsert_document(index, document).await?;
            results.push(BatchOperationResult::succeeded(document.document_id()));
        }
        Ok(BatchOperationSummary::from_results(results))
    }

    async fn bulk_delete_documents(
        &self,
        index: &str,
        documents: &[DocumentRef],
    ) -> Result<BatchOperationSummary, SearchIndexError> {
        let mut results = Vec::with_capacity(documents.len());
        for document in documents {
            self.delete_document(index, document).await?;
            results.push(BatchOperationResult::succeeded(document.document_id()));
        }
        Ok(BatchOperationSummary::from_results(results))
    }

    async fn index_exists(&self, index: &str) -> Result<bool, SearchIndexError> {
        let state = self.state.lock().await;
        Ok(state.aliases.contains_key(index) || state.indices.contains_key(index))
    }

    async fn create_index(&self, index: &str, _settings: &Value) -> Result<(), SearchIndexError> {
        let mut state = self.state.lock().await;
        if state.indices.contains_key(index) {
            return Err(SearchIndexError::admin(format!(
                "resource_already_exists_exception: index [{}] already exists",
                index
            )));
        }
        state.indices.insert(index.to_string(), BTreeMap::new());
        Ok(())
    }

    async fn update_aliases(&self, actions: &[AliasAction]) -> Result<(), SearchIndexError> {
        let mut state = self.state.lock().await;

        // Validate every action first so a rejected update leaves aliases untouched.
        for action in actions {
            let (AliasAction::Add { index, .. } | AliasAction::Remove { index, .. }) = action;
            if !state.indices.contains_key(index) {
                return Err(SearchIndexError::admin(format!(
                    "index_not_found_exception: no such index [{}]",
                    index
                )));
            }
        }

        for action in actions {
            match action {
                AliasAction::Add { index, alias } => {
                    state.aliases.insert(alias.clone(), index.clone());
                }
                AliasAction::Remove { index, alias } => {
                    if state.aliases.get(alias) == Some(index) {
                        state.aliases.remove(alias);
                    }
                }
            }
        }
        Ok(())
    }

    async fn search_by_kind(
        &self,
        index: &str,
        kind: EntityKind,
        size: usize,
    ) -> Result<Vec<SearchDocument>, SearchIndexError> {
        let state = self.state.lock().await;
        let mut documents: Vec<SearchDocument> = state
            .indices
            .get(state.resolve(index))
            .into_iter()
            .flat_map(BTreeMap::values)
            .filter(|document| document.kind == kind)
            .cloned()
            .collect();
        documents.sort_by(|a, b| a.key.cmp(&b.key));
        documents.truncate(size);
        Ok(documents)
    }

    async fn count_by_kind(&self, index: &str, kind: Option<EntityKind>) -> Result<u64, SearchIndexError> {
        let state = self.state.lock().await;
        let count = state
            .indices
            .get(state.resolve(index))
            .into_iter()
            .flat_map(BTreeMap::values)
            .filter(|document| kind.map_or(true, |kind| document.kind == kind))
            .count();
        Ok(count as u64)
    }

    async fn refresh(&self, _index: &str) -> Result<(), SearchIndexError> {
        Ok(())
    }

    async fn health_check(&self) -> Result<bool, SearchIndexError> {
        Ok(true)
    }
}
