//! The payload that starts a synchronization run.

use std::io::Read;
use std::path::Path;

use serde::Deserialize;
use serde_json::Value;

use crate::IndexingError;
use index_sync_pipeline::{RelationPolicy, SyncOptions};
use index_sync_shared::{EntityKind, UpdatedAtRange};

/// Store handles named by the trigger.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TriggerTables {
    /// JSON-lines export holding the reconciliation reports.
    #[serde(default)]
    pub reconciliation_reports_table: Option<String>,
}

/// A synchronization request.
///
/// ```json
/// { "indexName": "cumulus", "esRequestConcurrency": 20, "updatedAtFrom": "2024-01-01T00:00:00Z" }
/// ```
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SyncTrigger {
    pub index_name: String,
    #[serde(default)]
    pub tables: TriggerTables,
    /// Kept as raw JSON; validated when the run starts.
    #[serde(default)]
    pub es_request_concurrency: Option<Value>,
    #[serde(flatten)]
    pub range: UpdatedAtRange,
    #[serde(default)]
    pub relation_policy: Option<RelationPolicy>,
    /// Kinds to synchronize; every synchronized kind with a store when absent.
    #[serde(default)]
    pub kinds: Option<Vec<EntityKind>>,
    /// Create the index before the run when it does not exist.
    #[serde(default)]
    pub create_index: bool,
}

impl SyncTrigger {
    /// Read a trigger from `path`, or from stdin when no path is given.
    pub fn read(path: Option<&Path>) -> Result<Self, IndexingError> {
        let raw = match path {
            Some(path) => std::fs::read_to_string(path)?,
            None => {
                let mut raw = String::new();
                std::io::stdin().read_to_string(&mut raw)?;
                raw
            }
        };
        Self::parse(&raw)
    }

    pub fn parse(raw: &str) -> Result<Self, IndexingError> {
        let trigger: Self = serde_json::from_str(raw)?;
        if trigger.index_name.trim().is_empty() {
            return Err(IndexingError::config("indexName is required"));
        }
        Ok(trigger)
    }

    /// Options for the coordinator run.
    pub fn options(&self) -> SyncOptions {
        let mut options = SyncOptions::new(self.index_name.as_str()).with_range(self.range);
        options.es_request_concurrency = self.es_request_concurrency.clone();
        options.relation_policy = self.relation_policy;
        options
    }

    /// The kinds this run covers.
    ///
    /// Reconciliation reports are only included by default when the trigger
    /// names their table.
    pub fn kinds(&self) -> Vec<EntityKind> {
        match &self.kinds {
            Some(kinds) => kinds.clone(),
            None => EntityKind::SYNCHRONIZED
                .into_iter()
                .filter(|kind| {
                    kind.is_relational() || self.tables.reconciliation_reports_table.is_some()
                })
                .collect(),
        }
    }
}
