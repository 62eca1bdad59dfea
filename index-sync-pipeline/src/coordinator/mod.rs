//! Coordinator module for the synchronization pipeline.
//!
//! Resolves the run configuration, fans a dispatcher out per entity kind and
//! folds their outcomes into a `SyncSummary`.

use std::collections::HashMap;
use std::sync::Arc;

use chrono::Utc;
use futures::future::join_all;
use tokio::sync::Semaphore;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, info_span, Instrument};
use uuid::Uuid;

use crate::config::{ConcurrencyLimit, SyncOptions, SyncSettings};
use crate::dispatcher::{DispatchOptions, Dispatcher};
use crate::errors::PipelineError;
use index_sync_repository::{SearchIndexClient, SearchIndexConfig, SearchIndexProvider};
use index_sync_shared::{EntityKind, KindSummary, SyncSummary};
use index_sync_store::RecordSource;

/// Top-level entry point of a synchronization run.
///
/// The coordinator:
/// - Rejects invalid run configuration before any record is read
/// - Shares one concurrency limit across every kind of a run
/// - Records a kind that cannot be read as a kind-level failure
/// - Never fails a run because of a record-level failure
pub struct Coordinator {
    sources: HashMap<EntityKind, Arc<dyn RecordSource>>,
    provider: Arc<dyn SearchIndexProvider>,
    settings: SyncSettings,
    cancel: CancellationToken,
}

impl Coordinator {
    /// Create a coordinator writing through `provider`, with no record sources.
    pub fn new(provider: Arc<dyn SearchIndexProvider>, settings: SyncSettings) -> Self {
        Self {
            sources: HashMap::new(),
            provider,
            settings,
            cancel: CancellationToken::new(),
        }
    }

    /// Read records of `kind` from `source`.
    pub fn with_source(mut self, kind: EntityKind, source: Arc<dyn RecordSource>) -> Self {
        self.sources.insert(kind, source);
        self
    }

    /// Read records of every kind in `kinds` from `source`.
    pub fn with_sources(
        mut self,
        kinds: impl IntoIterator<Item = EntityKind>,
        source: Arc<dyn RecordSource>,
    ) -> Self {
        for kind in kinds {
            self.sources.insert(kind, source.clone());
        }
        self
    }

    pub fn settings(&self) -> &SyncSettings {
        &self.settings
    }

    /// Token that stops the current and any later run when cancelled.
    pub fn cancellation_token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    /// Synchronize every kind that produces search documents.
    pub async fn synchronize_all(&self, options: &SyncOptions) -> Result<SyncSummary, PipelineError> {
        self.synchronize(&EntityKind::SYNCHRONIZED, options).await
    }

    /// Synchronize `kinds` into `options.index_name`.
    ///
    /// # Returns
    ///
    /// * `Ok(SyncSummary)` - One entry per distinct kind, in the order given
    /// * `Err(PipelineError::Configuration)` - If the concurrency limit is invalid
    pub async fn synchronize(
        &self,
        kinds: &[EntityKind],
        options: &SyncOptions,
    ) -> Result<SyncSummary, PipelineError> {
        let limit = ConcurrencyLimit::resolve(
            options.es_request_concurrency.as_ref(),
            self.settings.default_concurrency.as_deref(),
        )?;

        let run_id = Uuid::new_v4();
        let span = info_span!(
            "sync_run",
            run_id = %run_id,
            index_name = %options.index_name,
            concurrency = limit.get()
        );

        self.run(run_id, limit, distinct(kinds), options)
            .instrument(span)
            .await
    }

    async fn run(
        &self,
        run_id: Uuid,
        limit: ConcurrencyLimit,
        kinds: Vec<EntityKind>,
        options: &SyncOptions,
    ) -> Result<SyncSummary, PipelineError> {
        let started_at = Utc::now();
        info!(kinds = kinds.len(), "Starting synchronization");

        let client = SearchIndexClient::with_config(
            self.provider.clone(),
            options.index_name.clone(),
            SearchIndexConfig::default().request_timeout(self.settings.request_timeout),
        );
        let permits = Arc::new(Semaphore::new(limit.get()));
        let dispatch = DispatchOptions {
            range: options.range,
            page_size: self.settings.page_size,
            relation_policy: options
                .relation_policy
                .unwrap_or(self.settings.relation_policy),
        };

        let runs = kinds.into_iter().map(|kind| {
            let client = client.clone();
            let permits = permits.clone();
            async move {
                let summary = match self.sources.get(&kind) {
                    Some(source) => {
                        Dispatcher::new(source.clone(), client, permits, self.cancel.clone())
                            .run(kind, &dispatch)
                            .await
                            .into_summary()
                    }
                    None => KindSummary::kind_failure(
                        kind,
                        format!("no record source configured for {}", kind),
                    ),
                };
                log_kind(&summary);
                summary
            }
        });
        let kinds = join_all(runs).await;

        let summary = SyncSummary {
            run_id,
            index_name: options.index_name.clone(),
            started_at,
            finished_at: Utc::now(),
            kinds,
        };

        info!(
            attempted = summary.attempted(),
            succeeded = summary.succeeded(),
            failed = summary.failed(),
            failed_kinds = summary.failed_kinds().count(),
            "Synchronization complete"
        );

        Ok(summary)
    }
}

fn log_kind(summary: &KindSummary) {
    match &summary.error {
        Some(err) => error!(
            kind = %summary.kind,
            attempted = summary.attempted,
            succeeded = summary.succeeded,
            failed = summary.failed,
            error = %err,
            "Kind failed"
        ),
        None => info!(
            kind = %summary.kind,
            attempted = summary.attempted,
            succeeded = summary.succeeded,
            failed = summary.failed,
            cancelled = summary.cancelled,
            "Kind synchronized"
        ),
    }
}

fn distinct(kinds: &[EntityKind]) -> Vec<EntityKind> {
    let mut seen = Vec::with_capacity(kinds.len());
    for kind in kinds {
        if !seen.contains(kind) {
            seen.push(*kind);
        }
    }
    seen
}
