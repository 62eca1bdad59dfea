//! Concurrency-bounded dispatch of one entity kind.
//!
//! The dispatcher streams the records of a kind, takes one permit from the
//! run-wide semaphore per record and spawns a task that resolves relations,
//! maps the record and writes its document. Every task ends in a
//! `SyncOutcome`; nothing a single record does can stop its siblings.

mod relations;

use std::any::Any;
use std::collections::HashMap;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;

use futures::{FutureExt, StreamExt};
use tokio::sync::Semaphore;
use tokio::task::{JoinError, JoinSet};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, instrument, warn};

use crate::config::{RelationPolicy, DEFAULT_PAGE_SIZE};
use crate::errors::RecordError;
use crate::mapper::map_record;
use index_sync_repository::SearchIndexClient;
use index_sync_shared::{
    EntityKind, FailureReason, KindSummary, SyncFailure, SyncOutcome, UpdatedAtRange,
};
use index_sync_store::{EntityRecord, RecordSource, StoreError};

/// Per-kind options derived from the run options and process settings.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DispatchOptions {
    pub range: UpdatedAtRange,
    pub page_size: usize,
    pub relation_policy: RelationPolicy,
}

impl Default for DispatchOptions {
    fn default() -> Self {
        Self {
            range: UpdatedAtRange::unbounded(),
            page_size: DEFAULT_PAGE_SIZE,
            relation_policy: RelationPolicy::default(),
        }
    }
}

/// Everything one kind produced during a run.
///
/// Outcomes are folded into counts as records finish; only failures are kept.
#[derive(Debug)]
pub struct KindRun {
    pub kind: EntityKind,
    results: KindSummary,
    /// The error that ended the record stream early, if any.
    pub stream_error: Option<StoreError>,
    /// Whether reading stopped because the run was cancelled.
    pub cancelled: bool,
}

impl KindRun {
    fn new(kind: EntityKind) -> Self {
        Self {
            kind,
            results: KindSummary::new(kind),
            stream_error: None,
            cancelled: false,
        }
    }

    fn record(&mut self, outcome: SyncOutcome) {
        self.results.record(outcome);
    }

    /// Records dispatched and finished.
    pub fn attempted(&self) -> usize {
        self.results.attempted
    }

    pub fn succeeded(&self) -> usize {
        self.results.succeeded
    }

    pub fn failures(&self) -> &[SyncFailure] {
        &self.results.failures
    }

    /// Fold the run into its summary. A stream error becomes the kind-level error.
    pub fn into_summary(self) -> KindSummary {
        let mut summary = self.results;
        summary.error = self.stream_error.map(|err| err.to_string());
        summary.cancelled = self.cancelled;
        summary
    }
}

/// A dispatched record whose task has not reported back.
#[derive(Debug)]
struct PendingRecord {
    kind: EntityKind,
    key: String,
    cumulus_id: Option<i64>,
}

/// Dispatched records keyed by dispatch sequence number.
///
/// Whatever is left once every task has been joined belongs to tasks that
/// ended without an outcome.
#[derive(Debug, Default)]
struct InFlight {
    next: u64,
    records: HashMap<u64, PendingRecord>,
}

impl InFlight {
    fn dispatch(&mut self, record: &EntityRecord) -> u64 {
        let sequence = self.next;
        self.next += 1;
        self.records.insert(
            sequence,
            PendingRecord {
                kind: record.kind(),
                key: record.natural_key(),
                cumulus_id: record.cumulus_id(),
            },
        );
        sequence
    }

    fn collect(&mut self, run: &mut KindRun, joined: Result<(u64, SyncOutcome), JoinError>) {
        match joined {
            Ok((sequence, outcome)) => {
                self.records.remove(&sequence);
                run.record(outcome);
            }
            Err(err) => error!(error = %err, "Record task ended without an outcome"),
        }
    }

    /// Count every record still pending as failed.
    fn abandon(self, run: &mut KindRun) {
        for pending in self.records.into_values() {
            warn!(kind = %pending.kind, key = %pending.key, "Record task was aborted");
            run.record(SyncOutcome::failed(
                pending.kind,
                pending.key,
                pending.cumulus_id,
                FailureReason::Aborted,
                "record task ended without an outcome",
            ));
        }
    }
}

/// Streams one kind into the index under a shared concurrency limit.
#[derive(Clone)]
pub struct Dispatcher {
    source: Arc<dyn RecordSource>,
    client: SearchIndexClient,
    permits: Arc<Semaphore>,
    cancel: CancellationToken,
}

impl Dispatcher {
    /// Create a dispatcher.
    ///
    /// # Arguments
    ///
    /// * `source` - Store the records and their relations are read from
    /// * `client` - Index client every document is written through
    /// * `permits` - Semaphore shared by every kind of the run
    /// * `cancel` - Stops new reads and writes when cancelled
    pub fn new(
        source: Arc<dyn RecordSource>,
        client: SearchIndexClient,
        permits: Arc<Semaphore>,
        cancel: CancellationToken,
    ) -> Self {
        Self {
            source,
            client,
            permits,
            cancel,
        }
    }

    /// Synchronize every record of `kind` in `options.range`.
    ///
    /// Returns once the stream is drained, has failed or the run was
    /// cancelled, and every dispatched record has finished.
    #[instrument(skip_all, fields(kind = %kind, index = %self.client.index_name()))]
    pub async fn run(&self, kind: EntityKind, options: &DispatchOptions) -> KindRun {
        let mut run = KindRun::new(kind);
        let mut stream = self.source.stream(kind, options.range, options.page_size);
        let mut tasks = JoinSet::new();
        let mut in_flight = InFlight::default();

        loop {
            let next = tokio::select! {
                biased;
                _ = self.cancel.cancelled() => {
                    run.cancelled = true;
                    break;
                }
                next = stream.next() => next,
            };

            let record = match next {
                Some(Ok(record)) => record,
                Some(Err(err)) => {
                    error!(error = %err, "Record stream failed");
                    run.stream_error = Some(err);
                    break;
                }
                None => break,
            };

            let permit = tokio::select! {
                biased;
                _ = self.cancel.cancelled() => {
                    run.cancelled = true;
                    break;
                }
                permit = self.permits.clone().acquire_owned() => match permit {
                    Ok(permit) => permit,
                    Err(_) => {
                        // Closed semaphore: the run is shutting down.
                        run.cancelled = true;
                        break;
                    }
                },
            };

            let source = self.source.clone();
            let client = self.client.clone();
            let policy = options.relation_policy;
            let sequence = in_flight.dispatch(&record);
            tasks.spawn(async move {
                let outcome = sync_record(source, client, record, policy).await;
                drop(permit);
                (sequence, outcome)
            });

            while let Some(joined) = tasks.try_join_next() {
                in_flight.collect(&mut run, joined);
            }
        }

        if run.cancelled {
            debug!(in_flight = tasks.len(), "Cancelled; waiting for dispatched records");
        }
        while let Some(joined) = tasks.join_next().await {
            in_flight.collect(&mut run, joined);
        }
        in_flight.abandon(&mut run);

        run
    }
}

/// Resolve, map and write one record, converting every failure into an outcome.
async fn sync_record(
    source: Arc<dyn RecordSource>,
    client: SearchIndexClient,
    record: EntityRecord,
    policy: RelationPolicy,
) -> SyncOutcome {
    let kind = record.kind();
    let key = record.natural_key();

    let result = AssertUnwindSafe(write_document(source.as_ref(), &client, &record, policy))
        .catch_unwind()
        .await
        .unwrap_or_else(|panic| Err(RecordError::Panicked(panic_message(panic))));

    match result {
        Ok(()) => SyncOutcome::indexed(kind, key),
        Err(err) => {
            let reason = err.reason();
            warn!(
                kind = %kind,
                key = %key,
                cumulus_id = ?record.cumulus_id(),
                reason = %reason,
                error = %err,
                "Failed to index record"
            );
            SyncOutcome::failed(kind, key, record.cumulus_id(), reason, err.to_string())
        }
    }
}

async fn write_document(
    source: &dyn RecordSource,
    client: &SearchIndexClient,
    record: &EntityRecord,
    policy: RelationPolicy,
) -> Result<(), RecordError> {
    let related = relations::resolve_related(source, record).await?;
    let document = map_record(record, &related, policy)?;
    client.upsert(&document).await?;
    Ok(())
}

fn panic_message(panic: Box<dyn Any + Send>) -> String {
    panic
        .downcast_ref::<&str>()
        .map(|s| s.to_string())
        .or_else(|| panic.downcast_ref::<String>().cloned())
        .unwrap_or_else(|| "unknown panic".to_string())
}
