//! In-memory record source.
//!
//! Backs reconciliation reports exported from their document store as JSON
//! lines, and stands in for PostgreSQL in tests.

use std::collections::{BTreeMap, HashMap};
use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

use async_trait::async_trait;
use futures::stream::{self, StreamExt};
use tracing::debug;

use crate::errors::StoreError;
use crate::interfaces::{RecordSource, RecordStream};
use crate::records::{EntityRecord, FileRecord, ReconciliationReportRecord};
use index_sync_shared::{EntityKind, UpdatedAtRange};

type RecordTable = BTreeMap<EntityKind, Vec<EntityRecord>>;

/// A record source holding every record in memory.
///
/// Records of each kind are streamed in insertion order, one page per read
/// of the table, so records inserted ahead of the cursor are still seen.
#[derive(Debug, Default)]
pub struct InMemoryRecordSource {
    records: Arc<RwLock<RecordTable>>,
    stream_failures: RwLock<HashMap<EntityKind, (usize, StoreError)>>,
}

impl InMemoryRecordSource {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a source holding `records`.
    pub fn with_records<I, R>(records: I) -> Self
    where
        I: IntoIterator<Item = R>,
        R: Into<EntityRecord>,
    {
        let source = Self::new();
        for record in records {
            source.insert(record);
        }
        source
    }

    /// Parse reconciliation reports from JSON lines. Blank lines are skipped.
    pub fn from_report_lines(lines: &str) -> Result<Self, StoreError> {
        let source = Self::new();
        for (number, line) in lines.lines().enumerate() {
            let line = line.trim();
            if line.is_empty() {
                continue;
            }
            let report: ReconciliationReportRecord = serde_json::from_str(line).map_err(|e| {
                StoreError::decode(format!("report on line {}: {}", number + 1, e))
            })?;
            source.insert(report);
        }
        Ok(source)
    }

    pub fn insert(&self, record: impl Into<EntityRecord>) {
        let record = record.into();
        self.write_records()
            .entry(record.kind())
            .or_default()
            .push(record);
    }

    /// Number of records held for `kind`.
    pub fn count(&self, kind: EntityKind) -> usize {
        self.read_records().get(&kind).map_or(0, Vec::len)
    }

    pub fn is_empty(&self) -> bool {
        self.read_records().values().all(Vec::is_empty)
    }

    /// Make streams of `kind` yield `error` after `after` records.
    pub fn fail_stream_after(&self, kind: EntityKind, after: usize, error: StoreError) {
        self.stream_failures
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(kind, (after, error));
    }

    fn read_records(&self) -> RwLockReadGuard<'_, RecordTable> {
        self.records.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write_records(&self) -> RwLockWriteGuard<'_, RecordTable> {
        self.records.write().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Read up to `page_size` records of `kind` in `range`, starting at position
/// `start`. Returns the page and the position to resume from.
fn read_page(
    records: &RwLock<RecordTable>,
    kind: EntityKind,
    range: &UpdatedAtRange,
    start: usize,
    page_size: usize,
) -> (Vec<EntityRecord>, usize) {
    let records = records.read().unwrap_or_else(PoisonError::into_inner);
    let Some(all) = records.get(&kind) else {
        return (Vec::new(), start);
    };

    let mut page = Vec::with_capacity(page_size.min(all.len().saturating_sub(start)));
    let mut next = start;
    for record in all.iter().skip(start) {
        if page.len() == page_size {
            break;
        }
        next += 1;
        if range.contains(&record.updated_at()) {
            page.push(record.clone());
        }
    }
    (page, next)
}

#[async_trait]
impl RecordSource for InMemoryRecordSource {
    fn stream(&self, kind: EntityKind, range: UpdatedAtRange, page_size: usize) -> RecordStream {
        let page_size = page_size.max(1);
        let table = self.records.clone();

        debug!(kind = %kind, page_size, "Streaming in-memory records");

        let pages = stream::unfold(Some(0), move |cursor| {
            let table = table.clone();
            async move {
                let Some(start) = cursor else {
                    return None;
                };
                let (page, next) = read_page(&table, kind, &range, start, page_size);
                if page.is_empty() {
                    return None;
                }
                let cursor = (page.len() == page_size).then_some(next);
                Some((stream::iter(page.into_iter().map(Ok::<_, StoreError>)), cursor))
            }
        })
        .flatten();

        let failure = self
            .stream_failures
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(&kind)
            .cloned();

        match failure {
            Some((after, error)) => pages
                .take(after)
                .chain(stream::once(async move { Err(error) }))
                .boxed(),
            None => pages.boxed(),
        }
    }

    async fn resolve(&self, kind: EntityKind, cumulus_id: i64) -> Result<EntityRecord, StoreError> {
        self.read_records()
            .get(&kind)
            .and_then(|records| {
                records
                    .iter()
                    .find(|record| record.cumulus_id() == Some(cumulus_id))
            })
            .cloned()
            .ok_or_else(|| StoreError::not_found(kind.as_str(), format!("cumulus_id={}", cumulus_id)))
    }

    async fn files_for_granule(&self, granule_cumulus_id: i64) -> Result<Vec<FileRecord>, StoreError> {
        let records = self.read_records();
        let mut files: Vec<FileRecord> = records
            .get(&EntityKind::File)
            .into_iter()
            .flatten()
            .filter_map(|record| match record {
                EntityRecord::File(file) if file.granule_cumulus_id == granule_cumulus_id => {
                    Some(file.clone())
                }
                _ => None,
            })
            .collect();
        files.sort_by_key(|file| file.cumulus_id);
        Ok(files)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::records::fixtures::{collection, report};
    use chrono::{Duration, Utc};
    use futures::TryStreamExt;

    #[tokio::test]
    async fn test_stream_yields_inserted_records() {
        let source = InMemoryRecordSource::with_records(vec![
            collection(1, "A", "1"),
            collection(2, "B", "1"),
        ]);

        let records: Vec<EntityRecord> = source
            .stream(EntityKind::Collection, UpdatedAtRange::unbounded(), 1)
            .try_collect()
            .await
            .unwrap();

        assert_eq!(records.len(), 2);
        assert_eq!(records[0].natural_key(), "A___1");
        assert_eq!(records[1].natural_key(), "B___1");
    }

    #[tokio::test]
    async fn test_stream_reads_pages_lazily() {
        let source = InMemoryRecordSource::with_records(vec![
            collection(1, "A", "1"),
            collection(2, "B", "1"),
        ]);

        let mut stream = source.stream(EntityKind::Collection, UpdatedAtRange::unbounded(), 1);
        let first = stream.try_next().await.unwrap().unwrap();
        assert_eq!(first.natural_key(), "A___1");

        source.insert(collection(3, "C", "1"));
        let rest: Vec<EntityRecord> = stream.try_collect().await.unwrap();

        let keys: Vec<String> = rest.iter().map(EntityRecord::natural_key).collect();
        assert_eq!(keys, vec!["B___1", "C___1"]);
    }

    #[tokio::test]
    async fn test_range_filter_spans_pages() {
        let now = Utc::now();
        let records = (1..=7).map(|i| {
            let mut record = collection(i, &format!("c{}", i), "1");
            if i % 2 == 0 {
                record.updated_at = now - Duration::days(5);
            }
            record
        });
        let source = InMemoryRecordSource::with_records(records);
        let range = UpdatedAtRange::unbounded().starting_at(now - Duration::days(1));

        let records: Vec<EntityRecord> = source
            .stream(EntityKind::Collection, range, 0)
            .try_collect()
            .await
            .unwrap();

        let keys: Vec<String> = records.iter().map(EntityRecord::natural_key).collect();
        assert_eq!(keys, vec!["c1___1", "c3___1", "c5___1", "c7___1"]);
    }

    #[tokio::test]
    async fn test_stream_of_unknown_kind_is_empty() {
        let source = InMemoryRecordSource::new();
        let records: Vec<EntityRecord> = source
            .stream(EntityKind::Granule, UpdatedAtRange::unbounded(), 10)
            .try_collect()
            .await
            .unwrap();
        assert!(records.is_empty());
        assert!(source.is_empty());
    }

    #[tokio::test]
    async fn test_stream_applies_range() {
        let now = Utc::now();
        let mut old = collection(1, "old", "1");
        old.updated_at = now - Duration::days(2);
        let recent = collection(2, "recent", "1");

        let source = InMemoryRecordSource::with_records(vec![old, recent]);
        let range = UpdatedAtRange::unbounded().starting_at(now - Duration::days(1));

        let records: Vec<EntityRecord> = source
            .stream(EntityKind::Collection, range, 10)
            .try_collect()
            .await
            .unwrap();

        assert_eq!(records.len(), 1);
        assert_eq!(records[0].natural_key(), "recent___1");
    }

    #[tokio::test]
    async fn test_injected_stream_failure() {
        let source = InMemoryRecordSource::with_records(vec![
            collection(1, "A", "1"),
            collection(2, "B", "1"),
        ]);
        source.fail_stream_after(EntityKind::Collection, 1, StoreError::connection("lost"));

        let items: Vec<Result<EntityRecord, StoreError>> = source
            .stream(EntityKind::Collection, UpdatedAtRange::unbounded(), 10)
            .collect()
            .await;

        assert_eq!(items.len(), 2);
        assert!(items[0].is_ok());
        assert!(matches!(items[1], Err(StoreError::ConnectionError(_))));
    }

    #[tokio::test]
    async fn test_resolve() {
        let source = InMemoryRecordSource::with_records(vec![collection(7, "A", "1")]);

        let found = source.resolve(EntityKind::Collection, 7).await.unwrap();
        assert_eq!(found.natural_key(), "A___1");

        let missing = source.resolve(EntityKind::Collection, 8).await.unwrap_err();
        assert!(missing.is_not_found());
    }

    #[test]
    fn test_from_report_lines() {
        let first = serde_json::to_string(&report("r1")).unwrap();
        let second = serde_json::to_string(&report("r2")).unwrap();
        let lines = format!("{}\n\n{}\n", first, second);

        let source = InMemoryRecordSource::from_report_lines(&lines).unwrap();
        assert_eq!(source.count(EntityKind::ReconciliationReport), 2);
    }

    #[test]
    fn test_from_report_lines_rejects_garbage() {
        let err = InMemoryRecordSource::from_report_lines("{not json").unwrap_err();
        assert!(matches!(err, StoreError::DecodeError(_)));
        assert!(err.to_string().contains("line 1"));
    }
}
