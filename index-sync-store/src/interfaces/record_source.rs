//! Record source trait definition.

use async_trait::async_trait;
use futures::stream::BoxStream;

use crate::errors::StoreError;
use crate::records::{EntityRecord, FileRecord};
use index_sync_shared::{EntityKind, UpdatedAtRange};

/// A lazy sequence of records read page by page from a store.
pub type RecordStream = BoxStream<'static, Result<EntityRecord, StoreError>>;

/// Read access to the records of one or more entity kinds.
///
/// Implementations are injected into the synchronization pipeline per entity
/// kind, so relational and non-relational stores can be mixed in one run.
///
/// # Thread Safety
///
/// All implementations must be `Send + Sync` to allow use across async tasks.
#[async_trait]
pub trait RecordSource: Send + Sync {
    /// Stream every record of `kind` whose `updated_at` falls in `range`.
    ///
    /// Each call opens a fresh cursor, so the stream can be restarted by
    /// calling `stream` again. Records are fetched `page_size` at a time and
    /// memory use stays bounded regardless of table size.
    ///
    /// A store failure is yielded as an `Err` item, after which the stream ends.
    fn stream(&self, kind: EntityKind, range: UpdatedAtRange, page_size: usize) -> RecordStream;

    /// Look up a related record by its internal identity.
    ///
    /// # Returns
    ///
    /// * `Ok(EntityRecord)` - The related record
    /// * `Err(StoreError::RecordNotFound)` - If no such record exists
    /// * `Err(StoreError)` - If the lookup fails
    async fn resolve(&self, kind: EntityKind, cumulus_id: i64) -> Result<EntityRecord, StoreError>;

    /// Fetch all files belonging to a granule, ordered by identity.
    async fn files_for_granule(&self, granule_cumulus_id: i64) -> Result<Vec<FileRecord>, StoreError>;
}
