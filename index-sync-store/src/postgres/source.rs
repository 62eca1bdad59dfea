//! PostgreSQL-backed record source.

use std::time::Duration;

use async_trait::async_trait;
use futures::stream::{self, StreamExt, TryStreamExt};
use sqlx::postgres::{PgPool, PgPoolOptions};
use tracing::{debug, info};

use super::model::{Filter, PgModel, PgRecord};
use crate::errors::StoreError;
use crate::interfaces::{RecordSource, RecordStream};
use crate::records::{
    CollectionRecord, EntityRecord, ExecutionRecord, FileRecord, GranuleRecord, PdrRecord,
    ProviderRecord, RuleRecord,
};
use index_sync_shared::{EntityKind, UpdatedAtRange};

/// Reads relational records from a PostgreSQL pool.
///
/// Streams page through each table by `cumulus_id` so that no page holds a
/// long-lived cursor or transaction.
#[derive(Clone)]
pub struct PgRecordSource {
    pool: PgPool,
}

impl PgRecordSource {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Connect a new pool to `database_url`.
    pub async fn connect(database_url: &str, max_connections: u32) -> Result<Self, StoreError> {
        let pool = PgPoolOptions::new()
            .max_connections(max_connections)
            .acquire_timeout(Duration::from_secs(30))
            .connect(database_url)
            .await
            .map_err(|e| StoreError::connection(e.to_string()))?;

        info!(max_connections, "Connected to record store");
        Ok(Self::new(pool))
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    async fn get<R>(&self, cumulus_id: i64) -> Result<EntityRecord, StoreError>
    where
        R: PgRecord + Into<EntityRecord>,
    {
        PgModel::<R>::new()
            .get(&self.pool, &Filter::by_cumulus_id(cumulus_id))
            .await
            .map(Into::into)
    }
}

struct PageCursor {
    after: Option<i64>,
    exhausted: bool,
}

fn paged<R>(pool: PgPool, range: UpdatedAtRange, page_size: usize) -> RecordStream
where
    R: PgRecord + Into<EntityRecord>,
{
    let page_size = page_size.max(1);
    let model = PgModel::<R>::new();
    let start = PageCursor {
        after: None,
        exhausted: false,
    };

    stream::try_unfold(start, move |cursor| {
        let pool = pool.clone();
        async move {
            if cursor.exhausted {
                return Ok::<_, StoreError>(None);
            }

            let rows = model.page(&pool, &range, cursor.after, page_size).await?;
            debug!(
                table = R::TABLE,
                after = ?cursor.after,
                rows = rows.len(),
                "Fetched page"
            );

            let Some(last) = rows.last().map(PgRecord::cumulus_id) else {
                return Ok(None);
            };
            let next = PageCursor {
                after: Some(last),
                exhausted: rows.len() < page_size,
            };
            Ok(Some((rows, next)))
        }
    })
    .map_ok(|rows| stream::iter(rows.into_iter().map(|row| Ok(row.into()))))
    .try_flatten()
    .boxed()
}

#[async_trait]
impl RecordSource for PgRecordSource {
    fn stream(&self, kind: EntityKind, range: UpdatedAtRange, page_size: usize) -> RecordStream {
        let pool = self.pool.clone();
        match kind {
            EntityKind::Collection => paged::<CollectionRecord>(pool, range, page_size),
            EntityKind::Execution => paged::<ExecutionRecord>(pool, range, page_size),
            EntityKind::Granule => paged::<GranuleRecord>(pool, range, page_size),
            EntityKind::File => paged::<FileRecord>(pool, range, page_size),
            EntityKind::Provider => paged::<ProviderRecord>(pool, range, page_size),
            EntityKind::Pdr => paged::<PdrRecord>(pool, range, page_size),
            EntityKind::Rule => paged::<RuleRecord>(pool, range, page_size),
            EntityKind::ReconciliationReport => {
                stream::once(async move { Err(StoreError::UnsupportedKind(kind)) }).boxed()
            }
        }
    }

    async fn resolve(&self, kind: EntityKind, cumulus_id: i64) -> Result<EntityRecord, StoreError> {
        match kind {
            EntityKind::Collection => self.get::<CollectionRecord>(cumulus_id).await,
            EntityKind::Execution => self.get::<ExecutionRecord>(cumulus_id).await,
            EntityKind::Granule => self.get::<GranuleRecord>(cumulus_id).await,
            EntityKind::File => self.get::<FileRecord>(cumulus_id).await,
            EntityKind::Provider => self.get::<ProviderRecord>(cumulus_id).await,
            EntityKind::Pdr => self.get::<PdrRecord>(cumulus_id).await,
            EntityKind::Rule => self.get::<RuleRecord>(cumulus_id).await,
            EntityKind::ReconciliationReport => Err(StoreError::UnsupportedKind(kind)),
        }
    }

    async fn files_for_granule(&self, granule_cumulus_id: i64) -> Result<Vec<FileRecord>, StoreError> {
        PgModel::<FileRecord>::new()
            .search(
                &self.pool,
                &Filter::new().eq("granule_cumulus_id", granule_cumulus_id),
            )
            .await
    }
}
