//! Relation lookups performed before a record is mapped.

use index_sync_shared::EntityKind;
use index_sync_store::{
    CollectionRecord, EntityRecord, ExecutionRecord, PdrRecord, ProviderRecord, RecordSource,
};

use crate::errors::{MappingError, RecordError};
use crate::mapper::{Related, RelatedRecords};

/// Resolve every relation `record` references.
///
/// A referenced row that no longer exists becomes `Related::Missing` and is
/// left to the mapper's `RelationPolicy`. Any other lookup failure fails the
/// record.
pub(crate) async fn resolve_related(
    source: &dyn RecordSource,
    record: &EntityRecord,
) -> Result<RelatedRecords, RecordError> {
    let key = record.natural_key();
    let lookup = Lookup {
        source,
        kind: record.kind(),
        key: &key,
    };
    let mut related = RelatedRecords::none();

    match record {
        EntityRecord::Execution(r) => {
            related.collection = lookup.collection(r.collection_cumulus_id).await?;
            related.parent_execution = lookup.execution(r.parent_cumulus_id).await?;
        }
        EntityRecord::Granule(r) => {
            related.collection = lookup.collection(Some(r.collection_cumulus_id)).await?;
            related.provider = lookup.provider(r.provider_cumulus_id).await?;
            related.pdr = lookup.pdr(r.pdr_cumulus_id).await?;
            related.files = source.files_for_granule(r.cumulus_id).await?;
        }
        EntityRecord::Pdr(r) => {
            related.collection = lookup.collection(Some(r.collection_cumulus_id)).await?;
            related.provider = lookup.provider(Some(r.provider_cumulus_id)).await?;
            related.execution = lookup.execution(r.execution_cumulus_id).await?;
        }
        EntityRecord::Rule(r) => {
            related.collection = lookup.collection(r.collection_cumulus_id).await?;
            related.provider = lookup.provider(r.provider_cumulus_id).await?;
        }
        EntityRecord::Collection(_)
        | EntityRecord::File(_)
        | EntityRecord::Provider(_)
        | EntityRecord::ReconciliationReport(_) => {}
    }

    Ok(related)
}

struct Lookup<'a> {
    source: &'a dyn RecordSource,
    kind: EntityKind,
    key: &'a str,
}

macro_rules! typed_lookup {
    ($($name:ident => $variant:ident($record:ty)),* $(,)?) => {
        impl Lookup<'_> {
            $(
                async fn $name(&self, cumulus_id: Option<i64>) -> Result<Related<$record>, RecordError> {
                    self.get(EntityKind::$variant, cumulus_id, |record| match record {
                        EntityRecord::$variant(r) => Ok(r),
                        other => Err(other.kind()),
                    })
                    .await
                }
            )*
        }
    };
}

typed_lookup! {
    collection => Collection(CollectionRecord),
    execution => Execution(ExecutionRecord),
    provider => Provider(ProviderRecord),
    pdr => Pdr(PdrRecord),
}

impl Lookup<'_> {
    async fn get<T>(
        &self,
        relation: EntityKind,
        cumulus_id: Option<i64>,
        extract: fn(EntityRecord) -> Result<T, EntityKind>,
    ) -> Result<Related<T>, RecordError> {
        let Some(cumulus_id) = cumulus_id else {
            return Ok(Related::NotReferenced);
        };

        match self.source.resolve(relation, cumulus_id).await {
            Ok(record) => extract(record).map(Related::Found).map_err(|found| {
                RecordError::from(MappingError::RelationKindMismatch {
                    kind: self.kind,
                    key: self.key.to_string(),
                    relation,
                    found,
                })
            }),
            Err(err) if err.is_not_found() => Ok(Related::Missing { cumulus_id }),
            Err(err) => Err(err.into()),
        }
    }
}
