//! Translation of store records into search documents.
//!
//! Mapping is pure: relations are resolved beforehand and passed in as
//! `RelatedRecords`, so every mapper can be exercised without a store.
//! Top-level `null` fields are dropped from every document.

mod collection;
mod execution;
mod granule;
mod pdr;
mod provider;
mod reconciliation_report;
mod related;
mod rule;

#[cfg(test)]
pub(crate) mod fixtures;

use serde::Serialize;
use serde_json::Value;

use crate::config::RelationPolicy;
use crate::errors::MappingError;
use index_sync_shared::{EntityKind, SearchDocument};
use index_sync_store::EntityRecord;

pub use related::{Related, RelatedRecords};

/// Map `record` and its relations into the document indexed for it.
///
/// # Returns
///
/// * `Ok(SearchDocument)` - The document keyed by the record's natural key
/// * `Err(MappingError::MissingRelation)` - If a referenced relation is missing
///   and `policy` is `RelationPolicy::Fail`
pub fn map_record(
    record: &EntityRecord,
    related: &RelatedRecords,
    policy: RelationPolicy,
) -> Result<SearchDocument, MappingError> {
    match record {
        EntityRecord::Collection(r) => collection::to_document(r),
        EntityRecord::Execution(r) => execution::to_document(r, related, policy),
        EntityRecord::Granule(r) => granule::to_document(r, related, policy),
        EntityRecord::File(r) => granule::file_to_document(r),
        EntityRecord::Provider(r) => provider::to_document(r),
        EntityRecord::Pdr(r) => pdr::to_document(r, related, policy),
        EntityRecord::Rule(r) => rule::to_document(r, related, policy),
        EntityRecord::ReconciliationReport(r) => reconciliation_report::to_document(r),
    }
}

/// Serialize `document` as the source of a `kind` document keyed by `key`.
fn build<T: Serialize>(kind: EntityKind, key: String, document: &T) -> Result<SearchDocument, MappingError> {
    let mut source =
        serde_json::to_value(document).map_err(|e| MappingError::serialization(kind, key.as_str(), e))?;
    if let Value::Object(fields) = &mut source {
        fields.retain(|_, value| !value.is_null());
    }
    Ok(SearchDocument::new(kind, key, source))
}
