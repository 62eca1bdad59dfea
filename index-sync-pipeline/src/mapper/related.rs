//! Relations resolved for a record before it is mapped.

use index_sync_shared::EntityKind;
use index_sync_store::{CollectionRecord, ExecutionRecord, FileRecord, PdrRecord, ProviderRecord};

use crate::config::RelationPolicy;
use crate::errors::MappingError;

/// The state of one foreign-key relation.
#[derive(Debug, Clone, Default, PartialEq)]
pub enum Related<T> {
    /// The record does not reference this relation.
    #[default]
    NotReferenced,
    /// The referenced record was found.
    Found(T),
    /// The record references a row that no longer exists.
    Missing { cumulus_id: i64 },
}

impl<T> Related<T> {
    pub fn found(&self) -> Option<&T> {
        match self {
            Related::Found(record) => Some(record),
            _ => None,
        }
    }

    pub fn is_missing(&self) -> bool {
        matches!(self, Related::Missing { .. })
    }

    /// The referenced record, if any.
    ///
    /// A missing reference fails under `RelationPolicy::Fail` and reads as
    /// unreferenced under `RelationPolicy::Omit`.
    pub(crate) fn require(
        &self,
        policy: RelationPolicy,
        kind: EntityKind,
        key: &str,
        relation: EntityKind,
    ) -> Result<Option<&T>, MappingError> {
        match (self, policy) {
            (Related::NotReferenced, _) => Ok(None),
            (Related::Found(record), _) => Ok(Some(record)),
            (Related::Missing { .. }, RelationPolicy::Omit) => Ok(None),
            (Related::Missing { cumulus_id }, RelationPolicy::Fail) => {
                Err(MappingError::missing_relation(kind, key, relation, *cumulus_id))
            }
        }
    }
}

/// Every relation a mapper may read, resolved from the store.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RelatedRecords {
    pub collection: Related<CollectionRecord>,
    pub provider: Related<ProviderRecord>,
    pub pdr: Related<PdrRecord>,
    pub execution: Related<ExecutionRecord>,
    pub parent_execution: Related<ExecutionRecord>,
    /// Files of a granule, ordered by identity.
    pub files: Vec<FileRecord>,
}

impl RelatedRecords {
    pub fn none() -> Self {
        Self::default()
    }

    pub fn with_collection(mut self, collection: CollectionRecord) -> Self {
        self.collection = Related::Found(collection);
        self
    }

    pub fn with_provider(mut self, provider: ProviderRecord) -> Self {
        self.provider = Related::Found(provider);
        self
    }

    pub fn with_files(mut self, files: Vec<FileRecord>) -> Self {
        self.files = files;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_require_by_policy() {
        let missing: Related<u8> = Related::Missing { cumulus_id: 3 };

        let err = missing
            .require(RelationPolicy::Fail, EntityKind::Pdr, "a.PDR", EntityKind::Provider)
            .unwrap_err();
        assert!(matches!(
            err,
            MappingError::MissingRelation { relation: EntityKind::Provider, cumulus_id: 3, .. }
        ));

        let omitted = missing
            .require(RelationPolicy::Omit, EntityKind::Pdr, "a.PDR", EntityKind::Provider)
            .unwrap();
        assert!(omitted.is_none());
    }

    #[test]
    fn test_found_and_unreferenced() {
        let found = Related::Found(7_u8);
        assert_eq!(found.found(), Some(&7));
        assert!(!found.is_missing());

        let none: Related<u8> = Related::default();
        assert_eq!(
            none.require(RelationPolicy::Fail, EntityKind::Rule, "r", EntityKind::Collection)
                .unwrap(),
            None
        );
    }
}
