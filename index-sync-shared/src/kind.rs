//! Entity kinds known to the synchronization engine.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// A fixed category of record held in the record store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum EntityKind {
    Collection,
    Execution,
    Granule,
    File,
    Provider,
    Pdr,
    Rule,
    ReconciliationReport,
}

impl EntityKind {
    /// Every kind known to the store.
    pub const ALL: [EntityKind; 8] = [
        EntityKind::Collection,
        EntityKind::Execution,
        EntityKind::Granule,
        EntityKind::File,
        EntityKind::Provider,
        EntityKind::Pdr,
        EntityKind::Rule,
        EntityKind::ReconciliationReport,
    ];

    /// Kinds that produce their own search documents.
    ///
    /// Files are only ever embedded in their granule's document.
    pub const SYNCHRONIZED: [EntityKind; 7] = [
        EntityKind::Collection,
        EntityKind::Execution,
        EntityKind::Granule,
        EntityKind::Provider,
        EntityKind::Pdr,
        EntityKind::Rule,
        EntityKind::ReconciliationReport,
    ];

    /// Wire name of the kind, also used as the document type in the index.
    pub fn as_str(&self) -> &'static str {
        match self {
            EntityKind::Collection => "collection",
            EntityKind::Execution => "execution",
            EntityKind::Granule => "granule",
            EntityKind::File => "file",
            EntityKind::Provider => "provider",
            EntityKind::Pdr => "pdr",
            EntityKind::Rule => "rule",
            EntityKind::ReconciliationReport => "reconciliationReport",
        }
    }

    /// Whether records of this kind live in the relational store.
    pub fn is_relational(&self) -> bool {
        !matches!(self, EntityKind::ReconciliationReport)
    }
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Returned when a string does not name an entity kind.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseEntityKindError(pub String);

impl fmt::Display for ParseEntityKindError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "unknown entity kind: {}", self.0)
    }
}

impl std::error::Error for ParseEntityKindError {}

impl FromStr for EntityKind {
    type Err = ParseEntityKindError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        EntityKind::ALL
            .into_iter()
            .find(|kind| kind.as_str().eq_ignore_ascii_case(s))
            .ok_or_else(|| ParseEntityKindError(s.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_round_trips_wire_names() {
        for kind in EntityKind::ALL {
            assert_eq!(kind.as_str().parse::<EntityKind>().unwrap(), kind);
        }
        assert_eq!(
            "RECONCILIATIONREPORT".parse::<EntityKind>().unwrap(),
            EntityKind::ReconciliationReport
        );
    }

    #[test]
    fn test_unknown_kind() {
        let err = "async_operation".parse::<EntityKind>().unwrap_err();
        assert_eq!(err.to_string(), "unknown entity kind: async_operation");
    }

    #[test]
    fn test_serde_uses_wire_names() {
        let json = serde_json::to_string(&EntityKind::ReconciliationReport).unwrap();
        assert_eq!(json, "\"reconciliationReport\"");
    }

    #[test]
    fn test_synchronized_excludes_files() {
        assert!(!EntityKind::SYNCHRONIZED.contains(&EntityKind::File));
        assert_eq!(EntityKind::SYNCHRONIZED.len(), 7);
    }
}
