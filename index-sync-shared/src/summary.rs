//! Aggregated results of a synchronization run.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{EntityKind, SyncFailure, SyncOutcome};

/// Counts and failures for one entity kind.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct KindSummary {
    pub kind: EntityKind,
    /// Records read from the store and dispatched.
    pub attempted: usize,
    pub succeeded: usize,
    pub failed: usize,
    /// One entry per failed record.
    pub failures: Vec<SyncFailure>,
    /// Set when the kind as a whole could not be processed to completion.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    /// Whether the run for this kind stopped early because it was cancelled.
    #[serde(default)]
    pub cancelled: bool,
}

impl KindSummary {
    /// An empty summary for `kind`.
    pub fn new(kind: EntityKind) -> Self {
        Self {
            kind,
            attempted: 0,
            succeeded: 0,
            failed: 0,
            failures: Vec::new(),
            error: None,
            cancelled: false,
        }
    }

    /// A summary for a kind that could not be processed at all.
    pub fn kind_failure(kind: EntityKind, error: impl Into<String>) -> Self {
        Self {
            error: Some(error.into()),
            ..Self::new(kind)
        }
    }

    /// Fold a sequence of outcomes into a summary.
    pub fn from_outcomes(kind: EntityKind, outcomes: impl IntoIterator<Item = SyncOutcome>) -> Self {
        let mut summary = Self::new(kind);
        for outcome in outcomes {
            summary.record(outcome);
        }
        summary
    }

    /// Account for a single outcome.
    pub fn record(&mut self, outcome: SyncOutcome) {
        self.attempted += 1;
        match outcome {
            SyncOutcome::Indexed { .. } => self.succeeded += 1,
            SyncOutcome::Failed(failure) => {
                self.failed += 1;
                self.failures.push(failure);
            }
        }
    }

    /// Whether the kind completed with no record or kind-level failure.
    pub fn is_clean(&self) -> bool {
        self.failed == 0 && self.error.is_none() && !self.cancelled
    }
}

/// The result of a whole synchronization run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SyncSummary {
    pub run_id: Uuid,
    pub index_name: String,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    pub kinds: Vec<KindSummary>,
}

impl SyncSummary {
    /// Look up the summary for `kind`.
    pub fn kind(&self, kind: EntityKind) -> Option<&KindSummary> {
        self.kinds.iter().find(|summary| summary.kind == kind)
    }

    pub fn attempted(&self) -> usize {
        self.kinds.iter().map(|k| k.attempted).sum()
    }

    pub fn succeeded(&self) -> usize {
        self.kinds.iter().map(|k| k.succeeded).sum()
    }

    pub fn failed(&self) -> usize {
        self.kinds.iter().map(|k| k.failed).sum()
    }

    /// Kinds that failed as a whole.
    pub fn failed_kinds(&self) -> impl Iterator<Item = &KindSummary> {
        self.kinds.iter().filter(|k| k.error.is_some())
    }

    /// All record-level failures across kinds.
    pub fn failures(&self) -> impl Iterator<Item = &SyncFailure> {
        self.kinds.iter().flat_map(|k| k.failures.iter())
    }

    pub fn is_clean(&self) -> bool {
        self.kinds.iter().all(KindSummary::is_clean)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::FailureReason;

    #[test]
    fn test_from_outcomes_counts() {
        let outcomes = vec![
            SyncOutcome::indexed(EntityKind::Granule, "a"),
            SyncOutcome::indexed(EntityKind::Granule, "b"),
            SyncOutcome::failed(EntityKind::Granule, "c", Some(3), FailureReason::IndexWrite, "boom"),
        ];

        let summary = KindSummary::from_outcomes(EntityKind::Granule, outcomes);

        assert_eq!(summary.attempted, 3);
        assert_eq!(summary.succeeded, 2);
        assert_eq!(summary.failed, 1);
        assert_eq!(summary.failures[0].key, "c");
        assert!(!summary.is_clean());
    }

    #[test]
    fn test_kind_failure() {
        let summary = KindSummary::kind_failure(EntityKind::Rule, "table unreachable");
        assert_eq!(summary.attempted, 0);
        assert_eq!(summary.error.as_deref(), Some("table unreachable"));
        assert!(!summary.is_clean());
    }

    #[test]
    fn test_run_totals() {
        let now = Utc::now();
        let summary = SyncSummary {
            run_id: Uuid::new_v4(),
            index_name: "cumulus".to_string(),
            started_at: now,
            finished_at: now,
            kinds: vec![
                KindSummary::from_outcomes(
                    EntityKind::Provider,
                    vec![SyncOutcome::indexed(EntityKind::Provider, "p")],
                ),
                KindSummary::from_outcomes(
                    EntityKind::Pdr,
                    vec![SyncOutcome::failed(
                        EntityKind::Pdr,
                        "x.PDR",
                        None,
                        FailureReason::Mapping,
                        "missing collection",
                    )],
                ),
                KindSummary::kind_failure(EntityKind::Rule, "down"),
            ],
        };

        assert_eq!(summary.attempted(), 2);
        assert_eq!(summary.succeeded(), 1);
        assert_eq!(summary.failed(), 1);
        assert_eq!(summary.failures().count(), 1);
        assert_eq!(summary.failed_kinds().count(), 1);
        assert_eq!(summary.kind(EntityKind::Provider).unwrap().succeeded, 1);
        assert!(summary.kind(EntityKind::Granule).is_none());
        assert!(!summary.is_clean());
    }
}
