//! # Index Sync Shared
//!
//! Types shared by every crate of the index synchronization engine: the
//! entity kinds that can be synchronized, the search document produced for a
//! record, and the per-record and per-run results of a synchronization.

mod document;
mod kind;
mod outcome;
mod range;
mod summary;

pub use document::{collection_id, SearchDocument};
pub use kind::{EntityKind, ParseEntityKindError};
pub use outcome::{FailureReason, SyncFailure, SyncOutcome};
pub use range::UpdatedAtRange;
pub use summary::{KindSummary, SyncSummary};
