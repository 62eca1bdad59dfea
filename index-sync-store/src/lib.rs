//! # Index Sync Store
//!
//! Typed access to the records that get synchronized into the search index.
//! It includes the row types for every entity kind, a generic
//! transaction-aware PostgreSQL model, the `RecordSource` interface consumed
//! by the synchronization pipeline, and an in-memory implementation.

pub mod errors;
pub mod interfaces;
pub mod memory;
pub mod postgres;
pub mod records;

pub use errors::StoreError;
pub use interfaces::{RecordSource, RecordStream};
pub use memory::InMemoryRecordSource;
pub use postgres::{FieldValue, Fields, Filter, PgModel, PgRecord, PgRecordSource};
pub use records::{
    CollectionRecord, EntityRecord, ExecutionRecord, FileRecord, GranuleRecord, PdrRecord,
    ProviderRecord, ReconciliationReportRecord, RuleRecord,
};
