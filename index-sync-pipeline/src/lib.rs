//! # Index Sync Pipeline
//!
//! This crate provides the pipeline components that copy records from the
//! record store into the search index.
//!
//! ## Architecture
//!
//! 1. **Mapper**: Translates one record and its relations into a search document
//! 2. **Dispatcher**: Streams one entity kind and writes its documents under a
//!    shared concurrency limit, isolating per-record failures
//! 3. **Coordinator**: Runs a dispatcher per kind concurrently and aggregates
//!    the outcomes into a `SyncSummary`

pub mod config;
pub mod coordinator;
pub mod dispatcher;
pub mod errors;
pub mod mapper;

pub use config::{ConcurrencyLimit, RelationPolicy, SyncOptions, SyncSettings};
pub use coordinator::Coordinator;
pub use dispatcher::{DispatchOptions, Dispatcher, KindRun};
pub use errors::{ConfigurationError, MappingError, PipelineError, RecordError};
pub use mapper::{map_record, Related, RelatedRecords};
