//! PostgreSQL implementation of the record store.
//!
//! `PgModel` provides generic create/read/update/delete/search access to one
//! table; every call takes an explicit executor so it runs unchanged against
//! a pool, a connection or a caller-managed transaction. `PgRecordSource`
//! builds the paged record streams the pipeline consumes on top of it.

mod model;
mod source;
mod tables;

pub use model::{FieldValue, Fields, Filter, PgModel, PgRecord};
pub use source::PgRecordSource;
