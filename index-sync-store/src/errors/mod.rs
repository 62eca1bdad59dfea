//! Error types for the record store.

mod store_error;

pub use store_error::StoreError;
