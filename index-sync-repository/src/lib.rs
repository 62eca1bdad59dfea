//! # Index Sync Repository
//!
//! This crate provides traits and implementations for interacting with the
//! search index. It includes definitions for errors, the provider interface,
//! a concrete implementation for OpenSearch, an in-memory index, and the
//! `SearchIndexClient` the synchronization pipeline writes through.

pub mod client;
pub mod config;
pub mod errors;
pub mod interfaces;
pub mod memory;
pub mod opensearch;
pub mod types;

pub use client::SearchIndexClient;
pub use config::SearchIndexConfig;
pub use errors::SearchIndexError;
pub use interfaces::SearchIndexProvider;
pub use memory::InMemorySearchIndex;
pub use opensearch::{IndexConfig, OpenSearchClient};
pub use types::{AliasAction, BatchOperationResult, BatchOperationSummary, DocumentRef};
