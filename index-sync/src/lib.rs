//! # Index Sync
//!
//! Entry point and wiring for a synchronization run.
//!
//! This crate reads the run trigger, connects the record store and the
//! search index from the environment and hands both to the pipeline's
//! `Coordinator`.

pub mod config;

pub use config::{Dependencies, SyncTrigger};

use thiserror::Error;

/// Errors that can occur while wiring or running a synchronization.
#[derive(Error, Debug)]
pub enum IndexingError {
    /// Configuration error.
    #[error("Configuration error: {0}")]
    ConfigError(String),

    /// Pipeline error.
    #[error("Pipeline error: {0}")]
    PipelineError(#[from] index_sync_pipeline::PipelineError),

    /// Search error.
    #[error("Search error: {0}")]
    SearchError(#[from] index_sync_repository::SearchIndexError),

    /// Record store error.
    #[error("Store error: {0}")]
    StoreError(#[from] index_sync_store::StoreError),

    /// IO error.
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    /// The trigger or summary could not be (de)serialized.
    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),
}

impl IndexingError {
    /// Create a configuration error.
    pub fn config(msg: impl Into<String>) -> Self {
        Self::ConfigError(msg.into())
    }
}
