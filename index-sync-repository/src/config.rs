//! Configuration types for the SearchIndexClient.

use std::time::Duration;

/// Default timeout applied to each index request.
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Configuration for the SearchIndexClient.
#[derive(Debug, Clone)]
pub struct SearchIndexConfig {
    /// Maximum number of documents allowed in a single batch operation.
    /// Set to None to disable the limit (not recommended for production).
    pub max_batch_size: Option<usize>,
    /// Upper bound on a single index round-trip.
    pub request_timeout: Duration,
}

impl Default for SearchIndexConfig {
    fn default() -> Self {
        Self {
            max_batch_size: Some(1000),
            request_timeout: DEFAULT_REQUEST_TIMEOUT,
        }
    }
}

impl SearchIndexConfig {
    /// Create a config with no batch size limit (use with caution).
    pub fn unlimited() -> Self {
        Self {
            max_batch_size: None,
            ..Self::default()
        }
    }

    /// Create a config with a custom batch size limit.
    pub fn with_max_batch_size(max_batch_size: usize) -> Self {
        Self {
            max_batch_size: Some(max_batch_size),
            ..Self::default()
        }
    }

    /// Replace the request timeout.
    pub fn request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = timeout;
        self
    }
}
