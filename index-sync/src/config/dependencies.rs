//! Dependency initialization and wiring for a synchronization run.

use std::env;
use std::sync::Arc;
use tracing::info;

use crate::config::SyncTrigger;
use crate::IndexingError;
use index_sync_pipeline::{Coordinator, SyncSettings};
use index_sync_repository::{OpenSearchClient, SearchIndexProvider};
use index_sync_shared::EntityKind;
use index_sync_store::{InMemoryRecordSource, PgRecordSource};

/// Default OpenSearch URL.
const DEFAULT_OPENSEARCH_URL: &str = "http://localhost:9200";

/// Default size of the database connection pool.
const DEFAULT_MAX_CONNECTIONS: u32 = 10;

/// Container for all initialized dependencies.
pub struct Dependencies {
    /// The configured coordinator ready to run.
    pub coordinator: Coordinator,
    /// The search engine the coordinator writes to.
    pub search: Arc<dyn SearchIndexProvider>,
}

impl Dependencies {
    /// Initialize all dependencies from environment variables.
    ///
    /// # Environment Variables
    ///
    /// - `DATABASE_URL`: PostgreSQL connection string (required)
    /// - `DATABASE_MAX_CONNECTIONS`: Connection pool size (default: 10)
    /// - `OPENSEARCH_URL`: OpenSearch server URL (default: http://localhost:9200)
    /// - `ES_CONCURRENCY`: Default concurrency when the trigger sets none (default: 10)
    /// - `ES_REQUEST_TIMEOUT_MS`: Timeout of one index write (default: 30000)
    /// - `SYNC_PAGE_SIZE`: Records fetched per page (default: 500)
    ///
    /// # Returns
    ///
    /// * `Ok(Dependencies)` - Initialized dependencies
    /// * `Err(IndexingError)` - If initialization fails
    pub async fn new(trigger: &SyncTrigger) -> Result<Self, IndexingError> {
        let database_url =
            env::var("DATABASE_URL").map_err(|_| IndexingError::config("DATABASE_URL is required"))?;
        let max_connections = match env::var("DATABASE_MAX_CONNECTIONS") {
            Ok(raw) => raw.trim().parse::<u32>().map_err(|_| {
                IndexingError::config(format!("Invalid DATABASE_MAX_CONNECTIONS value {:?}", raw))
            })?,
            Err(_) => DEFAULT_MAX_CONNECTIONS,
        };
        let opensearch_url =
            env::var("OPENSEARCH_URL").unwrap_or_else(|_| DEFAULT_OPENSEARCH_URL.to_string());

        let settings = SyncSettings::from_env().map_err(|e| IndexingError::config(e.to_string()))?;

        info!(
            opensearch_url = %opensearch_url,
            max_connections,
            page_size = settings.page_size,
            request_timeout_ms = settings.request_timeout.as_millis() as u64,
            "Initializing dependencies"
        );

        // Initialize OpenSearch client
        let search_client = OpenSearchClient::new(&opensearch_url)
            .await
            .map_err(|e| IndexingError::config(format!("Failed to create OpenSearch client: {}", e)))?;

        // Verify OpenSearch is reachable
        let healthy = search_client
            .health_check()
            .await
            .map_err(|e| IndexingError::config(format!("OpenSearch health check failed: {}", e)))?;

        if !healthy {
            return Err(IndexingError::config("OpenSearch cluster is unhealthy"));
        }

        info!("OpenSearch connection verified");

        let records = PgRecordSource::connect(&database_url, max_connections).await?;

        info!("Database pool connected");

        let search: Arc<dyn SearchIndexProvider> = Arc::new(search_client);
        let relational = EntityKind::ALL.into_iter().filter(EntityKind::is_relational);
        let mut coordinator =
            Coordinator::new(search.clone(), settings).with_sources(relational, Arc::new(records));

        if let Some(path) = &trigger.tables.reconciliation_reports_table {
            let reports = InMemoryRecordSource::from_report_lines(&std::fs::read_to_string(path)?)?;
            info!(
                path = %path,
                reports = reports.count(EntityKind::ReconciliationReport),
                "Loaded reconciliation reports"
            );
            coordinator = coordinator.with_source(EntityKind::ReconciliationReport, Arc::new(reports));
        }

        Ok(Self {
            coordinator,
            search,
        })
    }
}
