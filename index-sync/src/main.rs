use std::env;
use std::path::PathBuf;

use dotenv::dotenv;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

use index_sync::{Dependencies, IndexingError, SyncTrigger};
use index_sync_repository::{IndexConfig, SearchIndexClient};

#[tokio::main]
async fn main() {
    dotenv().ok();

    tracing_subscriber::fmt()
        .json()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    if let Err(e) = run().await {
        error!(error = %e, "Synchronization failed");
        std::process::exit(1);
    }
}

/// Read the trigger from the file named by the first argument, or stdin.
async fn run() -> Result<(), IndexingError> {
    let path = env::args().nth(1).map(PathBuf::from);
    let trigger = SyncTrigger::read(path.as_deref())?;
    let deps = Dependencies::new(&trigger).await?;

    if trigger.create_index {
        SearchIndexClient::new(deps.search.clone(), trigger.index_name.as_str())
            .bootstrap(&trigger.index_name, &IndexConfig::default())
            .await?;
    }

    let cancel = deps.coordinator.cancellation_token();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            warn!("Received shutdown signal; finishing dispatched writes");
            cancel.cancel();
        }
    });

    let summary = deps
        .coordinator
        .synchronize(&trigger.kinds(), &trigger.options())
        .await?;

    info!(
        run_id = %summary.run_id,
        succeeded = summary.succeeded(),
        failed = summary.failed(),
        "Run finished"
    );
    println!("{}", serde_json::to_string_pretty(&summary)?);

    Ok(())
}
