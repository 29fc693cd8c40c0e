//! Main entry point for the ProfilePerfect job service

use profileperfect_jobs::{
    adapter,
    api,
    config::Settings,
    ledger::InMemoryLedger,
    storage::{FileStorage, StorageAdapter},
    store::InMemoryJobStore,
    AppState,
};
use std::sync::Arc;
use std::time::Duration;
use tracing::info;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    // Load configuration
    let settings = Settings::load()?;
    settings.validate()?;

    // Initialize logging
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&settings.logging.level));
    let registry = tracing_subscriber::registry().with(filter);
    if settings.logging.format == "pretty" {
        registry.with(fmt::layer().pretty()).init();
    } else {
        registry.with(fmt::layer().json()).init();
    }

    info!(
        host = %settings.server.host,
        port = settings.server.port,
        adapter = %settings.adapter.kind,
        workers = settings.queue.workers,
        "Starting ProfilePerfect job service"
    );

    let ledger = Arc::new(InMemoryLedger::with_balances(settings.credits.seed.clone()));
    let store = Arc::new(InMemoryJobStore::new());
    let storage: Arc<dyn StorageAdapter> = Arc::new(FileStorage::new(
        &settings.storage.base_path,
        settings.storage.url_prefix.clone(),
    ));
    let generation_adapter = adapter::from_config(&settings.adapter, storage.clone())?;

    let addr = format!("{}:{}", settings.server.host, settings.server.port);
    let reaper_config = settings.reaper.clone();

    let app_state = AppState::new(settings, ledger, store, generation_adapter, storage);

    // Start the stuck-job sweep
    let reaper = app_state
        .orchestrator
        .reaper(Duration::from_secs(reaper_config.max_in_flight_secs));
    if reaper_config.enabled {
        reaper
            .start(Duration::from_secs(reaper_config.interval_secs))
            .await;
    }

    let app = api::create_router(app_state);

    info!("Server listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    reaper.stop().await;
    info!("Shutdown complete");

    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "Failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    info!("Received shutdown signal");
}
