//! ProfilePerfect job service
//!
//! Credit-metered headshot generation and retouch jobs: requests are
//! validated and paid for up front, executed on a bounded worker pool
//! against a pluggable generation adapter, and observed through job status.

pub mod adapter;
pub mod api;
pub mod config;
pub mod error;
pub mod ledger;
pub mod middleware;
pub mod model;
pub mod orchestrator;
pub mod status;
pub mod storage;
pub mod store;

pub use error::{AppError, Result};

use std::sync::Arc;
use std::time::Duration;

use adapter::GenerationAdapter;
use ledger::CreditLedger;
use orchestrator::{JobOrchestrator, OrchestratorConfig, PoolConfig};
use status::StatusReporter;
use storage::StorageAdapter;
use store::JobStore;

/// Application state shared across all handlers
pub struct AppState {
    pub settings: Arc<config::Settings>,
    pub ledger: Arc<dyn CreditLedger>,
    pub orchestrator: Arc<JobOrchestrator>,
    pub status: Arc<StatusReporter>,
    pub storage: Arc<dyn StorageAdapter>,
    pub adapter: Arc<dyn GenerationAdapter>,
}

impl AppState {
    /// Wire the services together. Starts the worker pool, so it must be
    /// called from within a tokio runtime.
    pub fn new(
        settings: config::Settings,
        ledger: Arc<dyn CreditLedger>,
        store: Arc<dyn JobStore>,
        adapter: Arc<dyn GenerationAdapter>,
        storage: Arc<dyn StorageAdapter>,
    ) -> Arc<Self> {
        let orchestrator_config = OrchestratorConfig {
            pool: PoolConfig {
                workers: settings.queue.workers,
                capacity: settings.queue.capacity,
            },
            adapter_timeout: settings.adapter.timeout(),
            refund_on_failure: settings.credits.refund_on_failure,
        };

        let orchestrator = Arc::new(JobOrchestrator::new(
            ledger.clone(),
            store.clone(),
            adapter.clone(),
            orchestrator_config,
        ));

        Arc::new(Self {
            settings: Arc::new(settings),
            ledger,
            orchestrator,
            status: Arc::new(StatusReporter::new(store)),
            storage,
            adapter,
        })
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.settings.server.request_timeout_secs)
    }
}
