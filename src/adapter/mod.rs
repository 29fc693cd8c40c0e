//! Generation adapters - trait, HTTP client, demo mode and prompts

pub mod demo_adapter;
pub mod http_adapter;
pub mod prompt;
pub mod traits;

use std::sync::Arc;
use std::time::Duration;

use crate::config::AdapterConfig;
use crate::error::{AppError, Result};
use crate::storage::StorageAdapter;

pub use demo_adapter::DemoAdapter;
pub use http_adapter::HttpAdapter;
pub use traits::{AdapterRequest, GeneratedImage, GenerationAdapter};

/// Build the adapter selected by configuration
pub fn from_config(
    config: &AdapterConfig,
    storage: Arc<dyn StorageAdapter>,
) -> Result<Arc<dyn GenerationAdapter>> {
    match config.kind.as_str() {
        "demo" => Ok(Arc::new(DemoAdapter::new(
            config.demo_base_url.clone(),
            Duration::from_millis(config.demo_latency_ms),
        ))),
        "http" => Ok(Arc::new(HttpAdapter::new(config, Some(storage))?)),
        other => Err(AppError::Config(config::ConfigError::Message(format!(
            "Unknown adapter kind '{}'",
            other
        )))),
    }
}
