//! Application settings and configuration management

use crate::error::{AppError, Result};
use config::{Config, Environment, File};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::Path;
use std::time::Duration;

/// Root configuration structure
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct Settings {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub auth: AuthConfig,
    #[serde(default)]
    pub rate_limit: RateLimitConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
    #[serde(default)]
    pub queue: QueueConfig,
    #[serde(default)]
    pub adapter: AdapterConfig,
    #[serde(default)]
    pub credits: CreditsConfig,
    #[serde(default)]
    pub reaper: ReaperConfig,
    #[serde(default)]
    pub storage: StorageConfig,
}

/// Server configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
    #[serde(default = "default_request_timeout")]
    pub request_timeout_secs: u64,
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    8080
}

fn default_request_timeout() -> u64 {
    30
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            request_timeout_secs: default_request_timeout(),
        }
    }
}

/// Caller identification. Bearer tokens map to user ids; with no tokens
/// configured (or auth disabled) every caller acts as `default_user`.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct AuthConfig {
    #[serde(default = "default_true")]
    pub enabled: bool,
    #[serde(default)]
    pub tokens: HashMap<String, String>,
    #[serde(default = "default_user")]
    pub default_user: String,
}

fn default_true() -> bool {
    true
}

fn default_user() -> String {
    "mock-user-id".to_string()
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            tokens: HashMap::new(),
            default_user: default_user(),
        }
    }
}

/// Rate limiting configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct RateLimitConfig {
    #[serde(default = "default_true")]
    pub enabled: bool,
    #[serde(default = "default_rps")]
    pub requests_per_second: u32,
    #[serde(default = "default_burst")]
    pub burst_size: u32,
}

fn default_rps() -> u32 {
    10
}

fn default_burst() -> u32 {
    20
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            requests_per_second: default_rps(),
            burst_size: default_burst(),
        }
    }
}

/// Logging configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: String,
    #[serde(default = "default_log_format")]
    pub format: String,
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_log_format() -> String {
    "json".to_string()
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: default_log_format(),
        }
    }
}

/// Background worker pool sizing
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct QueueConfig {
    #[serde(default = "default_workers")]
    pub workers: usize,
    #[serde(default = "default_capacity")]
    pub capacity: usize,
}

fn default_workers() -> usize {
    4
}

fn default_capacity() -> usize {
    256
}

impl Default for QueueConfig {
    fn default() -> Self {
        Self {
            workers: default_workers(),
            capacity: default_capacity(),
        }
    }
}

/// Generation adapter configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct AdapterConfig {
    /// `demo` or `http`
    #[serde(default = "default_adapter_kind")]
    pub kind: String,
    #[serde(default)]
    pub endpoint: Option<String>,
    #[serde(default)]
    pub api_key: Option<String>,
    #[serde(default = "default_image_model")]
    pub model: String,
    #[serde(default = "default_edit_model")]
    pub edit_model: String,
    #[serde(default = "default_health_check_path")]
    pub health_check_path: String,
    /// Outer bound on a single adapter call
    #[serde(default = "default_adapter_timeout")]
    pub timeout_secs: u64,
    #[serde(default = "default_demo_base_url")]
    pub demo_base_url: String,
    #[serde(default = "default_demo_latency")]
    pub demo_latency_ms: u64,
}

fn default_adapter_kind() -> String {
    "demo".to_string()
}

fn default_image_model() -> String {
    "gpt-image-1-mini".to_string()
}

fn default_edit_model() -> String {
    "gpt-image-1-mini".to_string()
}

fn default_health_check_path() -> String {
    "/v1/models".to_string()
}

fn default_adapter_timeout() -> u64 {
    180
}

fn default_demo_base_url() -> String {
    "http://localhost:8080/images/demo".to_string()
}

fn default_demo_latency() -> u64 {
    2000
}

impl Default for AdapterConfig {
    fn default() -> Self {
        Self {
            kind: default_adapter_kind(),
            endpoint: None,
            api_key: None,
            model: default_image_model(),
            edit_model: default_edit_model(),
            health_check_path: default_health_check_path(),
            timeout_secs: default_adapter_timeout(),
            demo_base_url: default_demo_base_url(),
            demo_latency_ms: default_demo_latency(),
        }
    }
}

impl AdapterConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

/// Credit ledger policy and seed balances
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct CreditsConfig {
    /// Credit back the charged amount when a job ends in `failed`
    #[serde(default = "default_true")]
    pub refund_on_failure: bool,
    /// Initial balances keyed by user id
    #[serde(default)]
    pub seed: HashMap<String, u32>,
}

impl Default for CreditsConfig {
    fn default() -> Self {
        Self {
            refund_on_failure: true,
            seed: HashMap::new(),
        }
    }
}

/// Stuck-job sweep configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ReaperConfig {
    #[serde(default = "default_true")]
    pub enabled: bool,
    #[serde(default = "default_reaper_interval")]
    pub interval_secs: u64,
    #[serde(default = "default_max_in_flight")]
    pub max_in_flight_secs: u64,
}

fn default_reaper_interval() -> u64 {
    60
}

fn default_max_in_flight() -> u64 {
    600
}

impl Default for ReaperConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            interval_secs: default_reaper_interval(),
            max_in_flight_secs: default_max_in_flight(),
        }
    }
}

/// Storage configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct StorageConfig {
    #[serde(default = "default_storage_path")]
    pub base_path: String,
    #[serde(default = "default_url_prefix")]
    pub url_prefix: String,
}

fn default_storage_path() -> String {
    "./uploads".to_string()
}

fn default_url_prefix() -> String {
    "http://localhost:8080/images".to_string()
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            base_path: default_storage_path(),
            url_prefix: default_url_prefix(),
        }
    }
}

impl Settings {
    /// Load settings from `PROFILEPERFECT_CONFIG` (or `config/default.toml`)
    /// and environment variables
    pub fn load() -> Result<Self> {
        let path = std::env::var("PROFILEPERFECT_CONFIG")
            .unwrap_or_else(|_| "config/default.toml".to_string());
        Self::load_from_path(path)
    }

    /// Load settings from a specific configuration file path
    pub fn load_from_path<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref().to_string_lossy().to_string();

        let config = Config::builder()
            .set_default("server.host", default_host())?
            .set_default("server.port", default_port() as i64)?
            .set_default("queue.workers", default_workers() as i64)?
            .set_default("queue.capacity", default_capacity() as i64)?
            .set_default("adapter.kind", default_adapter_kind())?
            .add_source(File::with_name(&path).required(false))
            // Override with environment variables (prefixed with PROFILEPERFECT__)
            .add_source(
                Environment::with_prefix("PROFILEPERFECT")
                    .prefix_separator("__")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        let settings: Settings = config.try_deserialize()?;
        Ok(settings)
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<()> {
        if self.server.port == 0 {
            return Err(invalid("Server port cannot be 0"));
        }
        if self.queue.workers == 0 {
            return Err(invalid("queue.workers must be at least 1"));
        }
        if self.queue.capacity == 0 {
            return Err(invalid("queue.capacity must be at least 1"));
        }
        if self.adapter.timeout_secs == 0 {
            return Err(invalid("adapter.timeout_secs must be at least 1"));
        }
        match self.adapter.kind.as_str() {
            "demo" => {}
            "http" => {
                if self.adapter.endpoint.as_deref().map_or(true, str::is_empty) {
                    return Err(invalid("adapter.endpoint is required for the http adapter"));
                }
            }
            other => {
                return Err(invalid(&format!(
                    "Unknown adapter kind '{}'. Must be 'demo' or 'http'",
                    other
                )));
            }
        }
        if !["json", "pretty"].contains(&self.logging.format.as_str()) {
            return Err(invalid(&format!(
                "Unknown log format '{}'. Must be 'json' or 'pretty'",
                self.logging.format
            )));
        }
        if self.reaper.enabled {
            if self.reaper.interval_secs == 0 {
                return Err(invalid("reaper.interval_secs must be at least 1"));
            }
            if self.reaper.max_in_flight_secs <= self.adapter.timeout_secs {
                return Err(invalid(&format!(
                    "reaper.max_in_flight_secs ({}) must exceed adapter.timeout_secs ({})",
                    self.reaper.max_in_flight_secs, self.adapter.timeout_secs
                )));
            }
        }
        Ok(())
    }
}

fn invalid(message: &str) -> AppError {
    AppError::Config(config::ConfigError::Message(message.to_string()))
}
