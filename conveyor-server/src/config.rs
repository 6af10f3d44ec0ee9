//! Server configuration
//!
//! Everything is read from environment variables; the engine settings fall
//! back to [`EngineConfig::default`] one by one.

use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use anyhow::Context;
use conveyor_engine::EngineConfig;

/// Server configuration
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Address the HTTP API listens on
    pub bind_addr: String,

    /// PostgreSQL connection string; the file store is used when absent
    pub database_url: Option<String>,

    /// Root of the file store
    pub data_dir: PathBuf,

    /// Directory scanned for subprocess capabilities
    pub plugins_dir: Option<PathBuf>,

    /// Accepted `X-API-Key` values; empty disables the check
    pub api_keys: Vec<String>,

    pub engine: EngineConfig,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_addr: "0.0.0.0:8080".to_string(),
            database_url: None,
            data_dir: PathBuf::from("./conveyor-data"),
            plugins_dir: None,
            api_keys: Vec::new(),
            engine: EngineConfig::default(),
        }
    }
}

impl ServerConfig {
    /// Creates configuration from environment variables
    ///
    /// Recognised variables:
    /// - CONVEYOR_BIND_ADDR (default: 0.0.0.0:8080)
    /// - DATABASE_URL (optional)
    /// - CONVEYOR_DATA_DIR (default: ./conveyor-data)
    /// - CONVEYOR_PLUGINS_DIR (optional)
    /// - CONVEYOR_API_KEYS (optional, comma separated)
    /// - CONVEYOR_JOB_WORKERS, CONVEYOR_PIPELINE_WORKERS
    /// - CONVEYOR_QUEUE_CAPACITY (both queues)
    /// - CONVEYOR_DEFAULT_TIMEOUT_SECS, CONVEYOR_MAX_RETRIES
    /// - CONVEYOR_SCHEDULER_INTERVAL_MS
    pub fn from_env() -> anyhow::Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> anyhow::Result<Self> {
        let var = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());
        let defaults = Self::default();
        let mut engine = defaults.engine.clone();

        if let Some(workers) = parse(&var, "CONVEYOR_JOB_WORKERS")? {
            engine.job_workers = workers;
        }
        if let Some(workers) = parse(&var, "CONVEYOR_PIPELINE_WORKERS")? {
            engine.pipeline_workers = workers;
        }
        if let Some(capacity) = parse(&var, "CONVEYOR_QUEUE_CAPACITY")? {
            engine.job_queue_capacity = capacity;
            engine.pipeline_queue_capacity = capacity;
        }
        if let Some(secs) = parse(&var, "CONVEYOR_DEFAULT_TIMEOUT_SECS")? {
            engine.default_timeout = Duration::from_secs(secs);
        }
        if let Some(retries) = parse(&var, "CONVEYOR_MAX_RETRIES")? {
            engine.default_max_retries = retries;
        }
        if let Some(ms) = parse(&var, "CONVEYOR_SCHEDULER_INTERVAL_MS")? {
            engine.scheduler_interval = Duration::from_millis(ms);
        }

        let api_keys = var("CONVEYOR_API_KEYS")
            .map(|keys| {
                keys.split(',')
                    .map(str::trim)
                    .filter(|k| !k.is_empty())
                    .map(str::to_string)
                    .collect()
            })
            .unwrap_or_default();

        Ok(Self {
            bind_addr: var("CONVEYOR_BIND_ADDR").unwrap_or(defaults.bind_addr),
            database_url: var("DATABASE_URL"),
            data_dir: var("CONVEYOR_DATA_DIR")
                .map(PathBuf::from)
                .unwrap_or(defaults.data_dir),
            plugins_dir: var("CONVEYOR_PLUGINS_DIR").map(PathBuf::from),
            api_keys,
            engine,
        })
    }

    /// Validates the configuration
    pub fn validate(&self) -> anyhow::Result<()> {
        if self.bind_addr.trim().is_empty() {
            anyhow::bail!("bind_addr cannot be empty");
        }

        if let Some(url) = &self.database_url {
            if !url.starts_with("postgres://") && !url.starts_with("postgresql://") {
                anyhow::bail!("DATABASE_URL must start with postgres:// or postgresql://");
            }
        }

        self.engine.validate()
    }
}

fn parse<T>(var: impl Fn(&str) -> Option<String>, key: &str) -> anyhow::Result<Option<T>>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    var(key)
        .map(|raw| {
            raw.trim()
                .parse::<T>()
                .with_context(|| format!("{} has an invalid value '{}'", key, raw))
        })
        .transpose()
}
