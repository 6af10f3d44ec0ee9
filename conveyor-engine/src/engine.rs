//! Engine
//!
//! Wires the capability registry, executor, job manager and pipeline manager
//! together over one store, and restores state left by a previous process.

use std::sync::Arc;

use conveyor_core::domain::capability::CapabilityInfo;
use conveyor_core::dto::stats::EngineStats;
use tracing::info;

use crate::capability::{CapabilityArgs, CapabilityRegistry};
use crate::config::EngineConfig;
use crate::error::{EngineError, EngineResult};
use crate::execution::{AttemptError, Executor};
use crate::repository;
use crate::service::{JobManager, PipelineManager};
use crate::store::Store;

pub struct Engine {
    config: EngineConfig,
    executor: Arc<Executor>,
    jobs: Arc<JobManager>,
    pipelines: PipelineManager,
}

impl Engine {
    /// Start both worker pools and the scheduler, then load persisted state
    ///
    /// # Errors
    /// `Validation` for an invalid config, `Persistence` if the store cannot
    /// be read
    pub async fn start(
        config: EngineConfig,
        store: Arc<dyn Store>,
        capabilities: CapabilityRegistry,
    ) -> EngineResult<Self> {
        config
            .validate()
            .map_err(|e| EngineError::Validation(format!("{:#}", e)))?;

        info!(
            "Starting engine with {} capabilities registered",
            capabilities.len()
        );

        let executor = Arc::new(Executor::new(Arc::new(capabilities), config.backoff()));
        let jobs = Arc::new(JobManager::start(
            &config,
            Arc::clone(&store),
            Arc::clone(&executor),
        ));
        let pipelines = PipelineManager::start(
            &config,
            Arc::clone(&store),
            Arc::clone(&executor),
            Arc::clone(&jobs),
        );

        let engine = Self {
            config,
            executor,
            jobs,
            pipelines,
        };

        if let Err(e) = engine.recover(store.as_ref()).await {
            engine.shutdown().await;
            return Err(e);
        }

        Ok(engine)
    }

    async fn recover(&self, store: &dyn Store) -> EngineResult<()> {
        let jobs = repository::jobs::load_all(store).await?;
        let pipelines = repository::pipelines::load_all(store).await?;
        info!(
            "Recovering {} job(s) and {} pipeline(s) from the store",
            jobs.len(),
            pipelines.len()
        );

        self.jobs.restore(jobs).await?;
        self.pipelines.restore(pipelines).await;
        Ok(())
    }

    pub fn jobs(&self) -> &JobManager {
        &self.jobs
    }

    pub fn pipelines(&self) -> &PipelineManager {
        &self.pipelines
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn capabilities(&self) -> Vec<CapabilityInfo> {
        self.executor.capabilities().list()
    }

    /// Invoke a capability directly, outside any job, with the default timeout
    pub async fn execute_capability(
        &self,
        name: &str,
        args: CapabilityArgs,
    ) -> Result<serde_json::Value, AttemptError> {
        info!("Executing capability {} directly", name);
        self.executor
            .invoke(name, args, self.config.default_timeout)
            .await
    }

    pub async fn stats(&self) -> EngineStats {
        EngineStats {
            jobs: self.jobs.stats().await,
            pipelines: self.pipelines.stats().await,
        }
    }

    /// Stop the scheduler, then drain both queues
    ///
    /// Pipelines go first since their jobs do not depend on the job pool.
    pub async fn shutdown(&self) {
        info!("Engine shutting down");
        self.pipelines.shutdown().await;
        self.jobs.shutdown().await;
        info!("Engine stopped");
    }
}
