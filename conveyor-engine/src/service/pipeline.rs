//! Pipeline Manager
//!
//! Owns the pipeline registry, a bounded queue, its own worker pool and the
//! scheduler that feeds the queue. A pipeline runs its jobs strictly in order
//! and stops at the first job that fails.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use conveyor_core::domain::job::{FailureKind, Job, JobStatus};
use conveyor_core::domain::pipeline::{Pipeline, PipelineStatus};
use conveyor_core::dto::pipeline::{CreatePipeline, UpdatePipeline};
use conveyor_core::dto::stats::StatusCounts;
use tokio::sync::mpsc::error::TrySendError;
use tokio::sync::{Mutex, mpsc};
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

use super::JobManager;
use super::generate_id;
use super::job::INTERRUPTED;
use super::validation::{validate_id, validate_name};
use crate::config::EngineConfig;
use crate::error::{EngineError, EngineResult};
use crate::execution::{Executor, JobTracker};
use crate::repository;
use crate::scheduler::PipelineScheduler;
use crate::store::Store;

/// Pipeline registry shared with the workers and the scheduler
pub(crate) struct PipelineRegistry {
    pipelines: Mutex<HashMap<String, Pipeline>>,
    store: Arc<dyn Store>,
}

impl PipelineRegistry {
    /// Persist a state change; failures are logged and the in-memory state kept
    async fn persist(&self, pipeline: &Pipeline) {
        if let Err(e) = repository::pipelines::save(self.store.as_ref(), pipeline).await {
            error!("Failed to persist pipeline {}: {}", pipeline.id, e);
        }
    }

    /// Move every due Pending pipeline to Running and queue it
    ///
    /// Status flip, enqueue and persist all happen under the registry lock,
    /// so a pipeline is promoted at most once however often this runs. When
    /// the queue is full the remaining due pipelines wait for a later tick.
    pub(crate) async fn promote_due(&self, queue: &mpsc::Sender<String>, now: DateTime<Utc>) -> usize {
        let mut pipelines = self.pipelines.lock().await;
        let mut due: Vec<&mut Pipeline> = pipelines.values_mut().filter(|p| p.is_due(now)).collect();
        due.sort_by_key(|p| p.scheduled_at);

        let mut promoted = 0;
        for pipeline in due {
            match queue.try_send(pipeline.id.clone()) {
                Ok(()) => {
                    pipeline.status = PipelineStatus::Running;
                    info!("Pipeline {} promoted by scheduler", pipeline.id);
                    self.persist(pipeline).await;
                    promoted += 1;
                }
                Err(TrySendError::Full(_)) => {
                    debug!("Pipeline queue full, deferring remaining due pipelines");
                    break;
                }
                Err(TrySendError::Closed(_)) => break,
            }
        }
        promoted
    }

    /// Take a queued pipeline for execution
    async fn claim(&self, id: &str) -> Option<Pipeline> {
        let mut pipelines = self.pipelines.lock().await;
        let Some(pipeline) = pipelines.get_mut(id) else {
            warn!("Pipeline {} vanished before it could run", id);
            return None;
        };
        if pipeline.status != PipelineStatus::Running {
            warn!("Skipping pipeline {}: status is {}", id, pipeline.status);
            return None;
        }

        pipeline.started_at = Some(Utc::now());
        pipeline.finished_at = None;
        pipeline.context.clear();
        pipeline.failed_job = None;
        pipeline.error = None;
        Some(pipeline.clone())
    }

    /// Copy run state from the worker's copy into the registry
    async fn sync(&self, run: &Pipeline) {
        if let Some(entry) = self.pipelines.lock().await.get_mut(&run.id) {
            apply_run_state(entry, run);
        }
    }

    /// Merge the final run state and persist the merged entry
    ///
    /// Edits made while the pipeline ran (a rename) are kept in the store.
    async fn finish(&self, run: &Pipeline) {
        let mut pipelines = self.pipelines.lock().await;
        match pipelines.get_mut(&run.id) {
            Some(entry) => {
                apply_run_state(entry, run);
                self.persist(entry).await;
            }
            None => self.persist(run).await,
        }
    }
}

/// Everything a run changes; name and definition stay as the registry has them
fn apply_run_state(entry: &mut Pipeline, run: &Pipeline) {
    entry.status = run.status;
    entry.started_at = run.started_at;
    entry.finished_at = run.finished_at;
    entry.context = run.context.clone();
    entry.failed_job = run.failed_job.clone();
    entry.error = run.error.clone();
    entry.jobs = run.jobs.clone();
}

/// Mirrors progress of one job into the pipeline that owns it
struct StepTracker<'a> {
    registry: &'a PipelineRegistry,
    pipeline_id: &'a str,
    index: usize,
}

#[async_trait]
impl<'a> JobTracker for StepTracker<'a> {
    async fn record(&self, job: &Job) {
        let mut pipelines = self.registry.pipelines.lock().await;
        if let Some(slot) = pipelines
            .get_mut(self.pipeline_id)
            .and_then(|p| p.jobs.get_mut(self.index))
        {
            if slot.id == job.id {
                *slot = job.clone();
            }
        }
    }
}

pub struct PipelineManager {
    registry: Arc<PipelineRegistry>,
    jobs: Arc<JobManager>,
    queue: Mutex<Option<mpsc::Sender<String>>>,
    workers: Mutex<Vec<JoinHandle<()>>>,
    scheduler: Mutex<Option<PipelineScheduler>>,
}

impl PipelineManager {
    /// Create the manager, spawn its worker pool and start the scheduler
    pub fn start(
        config: &EngineConfig,
        store: Arc<dyn Store>,
        executor: Arc<Executor>,
        jobs: Arc<JobManager>,
    ) -> Self {
        let (sender, receiver) = mpsc::channel(config.pipeline_queue_capacity);
        let receiver = Arc::new(Mutex::new(receiver));
        let registry = Arc::new(PipelineRegistry {
            pipelines: Mutex::new(HashMap::new()),
            store,
        });

        let workers = (0..config.pipeline_workers)
            .map(|worker_id| {
                tokio::spawn(worker_loop(
                    worker_id,
                    Arc::clone(&registry),
                    Arc::clone(&executor),
                    Arc::clone(&receiver),
                ))
            })
            .collect();

        let scheduler = PipelineScheduler::spawn(
            Arc::clone(&registry),
            sender.clone(),
            config.scheduler_interval,
        );

        info!(
            "Pipeline manager started with {} workers (queue capacity {})",
            config.pipeline_workers, config.pipeline_queue_capacity
        );

        Self {
            registry,
            jobs,
            queue: Mutex::new(Some(sender)),
            workers: Mutex::new(workers),
            scheduler: Mutex::new(Some(scheduler)),
        }
    }

    /// Register a caller-constructed pipeline
    ///
    /// Does not queue it; the scheduler picks it up once `scheduled_at` has
    /// passed, or [`PipelineManager::run_pipeline`] starts it explicitly.
    ///
    /// # Errors
    /// - `Validation` for a taken ID, an empty job list or an unknown job
    /// - `Persistence` if the store rejects the write
    pub async fn add_pipeline(&self, pipeline: Pipeline) -> EngineResult<()> {
        validate_id(&pipeline.id)?;
        validate_name(&pipeline.name)?;
        if pipeline.status != PipelineStatus::Pending {
            return Err(EngineError::Validation(format!(
                "New pipelines must be Pending, got {}",
                pipeline.status
            )));
        }
        if pipeline.jobs.is_empty() {
            return Err(EngineError::Validation(
                "Pipeline must contain at least one job".to_string(),
            ));
        }
        self.jobs.ensure_known(pipeline.job_ids()).await?;

        let id = pipeline.id.clone();
        let scheduled_at = pipeline.scheduled_at;
        {
            let mut pipelines = self.registry.pipelines.lock().await;
            if pipelines.contains_key(&id) {
                return Err(EngineError::Validation(format!(
                    "Pipeline '{}' already exists",
                    id
                )));
            }
            repository::pipelines::save(self.registry.store.as_ref(), &pipeline).await?;
            pipelines.insert(id.clone(), pipeline);
        }

        info!("Pipeline {} accepted (scheduled at {})", id, scheduled_at);
        Ok(())
    }

    /// Build a pipeline from already-submitted jobs and register it
    ///
    /// The pipeline gets its own copies of the jobs, taken now.
    pub async fn create_pipeline(&self, req: CreatePipeline) -> EngineResult<Pipeline> {
        let jobs = self.jobs.snapshot(&req.job_ids).await?;
        let id = match req.id {
            Some(id) => id,
            None => generate_id(),
        };
        let scheduled_at = req.scheduled_at.unwrap_or_else(Utc::now);

        let pipeline = Pipeline::new(id, req.name, jobs, scheduled_at);
        self.add_pipeline(pipeline.clone()).await?;
        Ok(pipeline)
    }

    pub async fn get_pipeline(&self, id: &str) -> EngineResult<Pipeline> {
        self.registry
            .pipelines
            .lock()
            .await
            .get(id)
            .cloned()
            .ok_or_else(|| EngineError::pipeline_not_found(id))
    }

    /// Snapshot of every tracked pipeline, oldest first
    pub async fn list_pipelines(&self) -> Vec<Pipeline> {
        let mut pipelines: Vec<Pipeline> = self
            .registry
            .pipelines
            .lock()
            .await
            .values()
            .cloned()
            .collect();
        pipelines.sort_by(|a, b| a.created_at.cmp(&b.created_at).then_with(|| a.id.cmp(&b.id)));
        pipelines
    }

    /// Rename a pipeline and/or replace its job list
    ///
    /// New jobs are snapshotted from the job manager. The job list of a
    /// running pipeline cannot be replaced.
    pub async fn update_pipeline(&self, id: &str, update: UpdatePipeline) -> EngineResult<Pipeline> {
        if let Some(name) = &update.name {
            validate_name(name)?;
        }
        let jobs = match &update.job_ids {
            Some(ids) if ids.is_empty() => {
                return Err(EngineError::Validation(
                    "Pipeline must contain at least one job".to_string(),
                ));
            }
            Some(ids) => Some(self.jobs.snapshot(ids).await?),
            None => None,
        };

        let mut pipelines = self.registry.pipelines.lock().await;
        let current = pipelines
            .get(id)
            .ok_or_else(|| EngineError::pipeline_not_found(id))?;

        let mut updated = current.clone();
        if let Some(name) = update.name {
            updated.name = name;
        }
        if let Some(jobs) = jobs {
            if current.status == PipelineStatus::Running {
                return Err(EngineError::Validation(format!(
                    "Cannot replace the jobs of running pipeline '{}'",
                    id
                )));
            }
            updated.jobs = jobs;
        }

        repository::pipelines::save(self.registry.store.as_ref(), &updated).await?;
        pipelines.insert(id.to_string(), updated.clone());

        info!("Pipeline {} updated", id);
        Ok(updated)
    }

    /// Queue a pipeline now, regardless of its scheduled time
    ///
    /// A finished pipeline is reset and run again. Blocks while the queue is full.
    ///
    /// # Errors
    /// `Validation` if the pipeline is already running
    pub async fn run_pipeline(&self, id: &str) -> EngineResult<Pipeline> {
        let queue = self.sender().await?;

        let pipeline = {
            let mut pipelines = self.registry.pipelines.lock().await;
            let current = pipelines
                .get(id)
                .ok_or_else(|| EngineError::pipeline_not_found(id))?;
            if current.status == PipelineStatus::Running {
                return Err(EngineError::Validation(format!(
                    "Pipeline '{}' is already running",
                    id
                )));
            }

            let mut updated = current.clone();
            if updated.status.is_terminal() {
                updated.reset_run_state();
            }
            updated.status = PipelineStatus::Running;

            repository::pipelines::save(self.registry.store.as_ref(), &updated).await?;
            pipelines.insert(id.to_string(), updated.clone());
            updated
        };

        info!("Pipeline {} queued for immediate run", id);
        queue
            .send(id.to_string())
            .await
            .map_err(|_| EngineError::ShuttingDown)?;
        Ok(pipeline)
    }

    /// Results of the jobs that completed in the pipeline's current run
    pub async fn pipeline_context(&self, id: &str) -> EngineResult<HashMap<String, String>> {
        Ok(self.get_pipeline(id).await?.context)
    }

    /// Forget a pipeline, in memory and in the store
    ///
    /// # Errors
    /// - `NotFound` for an unknown ID
    /// - `Validation` while the pipeline is queued or running
    /// - `Persistence` if the store rejects the removal; the pipeline is kept
    pub async fn delete_pipeline(&self, id: &str) -> EngineResult<()> {
        let mut pipelines = self.registry.pipelines.lock().await;
        let current = pipelines
            .get(id)
            .ok_or_else(|| EngineError::pipeline_not_found(id))?;
        if current.status == PipelineStatus::Running {
            return Err(EngineError::Validation(format!(
                "Cannot delete running pipeline '{}'",
                id
            )));
        }

        repository::pipelines::delete(self.registry.store.as_ref(), id).await?;
        pipelines.remove(id);

        info!("Pipeline {} deleted", id);
        Ok(())
    }

    /// Run one scheduler pass immediately
    pub async fn tick(&self) -> usize {
        match self.queue.lock().await.clone() {
            Some(queue) => self.registry.promote_due(&queue, Utc::now()).await,
            None => 0,
        }
    }

    pub async fn stats(&self) -> StatusCounts {
        let mut counts = StatusCounts::default();
        for pipeline in self.registry.pipelines.lock().await.values() {
            counts.record_pipeline(pipeline.status);
        }
        counts
    }

    /// Load pipelines persisted by a previous process
    ///
    /// Pipelines caught Running are marked Failed; Pending ones are left for
    /// the scheduler.
    pub async fn restore(&self, restored: Vec<Pipeline>) {
        let mut pipelines = self.registry.pipelines.lock().await;
        for mut pipeline in restored {
            if pipeline.status == PipelineStatus::Running {
                warn!("Pipeline {} was interrupted, marking it failed", pipeline.id);
                interrupt(&mut pipeline);
                self.registry.persist(&pipeline).await;
            }
            pipelines.insert(pipeline.id.clone(), pipeline);
        }
        info!("Restored {} pipeline(s)", pipelines.len());
    }

    /// Stop the scheduler, then let queued pipelines drain
    pub async fn shutdown(&self) {
        if let Some(scheduler) = self.scheduler.lock().await.take() {
            scheduler.stop().await;
        }

        let Some(queue) = self.queue.lock().await.take() else {
            return;
        };
        info!("Pipeline manager shutting down, draining queue");
        drop(queue);

        let workers = std::mem::take(&mut *self.workers.lock().await);
        for worker in workers {
            if let Err(e) = worker.await {
                error!("Pipeline worker panicked: {}", e);
            }
        }
        info!("Pipeline manager stopped");
    }

    async fn sender(&self) -> EngineResult<mpsc::Sender<String>> {
        self.queue
            .lock()
            .await
            .clone()
            .ok_or(EngineError::ShuttingDown)
    }
}

fn interrupt(pipeline: &mut Pipeline) {
    let now = Utc::now();
    pipeline.status = PipelineStatus::Failed;
    pipeline.error = Some(INTERRUPTED.to_string());
    pipeline.finished_at = Some(now);

    if let Some(job) = pipeline.jobs.iter_mut().find(|j| j.status == JobStatus::Running) {
        job.status = JobStatus::Failed;
        job.failure = Some(FailureKind::Interrupted);
        job.error = Some(INTERRUPTED.to_string());
        job.finished_at = Some(now);
        pipeline.failed_job = Some(job.id.clone());
    }
}

async fn worker_loop(
    worker_id: usize,
    registry: Arc<PipelineRegistry>,
    executor: Arc<Executor>,
    queue: Arc<Mutex<mpsc::Receiver<String>>>,
) {
    debug!("Pipeline worker {} started", worker_id);

    loop {
        let next = queue.lock().await.recv().await;
        let Some(id) = next else {
            break;
        };
        execute(&registry, &executor, &id).await;
    }

    debug!("Pipeline worker {} stopped", worker_id);
}

/// Run every job of the pipeline in order, stopping at the first failure
async fn execute(registry: &PipelineRegistry, executor: &Executor, id: &str) {
    let Some(mut run) = registry.claim(id).await else {
        return;
    };
    info!("Pipeline {} started ({} jobs)", id, run.jobs.len());

    for index in 0..run.jobs.len() {
        let mut job = run.jobs[index].clone();
        job.reset_run_state();

        let tracker = StepTracker {
            registry,
            pipeline_id: id,
            index,
        };
        executor.run(&mut job, &tracker).await;

        let succeeded = job.status == JobStatus::Completed;
        if succeeded {
            run.context
                .insert(job.id.clone(), job.result.clone().unwrap_or_default());
        } else {
            run.status = PipelineStatus::Failed;
            run.failed_job = Some(job.id.clone());
            run.error = job.error.clone();
        }
        run.jobs[index] = job;

        if !succeeded {
            warn!(
                "Pipeline {} failed at job {} ({}/{})",
                id,
                run.jobs[index].id,
                index + 1,
                run.jobs.len()
            );
            break;
        }
        registry.sync(&run).await;
    }

    if run.status == PipelineStatus::Running {
        run.status = PipelineStatus::Completed;
        info!("Pipeline {} completed", id);
    }
    run.finished_at = Some(Utc::now());
    registry.finish(&run).await;
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backoff::Backoff;
    use crate::capability::CapabilityRegistry;
    use crate::store::MemoryStore;
    use std::time::Duration;

    struct Fixture {
        store: Arc<MemoryStore>,
        jobs: Arc<JobManager>,
        pipelines: PipelineManager,
    }

    impl Fixture {
        async fn shutdown(&self) {
            self.pipelines.shutdown().await;
            self.jobs.shutdown().await;
        }
    }

    /// Scheduler interval long enough that only manual ticks promote anything
    fn fixture() -> Fixture {
        let config = EngineConfig {
            scheduler_interval: Duration::from_secs(3600),
            ..EngineConfig::default()
        };
        let store = Arc::new(MemoryStore::new());
        let executor = Arc::new(Executor::new(
            Arc::new(CapabilityRegistry::new()),
            Backoff::new(Duration::from_millis(1), Duration::from_millis(2)),
        ));
        let jobs = Arc::new(JobManager::start(&config, store.clone(), Arc::clone(&executor)));
        let pipelines = PipelineManager::start(&config, store.clone(), executor, Arc::clone(&jobs));
        Fixture {
            store,
            jobs,
            pipelines,
        }
    }

    async fn wait_terminal(manager: &PipelineManager, id: &str) -> Pipeline {
        for _ in 0..500 {
            let pipeline = manager.get_pipeline(id).await.unwrap();
            if pipeline.status.is_terminal() {
                return pipeline;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        panic!("pipeline {} did not finish", id);
    }

    fn create(name: &str, job_ids: &[&str]) -> CreatePipeline {
        CreatePipeline {
            id: Some(name.to_string()),
            name: name.to_string(),
            job_ids: job_ids.iter().map(|s| s.to_string()).collect(),
            scheduled_at: None,
        }
    }

    #[tokio::test]
    async fn test_add_pipeline_validation() {
        let f = fixture();
        f.jobs.add_job(Job::new("a", "true", vec![])).await.unwrap();

        f.pipelines.create_pipeline(create("p1", &["a"])).await.unwrap();

        let duplicate = f.pipelines.create_pipeline(create("p1", &["a"])).await;
        assert!(matches!(duplicate, Err(EngineError::Validation(_))));

        let unknown = f.pipelines.create_pipeline(create("p2", &["a", "ghost"])).await;
        assert!(matches!(unknown, Err(EngineError::Validation(ref m)) if m.contains("ghost")));
        assert!(f.pipelines.get_pipeline("p2").await.is_err());

        let empty = f.pipelines.create_pipeline(create("p3", &[])).await;
        assert!(matches!(empty, Err(EngineError::Validation(_))));

        let foreign = Pipeline::new("p4", "raw", vec![Job::new("never-added", "true", vec![])], Utc::now());
        let result = f.pipelines.add_pipeline(foreign).await;
        assert!(matches!(result, Err(EngineError::Validation(_))));

        f.shutdown().await;
    }

    #[tokio::test]
    async fn test_tick_promotes_once() {
        let f = fixture();
        f.jobs.add_job(Job::new("a", "true", vec![])).await.unwrap();
        f.pipelines.create_pipeline(create("p", &["a"])).await.unwrap();

        assert_eq!(f.pipelines.tick().await, 1);
        assert_eq!(f.pipelines.tick().await, 0);

        let stored = repository::pipelines::find(f.store.as_ref(), "p").await.unwrap().unwrap();
        assert_ne!(stored.status, PipelineStatus::Pending);

        let done = wait_terminal(&f.pipelines, "p").await;
        assert_eq!(done.status, PipelineStatus::Completed);
        assert_eq!(f.pipelines.tick().await, 0);
        f.shutdown().await;
    }

    #[tokio::test]
    async fn test_future_pipeline_is_not_promoted() {
        let f = fixture();
        f.jobs.add_job(Job::new("a", "true", vec![])).await.unwrap();
        let mut req = create("later", &["a"]);
        req.scheduled_at = Some(Utc::now() + chrono::Duration::hours(1));
        f.pipelines.create_pipeline(req).await.unwrap();

        assert_eq!(f.pipelines.tick().await, 0);
        assert_eq!(
            f.pipelines.get_pipeline("later").await.unwrap().status,
            PipelineStatus::Pending
        );
        f.shutdown().await;
    }

    #[tokio::test]
    async fn test_run_pipeline_and_rerun() {
        let f = fixture();
        f.jobs
            .add_job(Job::new("hello", "echo", vec!["hi".to_string()]))
            .await
            .unwrap();
        let mut req = create("p", &["hello"]);
        req.scheduled_at = Some(Utc::now() + chrono::Duration::hours(1));
        f.pipelines.create_pipeline(req).await.unwrap();

        f.pipelines.run_pipeline("p").await.unwrap();
        let first = wait_terminal(&f.pipelines, "p").await;
        assert_eq!(first.status, PipelineStatus::Completed);
        assert_eq!(first.context.get("hello").map(String::as_str), Some("hi\n"));
        assert!(first.started_at.is_some() && first.finished_at.is_some());

        f.pipelines.run_pipeline("p").await.unwrap();
        let second = wait_terminal(&f.pipelines, "p").await;
        assert_eq!(second.status, PipelineStatus::Completed);
        assert!(second.started_at >= first.started_at);

        let missing = f.pipelines.run_pipeline("nope").await;
        assert!(matches!(missing, Err(EngineError::NotFound { .. })));
        f.shutdown().await;
    }

    #[tokio::test]
    async fn test_pipeline_jobs_are_snapshots() {
        let f = fixture();
        f.jobs.add_job(Job::new("shared", "true", vec![])).await.unwrap();
        f.pipelines.create_pipeline(create("p", &["shared"])).await.unwrap();

        let mut tracked = f.jobs.get_job("shared").await.unwrap();
        while !tracked.status.is_terminal() {
            tokio::time::sleep(Duration::from_millis(10)).await;
            tracked = f.jobs.get_job("shared").await.unwrap();
        }
        let finished_at = tracked.finished_at;

        f.pipelines.run_pipeline("p").await.unwrap();
        wait_terminal(&f.pipelines, "p").await;

        let after = f.jobs.get_job("shared").await.unwrap();
        assert_eq!(after.finished_at, finished_at);
        f.shutdown().await;
    }

    #[tokio::test]
    async fn test_update_pipeline() {
        let f = fixture();
        f.jobs.add_job(Job::new("a", "true", vec![])).await.unwrap();
        f.jobs.add_job(Job::new("b", "true", vec![])).await.unwrap();
        let mut req = create("p", &["a"]);
        req.scheduled_at = Some(Utc::now() + chrono::Duration::hours(1));
        f.pipelines.create_pipeline(req).await.unwrap();

        let updated = f
            .pipelines
            .update_pipeline(
                "p",
                UpdatePipeline {
                    name: Some("renamed".to_string()),
                    job_ids: Some(vec!["b".to_string(), "a".to_string()]),
                },
            )
            .await
            .unwrap();
        assert_eq!(updated.name, "renamed");
        assert_eq!(updated.job_ids(), vec!["b", "a"]);

        let stored = repository::pipelines::find(f.store.as_ref(), "p").await.unwrap().unwrap();
        assert_eq!(stored, updated);

        let missing = f.pipelines.update_pipeline("nope", UpdatePipeline::default()).await;
        assert!(matches!(missing, Err(EngineError::NotFound { .. })));

        let unknown = f
            .pipelines
            .update_pipeline(
                "p",
                UpdatePipeline {
                    name: None,
                    job_ids: Some(vec!["zzz".to_string()]),
                },
            )
            .await;
        assert!(matches!(unknown, Err(EngineError::Validation(_))));
        f.shutdown().await;
    }

    #[tokio::test]
    async fn test_delete_pipeline() {
        let f = fixture();
        f.jobs.add_job(Job::new("a", "true", vec![])).await.unwrap();
        let mut req = create("gone", &["a"]);
        req.scheduled_at = Some(Utc::now() + chrono::Duration::hours(1));
        f.pipelines.create_pipeline(req).await.unwrap();

        f.pipelines.delete_pipeline("gone").await.unwrap();

        assert!(matches!(
            f.pipelines.get_pipeline("gone").await,
            Err(EngineError::NotFound { .. })
        ));
        assert!(repository::pipelines::find(f.store.as_ref(), "gone").await.unwrap().is_none());
        assert_eq!(f.pipelines.tick().await, 0);
        assert!(f.jobs.get_job("a").await.is_ok());

        let again = f.pipelines.delete_pipeline("gone").await;
        assert!(matches!(again, Err(EngineError::NotFound { .. })));
        f.shutdown().await;
    }

    #[tokio::test]
    async fn test_running_pipeline_cannot_be_deleted() {
        let f = fixture();
        f.jobs.add_job(Job::new("slow", "sleep", vec!["1".to_string()])).await.unwrap();
        let mut req = create("busy", &["slow"]);
        req.scheduled_at = Some(Utc::now() + chrono::Duration::hours(1));
        f.pipelines.create_pipeline(req).await.unwrap();
        f.pipelines.run_pipeline("busy").await.unwrap();

        let result = f.pipelines.delete_pipeline("busy").await;
        assert!(matches!(result, Err(EngineError::Validation(_))));

        wait_terminal(&f.pipelines, "busy").await;
        f.pipelines.delete_pipeline("busy").await.unwrap();
        f.shutdown().await;
    }

    #[tokio::test]
    async fn test_restore_interrupted_pipeline() {
        let f = fixture();
        let mut pipeline = Pipeline::new(
            "old",
            "old",
            vec![Job::new("x", "true", vec![]), Job::new("y", "true", vec![])],
            Utc::now(),
        );
        pipeline.status = PipelineStatus::Running;
        pipeline.jobs[0].status = JobStatus::Completed;
        pipeline.jobs[1].status = JobStatus::Running;

        f.pipelines.restore(vec![pipeline]).await;

        let restored = f.pipelines.get_pipeline("old").await.unwrap();
        assert_eq!(restored.status, PipelineStatus::Failed);
        assert_eq!(restored.failed_job.as_deref(), Some("y"));
        assert_eq!(restored.jobs[1].failure, Some(FailureKind::Interrupted));
        assert_eq!(f.pipelines.stats().await.failed, 1);
        f.shutdown().await;
    }
}
