//! Job Manager
//!
//! Owns the job registry, a bounded FIFO queue of job IDs and a fixed pool of
//! workers draining it. Submitting blocks once the queue is full.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;
use conveyor_core::domain::job::{FailureKind, Job, JobStatus};
use conveyor_core::dto::job::CreateJob;
use conveyor_core::dto::stats::StatusCounts;
use tokio::sync::{Mutex, mpsc};
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

use super::generate_id;
use super::validation::{validate_id, validate_job};
use crate::config::EngineConfig;
use crate::error::{EngineError, EngineResult};
use crate::execution::{Executor, JobTracker};
use crate::repository;
use crate::store::Store;

pub(crate) const INTERRUPTED: &str = "interrupted by engine restart";

/// Job registry shared with the workers
struct Registry {
    jobs: Mutex<HashMap<String, Job>>,
    store: Arc<dyn Store>,
}

impl Registry {
    /// Persist a state change; failures are logged and the in-memory state kept
    async fn persist(&self, job: &Job) {
        if let Err(e) = repository::jobs::save(self.store.as_ref(), job).await {
            error!("Failed to persist job {}: {}", job.id, e);
        }
    }
}

#[async_trait]
impl JobTracker for Registry {
    async fn record(&self, job: &Job) {
        self.jobs.lock().await.insert(job.id.clone(), job.clone());
        self.persist(job).await;
    }
}

pub struct JobManager {
    registry: Arc<Registry>,
    queue: Mutex<Option<mpsc::Sender<String>>>,
    workers: Mutex<Vec<JoinHandle<()>>>,
    default_timeout: Duration,
    default_max_retries: u32,
}

impl JobManager {
    /// Create the manager and spawn its worker pool
    pub fn start(config: &EngineConfig, store: Arc<dyn Store>, executor: Arc<Executor>) -> Self {
        let (sender, receiver) = mpsc::channel(config.job_queue_capacity);
        let receiver = Arc::new(Mutex::new(receiver));
        let registry = Arc::new(Registry {
            jobs: Mutex::new(HashMap::new()),
            store,
        });

        let workers = (0..config.job_workers)
            .map(|worker_id| {
                tokio::spawn(worker_loop(
                    worker_id,
                    Arc::clone(&registry),
                    Arc::clone(&executor),
                    Arc::clone(&receiver),
                ))
            })
            .collect();

        info!(
            "Job manager started with {} workers (queue capacity {})",
            config.job_workers, config.job_queue_capacity
        );

        Self {
            registry,
            queue: Mutex::new(Some(sender)),
            workers: Mutex::new(workers),
            default_timeout: config.default_timeout,
            default_max_retries: config.default_max_retries,
        }
    }

    /// Build a job from a request, register it and queue it
    ///
    /// Without a caller-supplied ID a fresh one is generated; absent timeout
    /// and retry budget fall back to the engine defaults.
    pub async fn create_job(&self, req: CreateJob) -> EngineResult<Job> {
        let id = match req.id {
            Some(id) => id,
            None => self.unused_id().await,
        };

        let mut job = match req.capability {
            Some(capability) => Job::for_capability(id, capability, req.args),
            None => Job::new(id, req.command, req.args),
        };
        job.work_dir = req.work_dir;
        job.timeout_ms = req
            .timeout_ms
            .unwrap_or(u64::try_from(self.default_timeout.as_millis()).unwrap_or(u64::MAX));
        job.max_retries = req.max_retries.unwrap_or(self.default_max_retries);

        self.add_job(job.clone()).await?;
        Ok(job)
    }

    /// Register a caller-constructed job and queue it
    ///
    /// The job is persisted before it becomes visible; if that fails the job
    /// is not registered. Blocks while the queue is full.
    ///
    /// # Errors
    /// - `Validation` for an invalid definition, a non-Pending status or a taken ID
    /// - `Persistence` if the store rejects the write
    /// - `ShuttingDown` once [`JobManager::shutdown`] has been called
    pub async fn add_job(&self, job: Job) -> EngineResult<()> {
        validate_job(&job)?;
        if job.status != JobStatus::Pending {
            return Err(EngineError::Validation(format!(
                "New jobs must be Pending, got {}",
                job.status
            )));
        }

        let queue = self.sender().await?;
        let id = job.id.clone();

        {
            let mut jobs = self.registry.jobs.lock().await;
            if jobs.contains_key(&id) {
                return Err(EngineError::Validation(format!(
                    "Job '{}' already exists",
                    id
                )));
            }
            repository::jobs::save(self.registry.store.as_ref(), &job).await?;
            jobs.insert(id.clone(), job);
        }

        info!("Job {} accepted", id);
        enqueue(&queue, id).await
    }

    pub async fn get_job(&self, id: &str) -> EngineResult<Job> {
        self.registry
            .jobs
            .lock()
            .await
            .get(id)
            .cloned()
            .ok_or_else(|| EngineError::job_not_found(id))
    }

    /// Snapshot of every tracked job, oldest first
    pub async fn list_jobs(&self) -> Vec<Job> {
        let mut jobs: Vec<Job> = self.registry.jobs.lock().await.values().cloned().collect();
        jobs.sort_by(|a, b| a.created_at.cmp(&b.created_at).then_with(|| a.id.cmp(&b.id)));
        jobs
    }

    /// Replace a tracked job's record and persist it
    ///
    /// # Errors
    /// - `NotFound` for an untracked ID
    /// - `Validation` while the job is Running, since its worker owns the record
    pub async fn update_job(&self, job: Job) -> EngineResult<()> {
        validate_id(&job.id)?;

        let mut jobs = self.registry.jobs.lock().await;
        match jobs.get(&job.id) {
            None => return Err(EngineError::job_not_found(&job.id)),
            Some(current) if current.status == JobStatus::Running => {
                return Err(EngineError::Validation(format!(
                    "Job '{}' is running and cannot be updated",
                    job.id
                )));
            }
            Some(_) => {}
        }
        repository::jobs::save(self.registry.store.as_ref(), &job).await?;

        info!("Job {} updated (status {})", job.id, job.status);
        jobs.insert(job.id.clone(), job);
        Ok(())
    }

    /// Fresh-run copies of the given jobs, in the given order
    ///
    /// # Errors
    /// `Validation` naming the first ID that is not tracked
    pub async fn snapshot(&self, ids: &[String]) -> EngineResult<Vec<Job>> {
        let jobs = self.registry.jobs.lock().await;
        ids.iter()
            .map(|id| {
                jobs.get(id)
                    .map(Job::snapshot)
                    .ok_or_else(|| EngineError::Validation(format!("Unknown job '{}'", id)))
            })
            .collect()
    }

    /// Fails with `Validation` unless every ID is tracked
    pub async fn ensure_known<'a>(&self, ids: impl IntoIterator<Item = &'a str>) -> EngineResult<()> {
        let jobs = self.registry.jobs.lock().await;
        for id in ids {
            if !jobs.contains_key(id) {
                return Err(EngineError::Validation(format!("Unknown job '{}'", id)));
            }
        }
        Ok(())
    }

    pub async fn stats(&self) -> StatusCounts {
        let mut counts = StatusCounts::default();
        for job in self.registry.jobs.lock().await.values() {
            counts.record_job(job.status);
        }
        counts
    }

    /// Load jobs persisted by a previous process
    ///
    /// Jobs caught Running are marked Failed; Pending jobs are queued again.
    /// Returns the number of re-queued jobs.
    pub async fn restore(&self, jobs: Vec<Job>) -> EngineResult<usize> {
        let queue = self.sender().await?;
        let mut pending = Vec::new();

        {
            let mut registry = self.registry.jobs.lock().await;
            for mut job in jobs {
                match job.status {
                    JobStatus::Running => {
                        warn!("Job {} was interrupted, marking it failed", job.id);
                        job.status = JobStatus::Failed;
                        job.failure = Some(FailureKind::Interrupted);
                        job.error = Some(INTERRUPTED.to_string());
                        job.finished_at = Some(Utc::now());
                        self.registry.persist(&job).await;
                    }
                    JobStatus::Pending => pending.push((job.created_at, job.id.clone())),
                    _ => {}
                }
                registry.insert(job.id.clone(), job);
            }
        }

        pending.sort();
        let requeued = pending.len();
        for (_, id) in pending {
            enqueue(&queue, id).await?;
        }

        info!("Restored jobs, {} re-queued", requeued);
        Ok(requeued)
    }

    /// Stop accepting jobs and wait for the queue to drain
    pub async fn shutdown(&self) {
        let Some(queue) = self.queue.lock().await.take() else {
            return;
        };
        info!("Job manager shutting down, draining queue");
        drop(queue);

        let workers = std::mem::take(&mut *self.workers.lock().await);
        for worker in workers {
            if let Err(e) = worker.await {
                error!("Job worker panicked: {}", e);
            }
        }
        info!("Job manager stopped");
    }

    async fn sender(&self) -> EngineResult<mpsc::Sender<String>> {
        self.queue
            .lock()
            .await
            .clone()
            .ok_or(EngineError::ShuttingDown)
    }

    async fn unused_id(&self) -> String {
        let jobs = self.registry.jobs.lock().await;
        loop {
            let id = generate_id();
            if !jobs.contains_key(&id) {
                return id;
            }
        }
    }
}

async fn enqueue(queue: &mpsc::Sender<String>, id: String) -> EngineResult<()> {
    debug!("Queueing job {}", id);
    queue
        .send(id)
        .await
        .map_err(|_| EngineError::ShuttingDown)
}

async fn worker_loop(
    worker_id: usize,
    registry: Arc<Registry>,
    executor: Arc<Executor>,
    queue: Arc<Mutex<mpsc::Receiver<String>>>,
) {
    debug!("Job worker {} started", worker_id);

    loop {
        let next = queue.lock().await.recv().await;
        let Some(id) = next else {
            break;
        };

        let job = registry.jobs.lock().await.get(&id).cloned();
        let Some(mut job) = job else {
            warn!("Job {} vanished before it could run", id);
            continue;
        };
        if job.status != JobStatus::Pending {
            warn!("Skipping job {}: status is {}", id, job.status);
            continue;
        }

        executor.run(&mut job, registry.as_ref()).await;
    }

    debug!("Job worker {} stopped", worker_id);
}
