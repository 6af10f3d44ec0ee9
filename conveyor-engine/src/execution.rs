//! Execution protocol
//!
//! Runs a single attempt of a job, either by spawning its command or by
//! invoking its capability, and drives the retry policy shared by the job
//! and pipeline managers.

use std::collections::HashMap;
use std::io;
use std::process::Stdio;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;
use conveyor_core::domain::job::{FailureKind, Job, JobStatus};
use thiserror::Error;
use tokio::process::Command;
use tokio::time;
use tracing::{debug, info, warn};

use crate::backoff::Backoff;
use crate::capability::{CapabilityArgs, CapabilityError, CapabilityRegistry};

/// Why a single attempt failed
#[derive(Debug, Error)]
pub enum AttemptError {
    #[error("command exited with status {code}: {output}")]
    Exit { code: i32, output: String },

    #[error("command terminated by signal: {output}")]
    Signalled { output: String },

    #[error("failed to run '{command}': {source}")]
    Io {
        command: String,
        #[source]
        source: io::Error,
    },

    #[error("attempt timed out after {0:?}")]
    Timeout(Duration),

    #[error("capability not found: {0}")]
    CapabilityNotFound(String),

    #[error("capability failed: {0}")]
    Capability(#[from] CapabilityError),
}

impl AttemptError {
    pub fn kind(&self) -> FailureKind {
        match self {
            AttemptError::Timeout(_) => FailureKind::Timeout,
            AttemptError::CapabilityNotFound(_) => FailureKind::NotFound,
            _ => FailureKind::Execution,
        }
    }
}

/// Receives every state change of a job while it runs
///
/// The job manager writes changes back into its registry and the store; the
/// pipeline manager into the pipeline that owns the job.
#[async_trait]
pub trait JobTracker: Send + Sync {
    async fn record(&self, job: &Job);
}

/// Runs jobs against the command line or the capability registry
pub struct Executor {
    capabilities: Arc<CapabilityRegistry>,
    backoff: Backoff,
}

impl Executor {
    pub fn new(capabilities: Arc<CapabilityRegistry>, backoff: Backoff) -> Self {
        Self {
            capabilities,
            backoff,
        }
    }

    pub fn capabilities(&self) -> &CapabilityRegistry {
        &self.capabilities
    }

    /// Run `job` until it completes or exhausts its retry budget
    ///
    /// Moves the job to Running, retries failed attempts with backoff and
    /// leaves it Completed or Failed with `finished_at` set.
    pub async fn run(&self, job: &mut Job, tracker: &dyn JobTracker) {
        job.status = JobStatus::Running;
        job.started_at = Some(Utc::now());
        job.finished_at = None;
        tracker.record(job).await;
        info!("Job {} started", job.id);

        loop {
            let attempt = job.retry_count.saturating_add(1);
            debug!("Job {} attempt {}", job.id, attempt);

            match self.attempt(job).await {
                Ok(output) => {
                    job.result = Some(output);
                    job.error = None;
                    job.failure = None;
                    job.status = JobStatus::Completed;
                    info!("Job {} completed on attempt {}", job.id, attempt);
                    break;
                }
                Err(e) => {
                    job.retry_count = job.retry_count.saturating_add(1);
                    job.error = Some(e.to_string());
                    job.failure = Some(e.kind());

                    if job.retry_count >= job.max_retries.saturating_add(1) {
                        job.status = JobStatus::Failed;
                        warn!("Job {} failed after {} attempt(s): {}", job.id, attempt, e);
                        break;
                    }

                    let delay = self.backoff.delay(job.retry_count);
                    warn!(
                        "Job {} attempt {}/{} failed: {}; retrying in {:?}",
                        job.id,
                        attempt,
                        job.max_retries.saturating_add(1),
                        e,
                        delay
                    );
                    tracker.record(job).await;
                    time::sleep(delay).await;
                }
            }
        }

        job.finished_at = Some(Utc::now());
        tracker.record(job).await;
    }

    /// One attempt, bounded by the job's timeout
    pub async fn attempt(&self, job: &Job) -> Result<String, AttemptError> {
        match &job.capability {
            Some(name) => {
                let value = self
                    .invoke(name, capability_args(&job.args), job.timeout())
                    .await?;
                Ok(render_value(value))
            }
            None => run_command(job).await,
        }
    }

    /// Invoke a registered capability with a deadline
    pub async fn invoke(
        &self,
        name: &str,
        args: CapabilityArgs,
        timeout: Duration,
    ) -> Result<serde_json::Value, AttemptError> {
        let capability = self
            .capabilities
            .get(name)
            .ok_or_else(|| AttemptError::CapabilityNotFound(name.to_string()))?;

        match time::timeout(timeout, capability.execute(args)).await {
            Ok(result) => Ok(result?),
            Err(_) => Err(AttemptError::Timeout(timeout)),
        }
    }
}

/// Spawn the job's command and collect stdout followed by stderr
///
/// The child is killed if the deadline passes first.
async fn run_command(job: &Job) -> Result<String, AttemptError> {
    let mut command = Command::new(&job.command);
    command
        .args(&job.args)
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .kill_on_drop(true);
    if let Some(dir) = &job.work_dir {
        command.current_dir(dir);
    }

    let io_error = |source| AttemptError::Io {
        command: job.command.clone(),
        source,
    };

    let child = command.spawn().map_err(io_error)?;
    let output = match time::timeout(job.timeout(), child.wait_with_output()).await {
        Ok(result) => result.map_err(io_error)?,
        Err(_) => return Err(AttemptError::Timeout(job.timeout())),
    };

    let mut combined = String::from_utf8_lossy(&output.stdout).into_owned();
    combined.push_str(&String::from_utf8_lossy(&output.stderr));

    if output.status.success() {
        return Ok(combined);
    }
    match output.status.code() {
        Some(code) => Err(AttemptError::Exit {
            code,
            output: combined.trim().to_string(),
        }),
        None => Err(AttemptError::Signalled {
            output: combined.trim().to_string(),
        }),
    }
}

/// Reinterpret positional job arguments as capability arguments
///
/// `key=value` becomes `{key: value}`; anything else becomes `{arg<i>: value}`.
pub fn capability_args(args: &[String]) -> CapabilityArgs {
    let mut map = HashMap::with_capacity(args.len());
    for (index, arg) in args.iter().enumerate() {
        match arg.split_once('=') {
            Some((key, value)) if !key.is_empty() => {
                map.insert(key.to_string(), serde_json::Value::String(value.to_string()));
            }
            _ => {
                map.insert(format!("arg{}", index), serde_json::Value::String(arg.clone()));
            }
        }
    }
    map
}

/// Text recorded as a job result for a capability's return value
pub fn render_value(value: serde_json::Value) -> String {
    match value {
        serde_json::Value::String(s) => s,
        other => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;
    use std::sync::atomic::{AtomicU32, Ordering};

    use crate::capability::Capability;

    #[derive(Default)]
    struct Recorder {
        seen: Mutex<Vec<(JobStatus, u32)>>,
    }

    #[async_trait]
    impl JobTracker for Recorder {
        async fn record(&self, job: &Job) {
            self.seen.lock().unwrap().push((job.status, job.retry_count));
        }
    }

    /// Fails until it has been called `succeed_on` times
    struct Flaky {
        calls: AtomicU32,
        succeed_on: u32,
    }

    #[async_trait]
    impl Capability for Flaky {
        fn name(&self) -> &str {
            "flaky"
        }

        async fn execute(&self, _args: CapabilityArgs) -> Result<serde_json::Value, CapabilityError> {
            let call = self.calls.fetch_add(1, Ordering::SeqCst) + 1;
            if call >= self.succeed_on {
                Ok(serde_json::json!({"call": call}))
            } else {
                Err(CapabilityError::Failed(format!("call {}", call)))
            }
        }
    }

    struct Sleepy;

    #[async_trait]
    impl Capability for Sleepy {
        fn name(&self) -> &str {
            "sleepy"
        }

        async fn execute(&self, _args: CapabilityArgs) -> Result<serde_json::Value, CapabilityError> {
            time::sleep(Duration::from_secs(30)).await;
            Ok(serde_json::Value::Null)
        }
    }

    fn executor_with(registry: CapabilityRegistry) -> Executor {
        Executor::new(
            Arc::new(registry),
            Backoff::new(Duration::from_millis(1), Duration::from_millis(5)),
        )
    }

    #[test]
    fn test_capability_args() {
        let args = capability_args(&[
            "name=world".to_string(),
            "plain".to_string(),
            "url=http://x?a=b".to_string(),
            "=odd".to_string(),
        ]);
        assert_eq!(args["name"], "world");
        assert_eq!(args["arg1"], "plain");
        assert_eq!(args["url"], "http://x?a=b");
        assert_eq!(args["arg3"], "=odd");
        assert_eq!(args.len(), 4);
    }

    #[test]
    fn test_render_value() {
        assert_eq!(render_value(serde_json::json!("A")), "A");
        assert_eq!(render_value(serde_json::json!({"n": 1})), r#"{"n":1}"#);
        assert_eq!(render_value(serde_json::Value::Null), "null");
    }

    #[tokio::test]
    async fn test_command_success_captures_output() {
        let executor = executor_with(CapabilityRegistry::new());
        let job = Job::new("c1", "sh", vec!["-c".to_string(), "echo out; echo err >&2".to_string()]);

        let output = executor.attempt(&job).await.unwrap();
        assert_eq!(output, "out\nerr\n");
    }

    #[tokio::test]
    async fn test_command_uses_work_dir() {
        let dir = tempfile::TempDir::new().unwrap();
        let executor = executor_with(CapabilityRegistry::new());
        let job = Job::new("c2", "pwd", vec![]).with_work_dir(dir.path().to_string_lossy());

        let output = executor.attempt(&job).await.unwrap();
        let expected = dir.path().canonicalize().unwrap();
        assert_eq!(
            std::path::Path::new(output.trim()).canonicalize().unwrap(),
            expected
        );
    }

    #[tokio::test]
    async fn test_command_non_zero_exit() {
        let executor = executor_with(CapabilityRegistry::new());
        let job = Job::new("c3", "sh", vec!["-c".to_string(), "echo bad; exit 7".to_string()]);

        let err = executor.attempt(&job).await.unwrap_err();
        assert!(matches!(err, AttemptError::Exit { code: 7, ref output } if output == "bad"));
        assert_eq!(err.kind(), FailureKind::Execution);
    }

    #[tokio::test]
    async fn test_command_timeout_is_distinct() {
        let executor = executor_with(CapabilityRegistry::new());
        let job = Job::new("c4", "sleep", vec!["5".to_string()])
            .with_timeout(Duration::from_millis(100));

        let started = std::time::Instant::now();
        let err = executor.attempt(&job).await.unwrap_err();
        assert!(matches!(err, AttemptError::Timeout(_)));
        assert_eq!(err.kind(), FailureKind::Timeout);
        assert!(started.elapsed() < Duration::from_secs(4));
    }

    #[tokio::test]
    async fn test_missing_program() {
        let executor = executor_with(CapabilityRegistry::new());
        let job = Job::new("c5", "/definitely/not/a/program", vec![]);

        let err = executor.attempt(&job).await.unwrap_err();
        assert!(matches!(err, AttemptError::Io { .. }));
    }

    #[tokio::test]
    async fn test_unknown_capability() {
        let executor = executor_with(CapabilityRegistry::new());
        let job = Job::for_capability("k1", "nope", vec![]);

        let err = executor.attempt(&job).await.unwrap_err();
        assert!(matches!(err, AttemptError::CapabilityNotFound(ref n) if n == "nope"));
        assert_eq!(err.kind(), FailureKind::NotFound);
    }

    #[tokio::test]
    async fn test_capability_timeout() {
        let mut registry = CapabilityRegistry::new();
        registry.register(Sleepy).unwrap();
        let executor = executor_with(registry);
        let job = Job::for_capability("k2", "sleepy", vec![]).with_timeout(Duration::from_millis(50));

        let err = executor.attempt(&job).await.unwrap_err();
        assert!(matches!(err, AttemptError::Timeout(_)));
    }

    #[tokio::test]
    async fn test_run_retries_until_success() {
        let mut registry = CapabilityRegistry::new();
        registry
            .register(Flaky {
                calls: AtomicU32::new(0),
                succeed_on: 3,
            })
            .unwrap();
        let executor = executor_with(registry);
        let recorder = Recorder::default();
        let mut job = Job::for_capability("r1", "flaky", vec![]).with_max_retries(5);

        executor.run(&mut job, &recorder).await;

        assert_eq!(job.status, JobStatus::Completed);
        assert_eq!(job.retry_count, 2);
        assert_eq!(job.result.as_deref(), Some(r#"{"call":3}"#));
        assert!(job.error.is_none());
        assert!(job.started_at.is_some());
        assert!(job.finished_at.is_some());

        let seen = recorder.seen.lock().unwrap().clone();
        assert_eq!(seen.first(), Some(&(JobStatus::Running, 0)));
        assert_eq!(seen.last(), Some(&(JobStatus::Completed, 2)));
    }

    #[tokio::test]
    async fn test_run_exhausts_retries() {
        let mut registry = CapabilityRegistry::new();
        registry
            .register(Flaky {
                calls: AtomicU32::new(0),
                succeed_on: u32::MAX,
            })
            .unwrap();
        let executor = executor_with(registry);
        let recorder = Recorder::default();
        let mut job = Job::for_capability("r2", "flaky", vec![]).with_max_retries(2);

        executor.run(&mut job, &recorder).await;

        assert_eq!(job.status, JobStatus::Failed);
        assert_eq!(job.retry_count, 3);
        assert!(job.result.is_none());
        assert_eq!(job.error.as_deref(), Some("capability failed: call 3"));
        assert_eq!(job.failure, Some(FailureKind::Execution));

        let statuses: Vec<JobStatus> = recorder.seen.lock().unwrap().iter().map(|s| s.0).collect();
        assert!(statuses[..statuses.len() - 1].iter().all(|s| *s == JobStatus::Running));
        assert_eq!(statuses.last(), Some(&JobStatus::Failed));
    }

    #[tokio::test]
    async fn test_huge_retry_budget_does_not_overflow_while_logging() {
        let subscriber = tracing_subscriber::fmt()
            .with_max_level(tracing::Level::TRACE)
            .with_test_writer()
            .finish();
        let _guard = tracing::subscriber::set_default(subscriber);

        let mut registry = CapabilityRegistry::new();
        registry
            .register(Flaky {
                calls: AtomicU32::new(0),
                succeed_on: u32::MAX,
            })
            .unwrap();
        let executor = executor_with(registry);
        let recorder = Recorder::default();
        let mut job = Job::for_capability("r3", "flaky", vec![]).with_max_retries(u32::MAX);
        job.retry_count = u32::MAX - 2;

        executor.run(&mut job, &recorder).await;

        assert_eq!(job.status, JobStatus::Failed);
        assert_eq!(job.retry_count, u32::MAX);
        let seen = recorder.seen.lock().unwrap().clone();
        assert!(seen.contains(&(JobStatus::Running, u32::MAX - 1)));
        assert_eq!(seen.last(), Some(&(JobStatus::Failed, u32::MAX)));
    }
}
