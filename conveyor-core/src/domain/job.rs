//! Job domain types

use std::fmt;
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Per-attempt timeout applied when the submitter does not pick one
pub const DEFAULT_TIMEOUT_MS: u64 = 5 * 60 * 1000;

/// Retry budget applied when the submitter does not pick one
pub const DEFAULT_MAX_RETRIES: u32 = 3;

/// A single unit of executable work
///
/// A job either runs an external command (`command` + `args` in `work_dir`)
/// or, when `capability` is set, invokes a registered capability with `args`
/// reinterpreted as `key=value` pairs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Job {
    pub id: String,
    pub command: String,
    #[serde(default)]
    pub args: Vec<String>,
    #[serde(default)]
    pub work_dir: Option<String>,
    pub timeout_ms: u64,
    pub max_retries: u32,
    #[serde(default)]
    pub capability: Option<String>,

    pub status: JobStatus,
    /// Number of attempts that have failed so far
    #[serde(default)]
    pub retry_count: u32,
    #[serde(default)]
    pub result: Option<String>,
    #[serde(default)]
    pub error: Option<String>,
    #[serde(default)]
    pub failure: Option<FailureKind>,
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub started_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub finished_at: Option<DateTime<Utc>>,
}

impl Job {
    /// Build a pending command job with default timeout and retry budget
    pub fn new(id: impl Into<String>, command: impl Into<String>, args: Vec<String>) -> Self {
        Self {
            id: id.into(),
            command: command.into(),
            args,
            work_dir: None,
            timeout_ms: DEFAULT_TIMEOUT_MS,
            max_retries: DEFAULT_MAX_RETRIES,
            capability: None,
            status: JobStatus::Pending,
            retry_count: 0,
            result: None,
            error: None,
            failure: None,
            created_at: Utc::now(),
            started_at: None,
            finished_at: None,
        }
    }

    /// Build a pending job that invokes the named capability
    pub fn for_capability(
        id: impl Into<String>,
        capability: impl Into<String>,
        args: Vec<String>,
    ) -> Self {
        let capability = capability.into();
        let mut job = Self::new(id, capability.clone(), args);
        job.capability = Some(capability);
        job
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout_ms = u64::try_from(timeout.as_millis()).unwrap_or(u64::MAX);
        self
    }

    pub fn with_max_retries(mut self, max_retries: u32) -> Self {
        self.max_retries = max_retries;
        self
    }

    pub fn with_work_dir(mut self, work_dir: impl Into<String>) -> Self {
        self.work_dir = Some(work_dir.into());
        self
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }

    pub fn is_capability(&self) -> bool {
        self.capability.is_some()
    }

    /// Clear everything a previous run wrote, leaving the definition intact
    pub fn reset_run_state(&mut self) {
        self.status = JobStatus::Pending;
        self.retry_count = 0;
        self.result = None;
        self.error = None;
        self.failure = None;
        self.started_at = None;
        self.finished_at = None;
    }

    /// Copy of this job's definition with a clean run state
    pub fn snapshot(&self) -> Job {
        let mut copy = self.clone();
        copy.reset_run_state();
        copy
    }
}

/// Job execution status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum JobStatus {
    Pending,
    Running,
    Completed,
    Failed,
}

impl JobStatus {
    pub fn is_terminal(self) -> bool {
        matches!(self, JobStatus::Completed | JobStatus::Failed)
    }
}

impl fmt::Display for JobStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            JobStatus::Pending => write!(f, "Pending"),
            JobStatus::Running => write!(f, "Running"),
            JobStatus::Completed => write!(f, "Completed"),
            JobStatus::Failed => write!(f, "Failed"),
        }
    }
}

/// Why the last attempt of a job failed
///
/// Recorded next to the error message so operators can tell "ran and failed"
/// apart from "never finished".
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum FailureKind {
    /// The command exited non-zero or the capability returned an error
    Execution,
    /// The attempt exceeded its deadline and was terminated
    Timeout,
    /// The named capability is not registered
    NotFound,
    /// The engine stopped while the job was running
    Interrupted,
}

impl fmt::Display for FailureKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FailureKind::Execution => write!(f, "execution"),
            FailureKind::Timeout => write!(f, "timeout"),
            FailureKind::NotFound => write!(f, "not-found"),
            FailureKind::Interrupted => write!(f, "interrupted"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_job_defaults() {
        let job = Job::new("j1", "echo", vec!["hi".to_string()]);
        assert_eq!(job.status, JobStatus::Pending);
        assert_eq!(job.retry_count, 0);
        assert_eq!(job.timeout_ms, DEFAULT_TIMEOUT_MS);
        assert_eq!(job.max_retries, DEFAULT_MAX_RETRIES);
        assert!(!job.is_capability());
    }

    #[test]
    fn test_capability_job() {
        let job = Job::for_capability("j2", "echo", vec![]).with_timeout(Duration::from_secs(2));
        assert_eq!(job.capability.as_deref(), Some("echo"));
        assert_eq!(job.timeout(), Duration::from_secs(2));
    }

    #[test]
    fn test_snapshot_clears_run_state() {
        let mut job = Job::new("j3", "false", vec![]);
        job.status = JobStatus::Failed;
        job.retry_count = 4;
        job.error = Some("exit status 1".to_string());
        job.failure = Some(FailureKind::Execution);
        job.started_at = Some(Utc::now());
        job.finished_at = Some(Utc::now());

        let copy = job.snapshot();
        assert_eq!(copy.status, JobStatus::Pending);
        assert_eq!(copy.retry_count, 0);
        assert!(copy.error.is_none());
        assert!(copy.failure.is_none());
        assert!(copy.started_at.is_none());
        assert_eq!(copy.command, "false");
        assert_eq!(copy.created_at, job.created_at);
    }

    #[test]
    fn test_json_round_trip() {
        let job = Job::new("j4", "ls", vec!["-l".to_string()]).with_work_dir("/tmp");
        let json = serde_json::to_string(&job).unwrap();
        let back: Job = serde_json::from_str(&json).unwrap();
        assert_eq!(back, job);
    }

    #[test]
    fn test_terminal_statuses() {
        assert!(!JobStatus::Pending.is_terminal());
        assert!(!JobStatus::Running.is_terminal());
        assert!(JobStatus::Completed.is_terminal());
        assert!(JobStatus::Failed.is_terminal());
    }
}
