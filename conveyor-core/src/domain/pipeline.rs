//! Pipeline domain types

use std::collections::HashMap;
use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::job::Job;

/// Ordered, fail-fast sequence of jobs executed as one unit
///
/// `jobs` holds snapshots owned by the pipeline; running a pipeline never
/// touches the records tracked by the job manager.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Pipeline {
    pub id: String,
    pub name: String,
    pub jobs: Vec<Job>,
    pub status: PipelineStatus,
    pub scheduled_at: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub started_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub finished_at: Option<DateTime<Utc>>,
    /// Job ID -> captured result, for jobs that completed in the current run
    #[serde(default)]
    pub context: HashMap<String, String>,
    /// ID of the job that halted the pipeline
    #[serde(default)]
    pub failed_job: Option<String>,
    #[serde(default)]
    pub error: Option<String>,
}

impl Pipeline {
    /// Build a pending pipeline due at `scheduled_at`
    pub fn new(
        id: impl Into<String>,
        name: impl Into<String>,
        jobs: Vec<Job>,
        scheduled_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            jobs,
            status: PipelineStatus::Pending,
            scheduled_at,
            created_at: Utc::now(),
            started_at: None,
            finished_at: None,
            context: HashMap::new(),
            failed_job: None,
            error: None,
        }
    }

    pub fn job_ids(&self) -> Vec<&str> {
        self.jobs.iter().map(|j| j.id.as_str()).collect()
    }

    /// Pending and due at `now`
    pub fn is_due(&self, now: DateTime<Utc>) -> bool {
        self.status == PipelineStatus::Pending && self.scheduled_at <= now
    }

    /// Prepare for another run: clears the context, failure and job run state
    pub fn reset_run_state(&mut self) {
        self.status = PipelineStatus::Pending;
        self.started_at = None;
        self.finished_at = None;
        self.context.clear();
        self.failed_job = None;
        self.error = None;
        for job in &mut self.jobs {
            job.reset_run_state();
        }
    }
}

/// Pipeline execution status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PipelineStatus {
    Pending,
    Running,
    Completed,
    Failed,
}

impl PipelineStatus {
    pub fn is_terminal(self) -> bool {
        matches!(self, PipelineStatus::Completed | PipelineStatus::Failed)
    }
}

impl fmt::Display for PipelineStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PipelineStatus::Pending => write!(f, "Pending"),
            PipelineStatus::Running => write!(f, "Running"),
            PipelineStatus::Completed => write!(f, "Completed"),
            PipelineStatus::Failed => write!(f, "Failed"),
        }
    }
}
