//! Engine statistics

use serde::{Deserialize, Serialize};

use crate::domain::job::JobStatus;
use crate::domain::pipeline::PipelineStatus;

/// Entity counts per status
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusCounts {
    pub pending: usize,
    pub running: usize,
    pub completed: usize,
    pub failed: usize,
}

impl StatusCounts {
    pub fn total(&self) -> usize {
        self.pending + self.running + self.completed + self.failed
    }

    pub fn record_job(&mut self, status: JobStatus) {
        match status {
            JobStatus::Pending => self.pending += 1,
            JobStatus::Running => self.running += 1,
            JobStatus::Completed => self.completed += 1,
            JobStatus::Failed => self.failed += 1,
        }
    }

    pub fn record_pipeline(&mut self, status: PipelineStatus) {
        match status {
            PipelineStatus::Pending => self.pending += 1,
            PipelineStatus::Running => self.running += 1,
            PipelineStatus::Completed => self.completed += 1,
            PipelineStatus::Failed => self.failed += 1,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EngineStats {
    pub jobs: StatusCounts,
    pub pipelines: StatusCounts,
}
