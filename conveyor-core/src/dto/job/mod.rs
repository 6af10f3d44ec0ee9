//! Job DTOs

use serde::{Deserialize, Serialize};

/// Request to submit a job
///
/// With `id` set the job is added under that ID and the submission fails if
/// it is already taken; otherwise a fresh ID is generated. Absent timeout and
/// retry budget fall back to the engine defaults.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CreateJob {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub command: String,
    #[serde(default)]
    pub args: Vec<String>,
    #[serde(default)]
    pub work_dir: Option<String>,
    #[serde(default)]
    pub timeout_ms: Option<u64>,
    #[serde(default)]
    pub max_retries: Option<u32>,
    #[serde(default)]
    pub capability: Option<String>,
}
