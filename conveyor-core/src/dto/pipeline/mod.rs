//! Pipeline DTOs

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Request to create a pipeline from already-submitted jobs
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CreatePipeline {
    #[serde(default)]
    pub id: Option<String>,
    pub name: String,
    pub job_ids: Vec<String>,
    /// Defaults to now, so the next scheduler tick picks it up
    #[serde(default)]
    pub scheduled_at: Option<DateTime<Utc>>,
}

/// Partial update of a pipeline; absent fields are left unchanged
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UpdatePipeline {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub job_ids: Option<Vec<String>>,
}
