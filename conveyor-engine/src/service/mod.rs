//! Service layer
//!
//! The job and pipeline managers. Each owns its registry, queue and worker
//! pool; both run jobs through the shared [`crate::execution::Executor`].

pub mod job;
pub mod pipeline;
mod validation;

pub use job::JobManager;
pub use pipeline::PipelineManager;

/// Short random identifier for entities created without a caller-supplied ID
pub(crate) fn generate_id() -> String {
    let mut id = uuid::Uuid::new_v4().simple().to_string();
    id.truncate(8);
    id
}
