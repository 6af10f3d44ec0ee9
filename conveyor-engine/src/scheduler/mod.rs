//! Scheduler layer
//!
//! A background loop that promotes due pipelines into the pipeline queue.

pub mod ticker;

pub use ticker::PipelineScheduler;
