//! Conveyor Engine
//!
//! Job and pipeline execution engine.
//!
//! - [`service::JobManager`]: job registry, bounded queue, worker pool with
//!   retry/backoff and per-attempt timeouts
//! - [`service::PipelineManager`]: sequential fail-fast pipelines, its own
//!   worker pool and the scheduler promoting due pipelines
//! - [`execution::Executor`]: the attempt/retry protocol shared by both
//! - [`capability`]: named capabilities jobs can invoke instead of a command
//! - [`store`]: the persistence boundary
//!
//! [`Engine`] wires all of it together.

pub mod backoff;
pub mod capability;
pub mod config;
pub mod engine;
pub mod error;
pub mod execution;
pub mod repository;
pub mod scheduler;
pub mod service;
pub mod store;

pub use config::EngineConfig;
pub use engine::Engine;
pub use error::{EngineError, EngineResult, EntityKind};
