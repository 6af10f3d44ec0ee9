//! Engine error types

use std::fmt;

use thiserror::Error;

use crate::store::StoreError;

/// Kind of entity a lookup was made for
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntityKind {
    Job,
    Pipeline,
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EntityKind::Job => write!(f, "job"),
            EntityKind::Pipeline => write!(f, "pipeline"),
        }
    }
}

/// Errors returned by job and pipeline manager operations
#[derive(Debug, Error)]
pub enum EngineError {
    /// Rejected input; nothing was mutated
    #[error("validation error: {0}")]
    Validation(String),

    #[error("{kind} not found: {id}")]
    NotFound { kind: EntityKind, id: String },

    /// The store failed on the submission path; the entity was not accepted
    #[error("persistence error: {0}")]
    Persistence(#[from] StoreError),

    #[error("engine is shutting down")]
    ShuttingDown,
}

impl EngineError {
    pub fn job_not_found(id: impl Into<String>) -> Self {
        EngineError::NotFound {
            kind: EntityKind::Job,
            id: id.into(),
        }
    }

    pub fn pipeline_not_found(id: impl Into<String>) -> Self {
        EngineError::NotFound {
            kind: EntityKind::Pipeline,
            id: id.into(),
        }
    }
}

pub type EngineResult<T> = Result<T, EngineError>;
