//! Input validation shared by the managers

use conveyor_core::domain::job::Job;

use crate::error::{EngineError, EngineResult};

const MAX_ID_LEN: usize = 128;
const MAX_NAME_LEN: usize = 255;
pub(crate) const MAX_RETRIES: u32 = 100;

/// IDs double as store keys, so they are restricted to a file-name-safe alphabet
pub(crate) fn validate_id(id: &str) -> EngineResult<()> {
    if id.trim().is_empty() {
        return Err(EngineError::Validation("ID cannot be empty".to_string()));
    }

    if id.len() > MAX_ID_LEN {
        return Err(EngineError::Validation(format!(
            "ID cannot exceed {} characters",
            MAX_ID_LEN
        )));
    }

    if id.starts_with('.')
        || !id
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.'))
    {
        return Err(EngineError::Validation(format!(
            "ID '{}' may only contain letters, digits, '-', '_' and '.'",
            id
        )));
    }

    Ok(())
}

pub(crate) fn validate_name(name: &str) -> EngineResult<()> {
    if name.trim().is_empty() {
        return Err(EngineError::Validation("Name cannot be empty".to_string()));
    }

    if name.len() > MAX_NAME_LEN {
        return Err(EngineError::Validation(format!(
            "Name cannot exceed {} characters",
            MAX_NAME_LEN
        )));
    }

    Ok(())
}

/// Checks the job definition; run state is not looked at
pub(crate) fn validate_job(job: &Job) -> EngineResult<()> {
    validate_id(&job.id)?;

    match &job.capability {
        Some(name) if name.trim().is_empty() => {
            return Err(EngineError::Validation(
                "Capability name cannot be empty".to_string(),
            ));
        }
        Some(_) => {}
        None if job.command.trim().is_empty() => {
            return Err(EngineError::Validation(
                "Job needs a command or a capability".to_string(),
            ));
        }
        None => {}
    }

    if job.timeout_ms == 0 {
        return Err(EngineError::Validation(
            "Timeout must be greater than 0".to_string(),
        ));
    }

    if job.max_retries > MAX_RETRIES {
        return Err(EngineError::Validation(format!(
            "max_retries cannot exceed {}",
            MAX_RETRIES
        )));
    }

    Ok(())
}
