//! ID resolver module
//!
//! Lets users type a short, unambiguous prefix instead of a full job or
//! pipeline ID. The input is first tried as a full ID; only when the server
//! answers 404 is it matched as a prefix. An exact match always wins over
//! prefix matches.

use anyhow::{Context, Result, anyhow};
use conveyor_client::ConveyorClient;

/// Resolve a pipeline ID or prefix to a full ID
///
/// # Errors
/// Returns an error if:
/// - No pipeline matches the prefix
/// - Multiple pipelines match the prefix (ambiguous)
/// - API call fails
pub async fn resolve_pipeline_id(client: &ConveyorClient, id_or_prefix: &str) -> Result<String> {
    match client.get_pipeline(id_or_prefix).await {
        Ok(pipeline) => return Ok(pipeline.id),
        Err(e) if e.is_not_found() => {}
        Err(e) => return Err(e).context("Failed to look up pipeline"),
    }

    let pipelines = client
        .list_pipelines()
        .await
        .context("Failed to fetch pipelines for ID resolution")?;

    resolve("pipeline", id_or_prefix, pipelines.iter().map(|p| p.id.as_str()))
}

/// Resolve a job ID or prefix to a full ID
///
/// # Errors
/// Same as [`resolve_pipeline_id`], for jobs
pub async fn resolve_job_id(client: &ConveyorClient, id_or_prefix: &str) -> Result<String> {
    match client.get_job(id_or_prefix).await {
        Ok(job) => return Ok(job.id),
        Err(e) if e.is_not_found() => {}
        Err(e) => return Err(e).context("Failed to look up job"),
    }

    let jobs = client
        .list_jobs()
        .await
        .context("Failed to fetch jobs for ID resolution")?;

    resolve("job", id_or_prefix, jobs.iter().map(|j| j.id.as_str()))
}

fn resolve<'a>(kind: &str, input: &str, ids: impl Iterator<Item = &'a str>) -> Result<String> {
    let prefix = input.to_lowercase();
    let mut matches = Vec::new();

    for id in ids {
        if id == input {
            return Ok(id.to_string());
        }
        if id.to_lowercase().starts_with(&prefix) {
            matches.push(id);
        }
    }

    match matches.as_slice() {
        [] => Err(anyhow!("No {} found with ID starting with '{}'", kind, input)),
        [id] => Ok(id.to_string()),
        _ => Err(anyhow!(
            "Ambiguous prefix '{}' matches multiple {}s: {}",
            input,
            kind,
            matches.join(", ")
        )),
    }
}
