//! Pipeline command handlers
//!
//! Handles pipeline creation from submitted jobs, listing, inspection,
//! editing, immediate runs, result contexts and deletion.

use anyhow::Result;
use chrono::{DateTime, Utc};
use clap::Subcommand;
use colored::*;
use conveyor_client::ConveyorClient;
use conveyor_core::domain::pipeline::Pipeline;
use conveyor_core::dto::pipeline::{CreatePipeline, UpdatePipeline};

use crate::id_resolver::{resolve_job_id, resolve_pipeline_id};
use crate::output::{colorize_job_status, colorize_pipeline_status, elapsed, timestamp};

/// Pipeline subcommands
#[derive(Subcommand)]
pub enum PipelineCommands {
    /// Create a pipeline from already submitted jobs
    Create {
        /// Pipeline name
        name: String,

        /// Job IDs or prefixes, in execution order (comma-separated or repeated)
        #[arg(short, long = "job", value_delimiter = ',', required = true)]
        jobs: Vec<String>,

        /// Pipeline ID (generated when omitted)
        #[arg(long)]
        id: Option<String>,

        /// When the pipeline becomes due, RFC 3339 (defaults to now)
        #[arg(long)]
        at: Option<DateTime<Utc>>,
    },
    /// List all pipelines
    List,
    /// Get pipeline details
    Get {
        /// Pipeline ID or unambiguous prefix
        id: String,
    },
    /// Rename a pipeline or replace its jobs
    Update {
        /// Pipeline ID or unambiguous prefix
        id: String,

        #[arg(short, long)]
        name: Option<String>,

        /// New job list, in execution order
        #[arg(short, long = "job", value_delimiter = ',')]
        jobs: Vec<String>,
    },
    /// Queue a pipeline now instead of waiting for its schedule
    Run {
        /// Pipeline ID or unambiguous prefix
        id: String,
    },
    /// Show the results collected by the current run
    Context {
        /// Pipeline ID or unambiguous prefix
        id: String,
    },
    /// Delete a pipeline; its jobs are kept
    Delete {
        /// Pipeline ID or unambiguous prefix
        id: String,
    },
}

/// Handle pipeline commands
pub async fn handle_pipeline_command(
    command: PipelineCommands,
    client: &ConveyorClient,
) -> Result<()> {
    match command {
        PipelineCommands::Create { name, jobs, id, at } => {
            create_pipeline(client, name, jobs, id, at).await
        }
        PipelineCommands::List => list_pipelines(client).await,
        PipelineCommands::Get { id } => get_pipeline(client, &id).await,
        PipelineCommands::Update { id, name, jobs } => {
            update_pipeline(client, &id, name, jobs).await
        }
        PipelineCommands::Run { id } => run_pipeline(client, &id).await,
        PipelineCommands::Context { id } => show_context(client, &id).await,
        PipelineCommands::Delete { id } => delete_pipeline(client, &id).await,
    }
}

async fn resolve_jobs(client: &ConveyorClient, jobs: &[String]) -> Result<Vec<String>> {
    let mut job_ids = Vec::with_capacity(jobs.len());
    for job in jobs {
        job_ids.push(resolve_job_id(client, job).await?);
    }
    Ok(job_ids)
}

async fn create_pipeline(
    client: &ConveyorClient,
    name: String,
    jobs: Vec<String>,
    id: Option<String>,
    scheduled_at: Option<DateTime<Utc>>,
) -> Result<()> {
    let job_ids = resolve_jobs(client, &jobs).await?;

    let pipeline = client
        .create_pipeline(CreatePipeline {
            id,
            name,
            job_ids,
            scheduled_at,
        })
        .await?;

    println!("{}", "✓ Pipeline created successfully!".green().bold());
    println!("  ID:        {}", pipeline.id.cyan());
    println!("  Name:      {}", pipeline.name.bold());
    println!("  Jobs:      {}", pipeline.job_ids().join(" → ").dimmed());
    println!("  Scheduled: {}", timestamp(pipeline.scheduled_at));

    Ok(())
}

async fn list_pipelines(client: &ConveyorClient) -> Result<()> {
    let pipelines = client.list_pipelines().await?;

    if pipelines.is_empty() {
        println!("{}", "No pipelines found.".yellow());
        return Ok(());
    }

    println!("{}", format!("Found {} pipeline(s):", pipelines.len()).bold());
    println!();
    for pipeline in pipelines {
        println!(
            "  {} {} {}",
            "▸".cyan(),
            pipeline.name.bold(),
            format!("({})", pipeline.id).dimmed()
        );
        println!("    Status:    {}", colorize_pipeline_status(pipeline.status));
        println!("    Jobs:      {}", pipeline.jobs.len());
        println!("    Scheduled: {}", timestamp(pipeline.scheduled_at).dimmed());
        println!();
    }

    Ok(())
}

async fn get_pipeline(client: &ConveyorClient, id: &str) -> Result<()> {
    let id = resolve_pipeline_id(client, id).await?;
    let pipeline = client.get_pipeline(&id).await?;

    print_pipeline_details(&pipeline);

    Ok(())
}

async fn update_pipeline(
    client: &ConveyorClient,
    id: &str,
    name: Option<String>,
    jobs: Vec<String>,
) -> Result<()> {
    if name.is_none() && jobs.is_empty() {
        anyhow::bail!("Nothing to update: pass --name and/or --job");
    }

    let id = resolve_pipeline_id(client, id).await?;
    let job_ids = if jobs.is_empty() {
        None
    } else {
        Some(resolve_jobs(client, &jobs).await?)
    };

    let pipeline = client
        .update_pipeline(&id, UpdatePipeline { name, job_ids })
        .await?;

    println!("{} Pipeline {} updated", "✓".green(), pipeline.id.cyan());
    print_pipeline_details(&pipeline);

    Ok(())
}

async fn run_pipeline(client: &ConveyorClient, id: &str) -> Result<()> {
    let id = resolve_pipeline_id(client, id).await?;
    let pipeline = client.run_pipeline(&id).await?;

    println!(
        "{} Pipeline {} queued ({} jobs)",
        "✓".green(),
        pipeline.id.cyan(),
        pipeline.jobs.len()
    );

    Ok(())
}

async fn delete_pipeline(client: &ConveyorClient, id: &str) -> Result<()> {
    let id = resolve_pipeline_id(client, id).await?;
    client.delete_pipeline(&id).await?;

    println!("{} Pipeline {} deleted", "✓".green(), id.cyan());

    Ok(())
}

async fn show_context(client: &ConveyorClient, id: &str) -> Result<()> {
    let id = resolve_pipeline_id(client, id).await?;
    let context = client.pipeline_context(&id).await?;

    if context.is_empty() {
        println!("{}", "No results collected yet.".yellow());
        return Ok(());
    }

    let mut entries: Vec<_> = context.into_iter().collect();
    entries.sort();
    for (job_id, result) in entries {
        println!("{}", job_id.cyan().bold());
        println!("{}", result.trim_end());
        println!();
    }

    Ok(())
}

fn print_pipeline_details(pipeline: &Pipeline) {
    println!("{}", "Pipeline Details:".bold());
    println!("  ID:        {}", pipeline.id.cyan());
    println!("  Name:      {}", pipeline.name);
    println!("  Status:    {}", colorize_pipeline_status(pipeline.status));
    println!("  Scheduled: {}", timestamp(pipeline.scheduled_at));
    if let Some(started) = pipeline.started_at {
        println!("  Started:   {}", timestamp(started));
    }
    if let Some(duration) = elapsed(pipeline.started_at, pipeline.finished_at) {
        println!("  Duration:  {}", duration);
    }

    println!("\n{}", "Jobs:".bold());
    for (index, job) in pipeline.jobs.iter().enumerate() {
        let duration = elapsed(job.started_at, job.finished_at)
            .map(|d| format!(" in {}", d))
            .unwrap_or_default();
        println!(
            "  {}. {} {}{}",
            index + 1,
            job.id,
            colorize_job_status(job.status),
            duration.dimmed()
        );
    }

    if let (Some(job), Some(error)) = (&pipeline.failed_job, &pipeline.error) {
        println!("\n{}", format!("Failed at {}:", job).bold());
        println!("{}", error.red());
    }
}
