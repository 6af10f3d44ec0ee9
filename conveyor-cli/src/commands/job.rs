//! Job command handlers
//!
//! Handles job submission, listing, inspection and manual status changes.

use anyhow::{Result, bail};
use clap::Subcommand;
use colored::*;
use conveyor_client::ConveyorClient;
use conveyor_core::domain::job::{Job, JobStatus};
use conveyor_core::dto::job::CreateJob;

use crate::id_resolver::resolve_job_id;
use crate::output::{colorize_job_status, elapsed, timestamp};

/// Job subcommands
#[derive(Subcommand)]
pub enum JobCommands {
    /// Submit a job: a command line, or arguments for a capability
    Create {
        /// Job ID (generated when omitted)
        #[arg(long)]
        id: Option<String>,

        /// Invoke this capability instead of spawning a command
        #[arg(short, long)]
        capability: Option<String>,

        /// Working directory of the command
        #[arg(short, long)]
        work_dir: Option<String>,

        /// Per-attempt timeout in seconds
        #[arg(short, long)]
        timeout: Option<u64>,

        /// Retries after the first failed attempt
        #[arg(short, long)]
        max_retries: Option<u32>,

        /// Command and its arguments, or key=value capability arguments
        #[arg(trailing_var_arg = true, allow_hyphen_values = true)]
        command_line: Vec<String>,
    },
    /// List all jobs
    List,
    /// Get job details
    Get {
        /// Job ID or unambiguous prefix
        id: String,
    },
    /// Overwrite the recorded status of a job
    UpdateStatus {
        /// Job ID or unambiguous prefix
        id: String,

        /// pending, running, completed or failed
        #[arg(value_parser = parse_job_status)]
        status: JobStatus,
    },
}

/// Handle job commands
pub async fn handle_job_command(command: JobCommands, client: &ConveyorClient) -> Result<()> {
    match command {
        JobCommands::Create {
            id,
            capability,
            work_dir,
            timeout,
            max_retries,
            command_line,
        } => {
            let req = build_request(id, capability, work_dir, timeout, max_retries, command_line)?;
            create_job(client, req).await
        }
        JobCommands::List => list_jobs(client).await,
        JobCommands::Get { id } => get_job(client, &id).await,
        JobCommands::UpdateStatus { id, status } => update_status(client, &id, status).await,
    }
}

fn build_request(
    id: Option<String>,
    capability: Option<String>,
    work_dir: Option<String>,
    timeout: Option<u64>,
    max_retries: Option<u32>,
    mut command_line: Vec<String>,
) -> Result<CreateJob> {
    let command = match &capability {
        Some(_) => String::new(),
        None if command_line.is_empty() => {
            bail!("A command is required unless --capability is given")
        }
        None => command_line.remove(0),
    };

    Ok(CreateJob {
        id,
        command,
        args: command_line,
        work_dir,
        timeout_ms: timeout.map(|secs| secs.saturating_mul(1000)),
        max_retries,
        capability,
    })
}

fn parse_job_status(s: &str) -> Result<JobStatus> {
    match s.to_lowercase().as_str() {
        "pending" => Ok(JobStatus::Pending),
        "running" => Ok(JobStatus::Running),
        "completed" => Ok(JobStatus::Completed),
        "failed" => Ok(JobStatus::Failed),
        other => bail!("unknown job status `{}`", other),
    }
}

async fn create_job(client: &ConveyorClient, req: CreateJob) -> Result<()> {
    let job = client.create_job(req).await?;

    println!("{}", "✓ Job submitted!".green().bold());
    println!("  ID:      {}", job.id.cyan());
    println!("  Target:  {}", describe_target(&job));
    println!("  Timeout: {}s, retries: {}", job.timeout_ms / 1000, job.max_retries);

    Ok(())
}

async fn list_jobs(client: &ConveyorClient) -> Result<()> {
    let jobs = client.list_jobs().await?;

    if jobs.is_empty() {
        println!("{}", "No jobs found.".yellow());
    } else {
        println!("{}", format!("Found {} job(s):", jobs.len()).bold());
        println!();
        for job in jobs {
            print_job_summary(&job);
        }
    }

    Ok(())
}

async fn get_job(client: &ConveyorClient, id: &str) -> Result<()> {
    let id = resolve_job_id(client, id).await?;
    let job = client.get_job(&id).await?;

    print_job_details(&job);

    Ok(())
}

async fn update_status(client: &ConveyorClient, id: &str, status: JobStatus) -> Result<()> {
    let id = resolve_job_id(client, id).await?;
    let mut job = client.get_job(&id).await?;
    let previous = job.status;
    job.status = status;

    let job = client.update_job(&job).await?;
    println!(
        "{} Job {} status: {} → {}",
        "✓".green(),
        job.id.cyan(),
        colorize_job_status(previous),
        colorize_job_status(job.status)
    );

    Ok(())
}

fn describe_target(job: &Job) -> String {
    match &job.capability {
        Some(name) => format!("capability {} {}", name, job.args.join(" ")),
        None => format!("{} {}", job.command, job.args.join(" ")),
    }
    .trim_end()
    .to_string()
}

/// Print a one-entry summary of a job
fn print_job_summary(job: &Job) {
    println!("  {} Job {}", "▸".cyan(), job.id.dimmed());
    println!("    Target:  {}", describe_target(job));
    println!("    Status:  {}", colorize_job_status(job.status));
    println!("    Created: {}", timestamp(job.created_at).dimmed());
    if job.retry_count > 0 {
        println!("    Failed attempts: {}", job.retry_count);
    }
    println!();
}

/// Print detailed job information
fn print_job_details(job: &Job) {
    println!("{}", "Job Details:".bold());
    println!("  ID:          {}", job.id.cyan());
    println!("  Target:      {}", describe_target(job));
    if let Some(dir) = &job.work_dir {
        println!("  Work dir:    {}", dir);
    }
    println!("  Status:      {}", colorize_job_status(job.status));
    println!(
        "  Attempts:    {} failed of {} allowed",
        job.retry_count,
        job.max_retries.saturating_add(1)
    );
    println!("  Timeout:     {}s", job.timeout_ms / 1000);
    println!("  Created:     {}", timestamp(job.created_at));

    if let Some(started) = job.started_at {
        println!("  Started:     {}", timestamp(started));
    }
    if let Some(finished) = job.finished_at {
        println!("  Finished:    {}", timestamp(finished));
    }
    if let Some(duration) = elapsed(job.started_at, job.finished_at) {
        println!("  Duration:    {}", duration);
    }

    if let Some(result) = &job.result {
        println!("\n{}", "Output:".bold());
        println!("{}", result.trim_end());
    }

    if let Some(error) = &job.error {
        let kind = job
            .failure
            .map(|k| format!(" ({})", k))
            .unwrap_or_default();
        println!("\n{}", format!("Error{}:", kind).bold());
        println!("{}", error.red());
    }
}
