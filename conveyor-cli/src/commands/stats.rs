//! Stats command handler

use anyhow::Result;
use colored::*;
use conveyor_client::ConveyorClient;
use conveyor_core::dto::stats::StatusCounts;

pub async fn show_stats(client: &ConveyorClient) -> Result<()> {
    let stats = client.stats().await?;

    print_counts("Jobs", &stats.jobs);
    println!();
    print_counts("Pipelines", &stats.pipelines);

    Ok(())
}

fn print_counts(title: &str, counts: &StatusCounts) {
    println!("{}", format!("{} ({} total)", title, counts.total()).bold());
    println!("  {:<10} {}", "Pending".blue(), counts.pending);
    println!("  {:<10} {}", "Running".yellow(), counts.running);
    println!("  {:<10} {}", "Completed".green(), counts.completed);
    println!("  {:<10} {}", "Failed".red(), counts.failed);
}
