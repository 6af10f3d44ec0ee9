//! Conveyor CLI
//!
//! Command-line interface for a running Conveyor server.

mod commands;
mod config;
mod id_resolver;
mod output;

use std::process::ExitCode;

use clap::Parser;
use colored::*;
use commands::{Commands, handle_command};
use config::Config;
use conveyor_client::ClientError;

#[derive(Parser)]
#[command(name = "conveyor")]
#[command(about = "Conveyor job and pipeline CLI", long_about = None)]
struct Cli {
    /// Server URL
    #[arg(long, env = "CONVEYOR_SERVER_URL", default_value = "http://localhost:8080")]
    server_url: String,

    /// API key sent as X-API-Key
    #[arg(long, env = "CONVEYOR_API_KEY", hide_env_values = true)]
    api_key: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    let config = Config {
        server_url: cli.server_url,
        api_key: cli.api_key,
    };

    match handle_command(cli.command, &config).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("{} {:#}", "Error:".red().bold(), e);
            let client_error = e.chain().find_map(|c| c.downcast_ref::<ClientError>());
            if let Some(hint) = client_error.and_then(|err| hint(err, &config.server_url)) {
                eprintln!("  {}", hint.yellow());
            }
            ExitCode::FAILURE
        }
    }
}

/// What the user can do about a failed request, by error class
fn hint(err: &ClientError, server_url: &str) -> Option<String> {
    if err.is_unreachable() {
        Some(format!("Is the server running at {}?", server_url))
    } else if err.is_unauthorized() {
        Some("Pass a valid key with --api-key or CONVEYOR_API_KEY".to_string())
    } else if err.is_unavailable() {
        Some("The server is shutting down; retry once it is back".to_string())
    } else if err.is_not_found() {
        Some("List what exists with `conveyor job list` or `conveyor pipeline list`".to_string())
    } else {
        None
    }
}
