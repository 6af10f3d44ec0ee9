//! Commands module
//!
//! Defines all CLI commands and their handlers.

mod capability;
mod job;
mod pipeline;
mod stats;

pub use capability::CapabilityCommands;
pub use job::JobCommands;
pub use pipeline::PipelineCommands;

use anyhow::Result;
use clap::Subcommand;

use crate::config::Config;

/// Top-level CLI commands
#[derive(Subcommand)]
pub enum Commands {
    /// Job management
    Job {
        #[command(subcommand)]
        command: JobCommands,
    },
    /// Pipeline management
    Pipeline {
        #[command(subcommand)]
        command: PipelineCommands,
    },
    /// Capability discovery and direct execution
    Capability {
        #[command(subcommand)]
        command: CapabilityCommands,
    },
    /// Job and pipeline counts per status
    Stats,
}

/// Route a command to its handler module
pub async fn handle_command(command: Commands, config: &Config) -> Result<()> {
    let client = config.client();

    match command {
        Commands::Job { command } => job::handle_job_command(command, &client).await,
        Commands::Pipeline { command } => pipeline::handle_pipeline_command(command, &client).await,
        Commands::Capability { command } => {
            capability::handle_capability_command(command, &client).await
        }
        Commands::Stats => stats::show_stats(&client).await,
    }
}

/// Parse a single key=value pair
pub(crate) fn parse_key_val(s: &str) -> Result<(String, String)> {
    let pos = s
        .find('=')
        .ok_or_else(|| anyhow::anyhow!("invalid KEY=value: no `=` found in `{}`", s))?;
    if pos == 0 {
        anyhow::bail!("invalid KEY=value: empty key in `{}`", s);
    }
    Ok((s[..pos].to_string(), s[pos + 1..].to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_key_val() {
        assert_eq!(
            parse_key_val("branch=main").unwrap(),
            ("branch".to_string(), "main".to_string())
        );
        assert_eq!(
            parse_key_val("url=http://x?a=b").unwrap(),
            ("url".to_string(), "http://x?a=b".to_string())
        );
        assert_eq!(parse_key_val("empty=").unwrap().1, "");
        assert!(parse_key_val("novalue").is_err());
        assert!(parse_key_val("=value").is_err());
    }
}
