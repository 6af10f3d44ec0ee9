//! Capability command handlers

use std::collections::HashMap;

use anyhow::Result;
use clap::Subcommand;
use colored::*;
use conveyor_client::ConveyorClient;

use super::parse_key_val;

/// Capability subcommands
#[derive(Subcommand)]
pub enum CapabilityCommands {
    /// List the capabilities registered on the server
    List,
    /// Invoke a capability directly, without creating a job
    Exec {
        /// Capability name
        name: String,

        /// Arguments as key=value pairs; values are parsed as JSON when possible
        #[arg(short, long = "arg", value_parser = parse_key_val)]
        args: Vec<(String, String)>,
    },
}

pub async fn handle_capability_command(
    command: CapabilityCommands,
    client: &ConveyorClient,
) -> Result<()> {
    match command {
        CapabilityCommands::List => list_capabilities(client).await,
        CapabilityCommands::Exec { name, args } => execute(client, &name, args).await,
    }
}

async fn list_capabilities(client: &ConveyorClient) -> Result<()> {
    let capabilities = client.list_capabilities().await?;

    if capabilities.is_empty() {
        println!("{}", "No capabilities registered.".yellow());
        return Ok(());
    }

    println!("{}", format!("{} capability(ies):", capabilities.len()).bold());
    for capability in capabilities {
        println!(
            "  {} {} {}",
            "▸".cyan(),
            capability.name.bold(),
            capability.version.dimmed()
        );
    }

    Ok(())
}

async fn execute(client: &ConveyorClient, name: &str, args: Vec<(String, String)>) -> Result<()> {
    let output = client.execute_capability(name, json_args(args)).await?;

    println!("{} {}", "✓".green(), output.name.cyan());
    println!("{}", serde_json::to_string_pretty(&output.result)?);

    Ok(())
}

/// `n=3` becomes a number, `name=world` stays a string
fn json_args(args: Vec<(String, String)>) -> HashMap<String, serde_json::Value> {
    args.into_iter()
        .map(|(key, raw)| {
            let value = serde_json::from_str(&raw).unwrap_or(serde_json::Value::String(raw));
            (key, value)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_json_args() {
        let args = json_args(vec![
            ("n".to_string(), "3".to_string()),
            ("flag".to_string(), "true".to_string()),
            ("name".to_string(), "world".to_string()),
            ("list".to_string(), "[1,2]".to_string()),
        ]);
        assert_eq!(args["n"], json!(3));
        assert_eq!(args["flag"], json!(true));
        assert_eq!(args["name"], json!("world"));
        assert_eq!(args["list"], json!([1, 2]));
    }
}
