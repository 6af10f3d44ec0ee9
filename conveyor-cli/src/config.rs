//! Configuration module
//!
//! Connection settings shared by every command.

use conveyor_client::ConveyorClient;

/// CLI configuration
#[derive(Debug, Clone)]
pub struct Config {
    /// URL of the Conveyor server
    pub server_url: String,

    pub api_key: Option<String>,
}

impl Config {
    pub fn client(&self) -> ConveyorClient {
        let client = ConveyorClient::new(&self.server_url);
        match &self.api_key {
            Some(key) => client.with_api_key(key),
            None => client,
        }
    }
}
