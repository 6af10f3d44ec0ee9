//! Capability-related API endpoints

use std::collections::HashMap;

use conveyor_core::domain::capability::CapabilityInfo;
use conveyor_core::dto::capability::{CapabilityOutput, ExecuteCapability};
use reqwest::Method;

use crate::ConveyorClient;
use crate::error::Result;

impl ConveyorClient {
    pub async fn list_capabilities(&self) -> Result<Vec<CapabilityInfo>> {
        let response = self.request(Method::GET, &["capabilities"])?.send().await?;

        self.handle_response(response).await
    }

    /// Invoke a capability directly on the server
    pub async fn execute_capability(
        &self,
        name: &str,
        args: HashMap<String, serde_json::Value>,
    ) -> Result<CapabilityOutput> {
        let response = self
            .request(Method::POST, &["capabilities", name, "execute"])?
            .json(&ExecuteCapability { args })
            .send()
            .await?;

        self.handle_response(response).await
    }
}
