//! Stats endpoint

use conveyor_core::dto::stats::EngineStats;
use reqwest::Method;

use crate::ConveyorClient;
use crate::error::Result;

impl ConveyorClient {
    /// Job and pipeline counts per status
    pub async fn stats(&self) -> Result<EngineStats> {
        let response = self.request(Method::GET, &["stats"])?.send().await?;

        self.handle_response(response).await
    }
}
