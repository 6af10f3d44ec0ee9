//! Pipeline-related API endpoints

use std::collections::HashMap;

use conveyor_core::domain::pipeline::Pipeline;
use conveyor_core::dto::pipeline::{CreatePipeline, UpdatePipeline};
use reqwest::Method;

use crate::ConveyorClient;
use crate::error::Result;

impl ConveyorClient {
    /// Create a pipeline from already submitted jobs
    pub async fn create_pipeline(&self, req: CreatePipeline) -> Result<Pipeline> {
        let response = self
            .request(Method::POST, &["pipelines"])?
            .json(&req)
            .send()
            .await?;

        self.handle_response(response).await
    }

    pub async fn get_pipeline(&self, pipeline_id: &str) -> Result<Pipeline> {
        let response = self
            .request(Method::GET, &["pipelines", pipeline_id])?
            .send()
            .await?;

        self.handle_response(response).await
    }

    pub async fn list_pipelines(&self) -> Result<Vec<Pipeline>> {
        let response = self.request(Method::GET, &["pipelines"])?.send().await?;

        self.handle_response(response).await
    }

    /// Rename a pipeline and/or replace its job list
    pub async fn update_pipeline(&self, pipeline_id: &str, req: UpdatePipeline) -> Result<Pipeline> {
        let response = self
            .request(Method::PUT, &["pipelines", pipeline_id])?
            .json(&req)
            .send()
            .await?;

        self.handle_response(response).await
    }

    /// Delete a pipeline that is not currently running
    pub async fn delete_pipeline(&self, pipeline_id: &str) -> Result<()> {
        let response = self
            .request(Method::DELETE, &["pipelines", pipeline_id])?
            .send()
            .await?;

        self.handle_empty_response(response).await
    }

    /// Queue a pipeline immediately
    pub async fn run_pipeline(&self, pipeline_id: &str) -> Result<Pipeline> {
        let response = self
            .request(Method::POST, &["pipelines", pipeline_id, "run"])?
            .send()
            .await?;

        self.handle_response(response).await
    }

    /// Results of the jobs completed in the pipeline's current run, keyed by job ID
    pub async fn pipeline_context(&self, pipeline_id: &str) -> Result<HashMap<String, String>> {
        let response = self
            .request(Method::GET, &["pipelines", pipeline_id, "context"])?
            .send()
            .await?;

        self.handle_response(response).await
    }
}
