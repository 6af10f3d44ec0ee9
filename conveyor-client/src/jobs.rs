//! Job-related API endpoints

use conveyor_core::domain::job::Job;
use conveyor_core::dto::job::CreateJob;
use reqwest::Method;

use crate::ConveyorClient;
use crate::error::Result;

impl ConveyorClient {
    /// Submit a new job
    ///
    /// The server blocks the request while its job queue is full.
    ///
    /// # Example
    /// ```no_run
    /// # use conveyor_client::ConveyorClient;
    /// # use conveyor_core::dto::job::CreateJob;
    /// # async fn example() -> anyhow::Result<()> {
    /// let client = ConveyorClient::new("http://localhost:8080");
    /// let job = client.create_job(CreateJob {
    ///     capability: Some("echo".to_string()),
    ///     args: vec!["greeting=hello".to_string()],
    ///     ..CreateJob::default()
    /// }).await?;
    /// # Ok(())
    /// # }
    /// ```
    pub async fn create_job(&self, req: CreateJob) -> Result<Job> {
        let response = self
            .request(Method::POST, &["jobs"])?
            .json(&req)
            .send()
            .await?;

        self.handle_response(response).await
    }

    /// Get a job by ID
    pub async fn get_job(&self, job_id: &str) -> Result<Job> {
        let response = self.request(Method::GET, &["jobs", job_id])?.send().await?;

        self.handle_response(response).await
    }

    /// List all jobs, oldest first
    pub async fn list_jobs(&self) -> Result<Vec<Job>> {
        let response = self.request(Method::GET, &["jobs"])?.send().await?;

        self.handle_response(response).await
    }

    /// Replace the stored record of a job
    pub async fn update_job(&self, job: &Job) -> Result<Job> {
        let response = self
            .request(Method::PUT, &["jobs", job.id.as_str()])?
            .json(job)
            .send()
            .await?;

        self.handle_response(response).await
    }
}
