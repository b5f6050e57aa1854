use async_trait::async_trait;
use querivox_core::{JobState, QueryError, QueryJob, RowPage};

/// Seam to the remote query-execution service. One job is created per
/// process invocation; handles are never pooled or reused.
#[async_trait]
pub trait QueryService: Send + Sync {
    /// Submit a job for asynchronous execution.
    async fn submit(&self, job: &QueryJob) -> Result<(), QueryError>;

    /// Fetch the current server-side state of a submitted job.
    async fn job_state(&self, job_id: &str) -> Result<JobState, QueryError>;

    /// Read one page of the destination result set of a completed job.
    async fn fetch_rows(
        &self,
        job_id: &str,
        page_token: Option<&str>,
    ) -> Result<RowPage, QueryError>;
}
