use crate::service::QueryService;
use querivox_core::{JobState, QueryError, QueryJob, SqlDialect};
use std::io::Write;
use std::time::Duration;

/// Drives one query from submission to printed rows: generates a fresh job
/// id, submits, polls until the job is terminal, then streams result pages
/// to the writer as they arrive.
pub struct QueryRunner<S> {
    service: S,
    poll_interval: Duration,
}

impl<S: QueryService> QueryRunner<S> {
    pub fn new(service: S, poll_interval: Duration) -> Self {
        Self {
            service,
            poll_interval,
        }
    }

    pub async fn run<W: Write>(
        &self,
        sql: &str,
        dialect: SqlDialect,
        out: &mut W,
    ) -> Result<(), QueryError> {
        if sql.trim().is_empty() {
            return Err(QueryError::EmptyQuery);
        }

        let job = QueryJob::new(sql, dialect);
        tracing::info!(job_id = %job.job_id, ?dialect, "submitting query job");
        self.service.submit(&job).await?;

        self.wait_for_completion(&job.job_id).await?;

        let mut page_token: Option<String> = None;
        loop {
            let page = self
                .service
                .fetch_rows(&job.job_id, page_token.as_deref())
                .await?;
            for row in &page.rows {
                writeln!(out, "{row}")?;
            }
            match page.next_page_token {
                Some(token) => page_token = Some(token),
                None => break,
            }
        }
        Ok(())
    }

    async fn wait_for_completion(&self, job_id: &str) -> Result<(), QueryError> {
        loop {
            match self.service.job_state(job_id).await? {
                JobState::Done { error: Some(message) } => {
                    return Err(QueryError::JobFailed {
                        job_id: job_id.to_string(),
                        message,
                    });
                }
                JobState::Done { error: None } => return Ok(()),
                state => {
                    tracing::debug!(job_id, ?state, "job not terminal yet");
                    tokio::time::sleep(self.poll_interval).await;
                }
            }
        }
    }
}
