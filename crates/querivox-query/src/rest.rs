use crate::service::QueryService;
use async_trait::async_trait;
use querivox_core::{JobState, QueryConfig, QueryError, QueryJob, Row, RowPage, Value};
use serde::{Deserialize, Serialize};

pub const ACCESS_TOKEN_VAR: &str = "QUERIVOX_ACCESS_TOKEN";
pub const PROJECT_VAR: &str = "QUERIVOX_PROJECT";

/// REST client for the managed query service (BigQuery v2 jobs API).
/// Credentials are ambient: a bearer token taken from the environment.
pub struct BigQueryClient {
    http: reqwest::Client,
    endpoint: String,
    project: String,
    token: String,
    page_size: u32,
}

impl BigQueryClient {
    pub fn from_config(config: &QueryConfig) -> Result<Self, QueryError> {
        let project = config
            .project
            .clone()
            .or_else(|| std::env::var(PROJECT_VAR).ok())
            .ok_or_else(|| QueryError::MissingProject(PROJECT_VAR.to_string()))?;
        let token = std::env::var(ACCESS_TOKEN_VAR)
            .map_err(|_| QueryError::MissingCredentials(ACCESS_TOKEN_VAR.to_string()))?;

        Ok(Self {
            http: reqwest::Client::new(),
            endpoint: config.endpoint.trim_end_matches('/').to_string(),
            project,
            token,
            page_size: config.page_size,
        })
    }
}

#[async_trait]
impl QueryService for BigQueryClient {
    async fn submit(&self, job: &QueryJob) -> Result<(), QueryError> {
        let url = format!("{}/projects/{}/jobs", self.endpoint, self.project);
        let body = InsertJobRequest::new(&self.project, job);

        let response = self
            .http
            .post(&url)
            .bearer_auth(&self.token)
            .json(&body)
            .send()
            .await
            .map_err(|e| QueryError::Submit(e.to_string()))?;
        check_status(response, QueryError::Submit).await?;
        Ok(())
    }

    async fn job_state(&self, job_id: &str) -> Result<JobState, QueryError> {
        let url = format!(
            "{}/projects/{}/jobs/{}",
            self.endpoint, self.project, job_id,
        );
        let response = self
            .http
            .get(&url)
            .bearer_auth(&self.token)
            .send()
            .await
            .map_err(|e| QueryError::Poll(e.to_string()))?;
        let response = check_status(response, QueryError::Poll).await?;
        let job: GetJobResponse = response
            .json()
            .await
            .map_err(|e| QueryError::Poll(e.to_string()))?;
        Ok(job.status.into_state())
    }

    async fn fetch_rows(
        &self,
        job_id: &str,
        page_token: Option<&str>,
    ) -> Result<RowPage, QueryError> {
        let url = format!(
            "{}/projects/{}/queries/{}",
            self.endpoint, self.project, job_id,
        );
        let mut request = self
            .http
            .get(&url)
            .bearer_auth(&self.token)
            .query(&[("maxResults", self.page_size.to_string())]);
        if let Some(token) = page_token {
            request = request.query(&[("pageToken", token)]);
        }

        let response = request
            .send()
            .await
            .map_err(|e| QueryError::FetchResults(e.to_string()))?;
        let response = check_status(response, QueryError::FetchResults).await?;
        let results: GetQueryResultsResponse = response
            .json()
            .await
            .map_err(|e| QueryError::FetchResults(e.to_string()))?;
        Ok(decode_page(results))
    }
}

async fn check_status(
    response: reqwest::Response,
    wrap: fn(String) -> QueryError,
) -> Result<reqwest::Response, QueryError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let body = response.text().await.unwrap_or_else(|_| String::new());
    Err(wrap(format!("HTTP {status}: {body}")))
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct InsertJobRequest {
    job_reference: JobReference,
    configuration: JobConfiguration,
}

impl InsertJobRequest {
    fn new(project: &str, job: &QueryJob) -> Self {
        Self {
            job_reference: JobReference {
                project_id: project.to_string(),
                job_id: job.job_id.clone(),
            },
            configuration: JobConfiguration {
                query: QueryConfiguration {
                    query: job.sql.clone(),
                    use_legacy_sql: job.dialect.use_legacy_sql(),
                },
            },
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct JobReference {
    project_id: String,
    job_id: String,
}

#[derive(Debug, Serialize)]
struct JobConfiguration {
    query: QueryConfiguration,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct QueryConfiguration {
    query: String,
    use_legacy_sql: bool,
}

#[derive(Debug, Deserialize)]
struct GetJobResponse {
    status: JobStatus,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct JobStatus {
    state: String,
    #[serde(default)]
    error_result: Option<ErrorProto>,
}

impl JobStatus {
    fn into_state(self) -> JobState {
        match self.state.as_str() {
            "PENDING" => JobState::Pending,
            "RUNNING" => JobState::Running,
            _ => JobState::Done {
                error: self.error_result.map(|e| e.message),
            },
        }
    }
}

#[derive(Debug, Deserialize)]
struct ErrorProto {
    message: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GetQueryResultsResponse {
    #[serde(default)]
    schema: Option<TableSchema>,
    #[serde(default)]
    rows: Option<Vec<TableRow>>,
    #[serde(default)]
    page_token: Option<String>,
}

#[derive(Debug, Deserialize)]
struct TableSchema {
    fields: Vec<TableFieldSchema>,
}

#[derive(Debug, Deserialize)]
struct TableFieldSchema {
    name: String,
    #[serde(rename = "type")]
    field_type: String,
}

#[derive(Debug, Deserialize)]
struct TableRow {
    f: Vec<TableCell>,
}

#[derive(Debug, Deserialize)]
struct TableCell {
    v: serde_json::Value,
}

/// The wire format carries every cell as a JSON string (or null); the result
/// schema says what scalar it really is.
fn decode_cell(cell: &TableCell, field_type: &str) -> Value {
    let raw = match &cell.v {
        serde_json::Value::Null => return Value::Null,
        serde_json::Value::String(s) => s.as_str(),
        other => return Value::String(other.to_string()),
    };
    match field_type {
        "INTEGER" | "INT64" => raw
            .parse::<i64>()
            .map(Value::Int)
            .unwrap_or_else(|_| Value::String(raw.to_string())),
        "FLOAT" | "FLOAT64" | "NUMERIC" => raw
            .parse::<f64>()
            .map(Value::Float)
            .unwrap_or_else(|_| Value::String(raw.to_string())),
        "BOOLEAN" | "BOOL" => match raw {
            "true" => Value::Bool(true),
            "false" => Value::Bool(false),
            _ => Value::String(raw.to_string()),
        },
        _ => Value::String(raw.to_string()),
    }
}

fn decode_page(response: GetQueryResultsResponse) -> RowPage {
    let fields = response
        .schema
        .map(|s| s.fields)
        .unwrap_or_default();
    let rows = response
        .rows
        .unwrap_or_default()
        .into_iter()
        .map(|row| Row {
            columns: row
                .f
                .iter()
                .zip(fields.iter())
                .map(|(cell, field)| (field.name.clone(), decode_cell(cell, &field.field_type)))
                .collect(),
        })
        .collect();
    RowPage {
        rows,
        next_page_token: response.page_token,
    }
}
