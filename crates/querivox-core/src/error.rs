use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file: {0}")]
    FileRead(#[from] std::io::Error),

    #[error("failed to parse TOML: {0}")]
    TomlParse(#[from] toml::de::Error),

    #[error("environment variable not found: {0}")]
    EnvVarNotFound(String),
}

#[derive(Debug, Error)]
pub enum QueryError {
    #[error("query text is empty")]
    EmptyQuery,

    #[error("no project configured: set [query].project or {0}")]
    MissingProject(String),

    #[error("missing access token: set {0}")]
    MissingCredentials(String),

    #[error("failed to submit job: {0}")]
    Submit(String),

    #[error("failed to poll job state: {0}")]
    Poll(String),

    #[error("job {job_id} failed: {message}")]
    JobFailed { job_id: String, message: String },

    #[error("failed to fetch results: {0}")]
    FetchResults(String),

    #[error("failed to write results: {0}")]
    Output(#[from] std::io::Error),
}

#[derive(Debug, Error)]
pub enum SpeechError {
    #[error("failed to read audio file {path}: {source}")]
    FileRead {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("missing access token: set {0}")]
    MissingCredentials(String),

    #[error("recognition request failed: {0}")]
    Request(String),

    #[error("operation {name} failed: {message}")]
    OperationFailed { name: String, message: String },

    #[error("operation {name} timed out after {ceiling:?}")]
    OperationTimeout { name: String, ceiling: Duration },

    #[error("failed to write transcript: {0}")]
    Output(std::io::Error),
}
