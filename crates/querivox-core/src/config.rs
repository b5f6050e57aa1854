use crate::error::ConfigError;
use regex::Regex;
use serde::Deserialize;
use std::path::Path;

#[derive(Debug, Deserialize, Clone, Default)]
pub struct AppConfig {
    #[serde(default)]
    pub general: GeneralConfig,

    #[serde(default)]
    pub query: QueryConfig,

    #[serde(default)]
    pub speech: SpeechConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct GeneralConfig {
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct QueryConfig {
    #[serde(default)]
    pub project: Option<String>,

    #[serde(default = "default_query_endpoint")]
    pub endpoint: String,

    #[serde(default = "default_query_poll_interval_ms")]
    pub poll_interval_ms: u64,

    #[serde(default = "default_page_size")]
    pub page_size: u32,
}

impl Default for QueryConfig {
    fn default() -> Self {
        Self {
            project: None,
            endpoint: default_query_endpoint(),
            poll_interval_ms: default_query_poll_interval_ms(),
            page_size: default_page_size(),
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct SpeechConfig {
    #[serde(default = "default_speech_endpoint")]
    pub endpoint: String,

    #[serde(default = "default_sample_rate_hertz")]
    pub sample_rate_hertz: u32,

    #[serde(default = "default_language_code")]
    pub language_code: String,

    #[serde(default = "default_speech_poll_interval_ms")]
    pub poll_interval_ms: u64,

    #[serde(default = "default_operation_timeout_secs")]
    pub operation_timeout_secs: u64,
}

impl Default for SpeechConfig {
    fn default() -> Self {
        Self {
            endpoint: default_speech_endpoint(),
            sample_rate_hertz: default_sample_rate_hertz(),
            language_code: default_language_code(),
            poll_interval_ms: default_speech_poll_interval_ms(),
            operation_timeout_secs: default_operation_timeout_secs(),
        }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_query_endpoint() -> String {
    "https://bigquery.googleapis.com/bigquery/v2".to_string()
}

fn default_query_poll_interval_ms() -> u64 {
    500
}

fn default_page_size() -> u32 {
    1000
}

fn default_speech_endpoint() -> String {
    "https://speech.googleapis.com/v1".to_string()
}

fn default_sample_rate_hertz() -> u32 {
    44100
}

fn default_language_code() -> String {
    "ja-JP".to_string()
}

fn default_speech_poll_interval_ms() -> u64 {
    2000
}

fn default_operation_timeout_secs() -> u64 {
    360
}

/// Interpolate `${VAR}` patterns with environment variable values.
fn interpolate_env_vars(input: &str) -> Result<String, ConfigError> {
    let re = Regex::new(r"\$\{([^}]+)\}").unwrap();
    let mut result = input.to_string();
    let mut errors = Vec::new();

    for cap in re.captures_iter(input) {
        let var_name = &cap[1];
        match std::env::var(var_name) {
            Ok(val) => {
                result = result.replace(&cap[0], &val);
            }
            Err(_) => {
                errors.push(var_name.to_string());
            }
        }
    }

    if let Some(first_missing) = errors.into_iter().next() {
        return Err(ConfigError::EnvVarNotFound(first_missing));
    }

    Ok(result)
}

impl AppConfig {
    /// Load configuration from a TOML file, with environment variable interpolation.
    pub fn load_from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        let interpolated = interpolate_env_vars(&content)?;
        let config: AppConfig = toml::from_str(&interpolated)?;
        Ok(config)
    }

    /// Parse configuration from a TOML string (for testing).
    pub fn from_toml_str(s: &str) -> Result<Self, ConfigError> {
        let interpolated = interpolate_env_vars(s)?;
        let config: AppConfig = toml::from_str(&interpolated)?;
        Ok(config)
    }

    /// Load from `path` when given, otherwise fall back to defaults.
    pub fn load_or_default(path: Option<&Path>) -> Result<Self, ConfigError> {
        match path {
            Some(p) => Self::load_from_file(p),
            None => Ok(Self::default()),
        }
    }
}
