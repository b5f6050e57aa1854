use crate::service::SpeechService;
use async_trait::async_trait;
use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use querivox_core::{
    OperationState, RecognitionConfig, SpeechAlternative, SpeechConfig, SpeechError, SpeechSegment,
};
use serde::{Deserialize, Serialize};

pub const ACCESS_TOKEN_VAR: &str = "QUERIVOX_ACCESS_TOKEN";

/// REST client for the managed speech service (Speech-to-Text v1). Inline
/// audio is base64-encoded into the request body; remote audio is passed
/// through as its storage URI.
pub struct SpeechClient {
    http: reqwest::Client,
    endpoint: String,
    token: String,
}

impl SpeechClient {
    pub fn from_config(config: &SpeechConfig) -> Result<Self, SpeechError> {
        let token = std::env::var(ACCESS_TOKEN_VAR)
            .map_err(|_| SpeechError::MissingCredentials(ACCESS_TOKEN_VAR.to_string()))?;
        Ok(Self {
            http: reqwest::Client::new(),
            endpoint: config.endpoint.trim_end_matches('/').to_string(),
            token,
        })
    }

    async fn post_recognition(
        &self,
        method: &str,
        body: &RecognizeRequest,
    ) -> Result<reqwest::Response, SpeechError> {
        let url = format!("{}/speech:{method}", self.endpoint);
        let response = self
            .http
            .post(&url)
            .bearer_auth(&self.token)
            .json(body)
            .send()
            .await
            .map_err(|e| SpeechError::Request(e.to_string()))?;
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }
        let body = response.text().await.unwrap_or_else(|_| String::new());
        Err(SpeechError::Request(format!("HTTP {status}: {body}")))
    }
}

#[async_trait]
impl SpeechService for SpeechClient {
    async fn recognize(
        &self,
        config: &RecognitionConfig,
        content: &[u8],
    ) -> Result<Vec<SpeechSegment>, SpeechError> {
        let body = RecognizeRequest::inline(config, content);
        let response = self.post_recognition("recognize", &body).await?;
        let parsed: RecognizeResponse = response
            .json()
            .await
            .map_err(|e| SpeechError::Request(e.to_string()))?;
        Ok(decode_results(parsed.results))
    }

    async fn start_recognition(
        &self,
        config: &RecognitionConfig,
        uri: &str,
    ) -> Result<String, SpeechError> {
        let body = RecognizeRequest::remote(config, uri);
        let response = self.post_recognition("longrunningrecognize", &body).await?;
        let parsed: OperationResponse = response
            .json()
            .await
            .map_err(|e| SpeechError::Request(e.to_string()))?;
        Ok(parsed.name)
    }

    async fn operation_state(&self, name: &str) -> Result<OperationState, SpeechError> {
        let url = format!("{}/operations/{name}", self.endpoint);
        let response = self
            .http
            .get(&url)
            .bearer_auth(&self.token)
            .send()
            .await
            .map_err(|e| SpeechError::Request(e.to_string()))?;
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_else(|_| String::new());
            return Err(SpeechError::Request(format!("HTTP {status}: {body}")));
        }
        let parsed: OperationResponse = response
            .json()
            .await
            .map_err(|e| SpeechError::Request(e.to_string()))?;
        decode_operation(parsed)
    }
}

#[derive(Debug, Serialize)]
struct RecognizeRequest {
    config: RecognitionConfigBody,
    audio: RecognitionAudio,
}

impl RecognizeRequest {
    fn inline(config: &RecognitionConfig, content: &[u8]) -> Self {
        Self {
            config: RecognitionConfigBody::from(config),
            audio: RecognitionAudio {
                content: Some(STANDARD.encode(content)),
                uri: None,
            },
        }
    }

    fn remote(config: &RecognitionConfig, uri: &str) -> Self {
        Self {
            config: RecognitionConfigBody::from(config),
            audio: RecognitionAudio {
                content: None,
                uri: Some(uri.to_string()),
            },
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct RecognitionConfigBody {
    encoding: String,
    sample_rate_hertz: u32,
    language_code: String,
}

impl From<&RecognitionConfig> for RecognitionConfigBody {
    fn from(config: &RecognitionConfig) -> Self {
        Self {
            encoding: config.encoding.as_str().to_string(),
            sample_rate_hertz: config.sample_rate_hertz,
            language_code: config.language_code.clone(),
        }
    }
}

#[derive(Debug, Serialize)]
struct RecognitionAudio {
    #[serde(skip_serializing_if = "Option::is_none")]
    content: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    uri: Option<String>,
}

#[derive(Debug, Deserialize)]
struct RecognizeResponse {
    #[serde(default)]
    results: Vec<ResultBody>,
}

#[derive(Debug, Deserialize)]
struct ResultBody {
    #[serde(default)]
    alternatives: Vec<AlternativeBody>,
}

#[derive(Debug, Deserialize)]
struct AlternativeBody {
    #[serde(default)]
    transcript: String,
    #[serde(default)]
    confidence: f32,
}

#[derive(Debug, Deserialize)]
struct OperationResponse {
    name: String,
    #[serde(default)]
    done: bool,
    #[serde(default)]
    response: Option<RecognizeResponse>,
    #[serde(default)]
    error: Option<OperationError>,
}

#[derive(Debug, Deserialize)]
struct OperationError {
    #[serde(default)]
    message: String,
}

fn decode_results(results: Vec<ResultBody>) -> Vec<SpeechSegment> {
    results
        .into_iter()
        .map(|result| SpeechSegment {
            alternatives: result
                .alternatives
                .into_iter()
                .map(|alt| SpeechAlternative {
                    transcript: alt.transcript,
                    confidence: alt.confidence,
                })
                .collect(),
        })
        .collect()
}

fn decode_operation(operation: OperationResponse) -> Result<OperationState, SpeechError> {
    if let Some(error) = operation.error {
        return Err(SpeechError::OperationFailed {
            name: operation.name,
            message: error.message,
        });
    }
    if !operation.done {
        return Ok(OperationState::Running);
    }
    let results = operation.response.map(|r| r.results).unwrap_or_default();
    Ok(OperationState::Done(decode_results(results)))
}
