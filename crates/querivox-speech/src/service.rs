use async_trait::async_trait;
use querivox_core::{OperationState, RecognitionConfig, SpeechError, SpeechSegment};

/// Seam to the remote speech-recognition service.
#[async_trait]
pub trait SpeechService: Send + Sync {
    /// Synchronous recognition of inline audio content. Meant for small
    /// payloads; the result is fully materialized in the response.
    async fn recognize(
        &self,
        config: &RecognitionConfig,
        content: &[u8],
    ) -> Result<Vec<SpeechSegment>, SpeechError>;

    /// Start a long-running recognition of audio referenced by URI.
    /// Returns the operation name to poll.
    async fn start_recognition(
        &self,
        config: &RecognitionConfig,
        uri: &str,
    ) -> Result<String, SpeechError>;

    /// Fetch the current state of a long-running operation.
    async fn operation_state(&self, name: &str) -> Result<OperationState, SpeechError>;
}
