use crate::service::SpeechService;
use querivox_core::{
    AudioEncoding, AudioSource, OperationState, RecognitionConfig, SpeechConfig, SpeechError,
};
use std::io::Write;
use std::path::Path;
use std::time::Duration;
use tokio::time::Instant;

/// Dispatches one audio source through the matching recognition mode:
/// local paths take one synchronous call with inline content, `gs://` URIs
/// take a long-running operation polled to completion. The split follows
/// payload size in practice, so a large local file is still attempted
/// synchronously — a known weakness of the dispatch rule.
pub struct Transcriber<S> {
    service: S,
    config: RecognitionConfig,
    poll_interval: Duration,
    operation_timeout: Duration,
}

impl<S: SpeechService> Transcriber<S> {
    pub fn new(
        service: S,
        config: RecognitionConfig,
        poll_interval: Duration,
        operation_timeout: Duration,
    ) -> Self {
        Self {
            service,
            config,
            poll_interval,
            operation_timeout,
        }
    }

    pub fn from_config(service: S, config: &SpeechConfig) -> Self {
        Self::new(
            service,
            RecognitionConfig {
                encoding: AudioEncoding::Flac,
                sample_rate_hertz: config.sample_rate_hertz,
                language_code: config.language_code.clone(),
            },
            Duration::from_millis(config.poll_interval_ms),
            Duration::from_secs(config.operation_timeout_secs),
        )
    }

    pub async fn run<W: Write>(&self, path: &str, out: &mut W) -> Result<(), SpeechError> {
        match AudioSource::classify(path) {
            AudioSource::Local(path) => self.transcribe_local(&path, out).await,
            AudioSource::Remote(uri) => self.transcribe_remote(&uri, out).await,
        }
    }

    /// Immediate mode: read the whole file, recognize in one call, print the
    /// transcript of the first alternative of the first segment.
    async fn transcribe_local<W: Write>(
        &self,
        path: &Path,
        out: &mut W,
    ) -> Result<(), SpeechError> {
        let content = std::fs::read(path).map_err(|source| SpeechError::FileRead {
            path: path.to_path_buf(),
            source,
        })?;
        tracing::info!(path = %path.display(), bytes = content.len(), "recognizing local file");

        let segments = self.service.recognize(&self.config, &content).await?;
        if let Some(alternative) = segments
            .first()
            .and_then(|segment| segment.alternatives.first())
        {
            writeln!(out, "{}", alternative.transcript).map_err(SpeechError::Output)?;
        }
        Ok(())
    }

    /// Polled mode: start a long-running operation and poll until it is done
    /// or the timeout ceiling elapses, then print transcript and confidence
    /// for every alternative of every segment. A timeout discards any
    /// partially completed recognition.
    async fn transcribe_remote<W: Write>(
        &self,
        uri: &str,
        out: &mut W,
    ) -> Result<(), SpeechError> {
        let name = self.service.start_recognition(&self.config, uri).await?;
        tracing::info!(operation = %name, uri, "waiting for recognition operation");

        let deadline = Instant::now() + self.operation_timeout;
        let segments = loop {
            match self.service.operation_state(&name).await? {
                OperationState::Done(segments) => break segments,
                OperationState::Running => {
                    if Instant::now() >= deadline {
                        return Err(SpeechError::OperationTimeout {
                            name,
                            ceiling: self.operation_timeout,
                        });
                    }
                    tracing::debug!(operation = %name, "operation still running");
                    tokio::time::sleep(self.poll_interval).await;
                }
            }
        };

        for segment in &segments {
            for alternative in &segment.alternatives {
                writeln!(out, "{}", alternative.transcript).map_err(SpeechError::Output)?;
                writeln!(out, "{}", alternative.confidence).map_err(SpeechError::Output)?;
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use querivox_core::{SpeechAlternative, SpeechSegment};
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;

    struct MockSpeech {
        recognize_calls: AtomicUsize,
        start_calls: Mutex<Vec<String>>,
        segments: Vec<SpeechSegment>,
        polls_until_done: usize,
        polls_seen: AtomicUsize,
        fail: bool,
    }

    impl MockSpeech {
        fn with_segments(segments: Vec<SpeechSegment>) -> Self {
            Self {
                recognize_calls: AtomicUsize::new(0),
                start_calls: Mutex::new(Vec::new()),
                segments,
                polls_until_done: 0,
                polls_seen: AtomicUsize::new(0),
                fail: false,
            }
        }

        fn never_done() -> Self {
            Self {
                polls_until_done: usize::MAX,
                ..Self::with_segments(Vec::new())
            }
        }

        fn failing() -> Self {
            Self {
                fail: true,
                ..Self::with_segments(Vec::new())
            }
        }
    }

    #[async_trait]
    impl SpeechService for &MockSpeech {
        async fn recognize(
            &self,
            _config: &RecognitionConfig,
            _content: &[u8],
        ) -> Result<Vec<SpeechSegment>, SpeechError> {
            self.recognize_calls.fetch_add(1, Ordering::Relaxed);
            if self.fail {
                return Err(SpeechError::Request("invalid audio".to_string()));
            }
            Ok(self.segments.clone())
        }

        async fn start_recognition(
            &self,
            _config: &RecognitionConfig,
            uri: &str,
        ) -> Result<String, SpeechError> {
            if self.fail {
                return Err(SpeechError::Request("permission denied".to_string()));
            }
            self.start_calls.lock().unwrap().push(uri.to_string());
            Ok("operations/123".to_string())
        }

        async fn operation_state(&self, _name: &str) -> Result<OperationState, SpeechError> {
            let seen = self.polls_seen.fetch_add(1, Ordering::Relaxed);
            if seen >= self.polls_until_done {
                Ok(OperationState::Done(self.segments.clone()))
            } else {
                Ok(OperationState::Running)
            }
        }
    }

    fn segment(alts: &[(&str, f32)]) -> SpeechSegment {
        SpeechSegment {
            alternatives: alts
                .iter()
                .map(|(transcript, confidence)| SpeechAlternative {
                    transcript: transcript.to_string(),
                    confidence: *confidence,
                })
                .collect(),
        }
    }

    fn transcriber(service: &MockSpeech) -> Transcriber<&MockSpeech> {
        Transcriber::new(
            service,
            RecognitionConfig {
                encoding: AudioEncoding::Flac,
                sample_rate_hertz: 44100,
                language_code: "ja-JP".to_string(),
            },
            Duration::from_millis(1),
            Duration::from_millis(50),
        )
    }

    fn write_temp_audio(name: &str) -> std::path::PathBuf {
        let dir = std::env::temp_dir().join("querivox_test_audio");
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join(name);
        std::fs::write(&path, b"fLaC fake audio bytes").unwrap();
        path
    }

    #[tokio::test]
    async fn test_local_file_prints_exactly_one_line() {
        let service = MockSpeech::with_segments(vec![segment(&[("こんにちは", 0.92)])]);
        let path = write_temp_audio("single.flac");
        let mut out = Vec::new();

        transcriber(&service)
            .run(path.to_str().unwrap(), &mut out)
            .await
            .unwrap();

        assert_eq!(String::from_utf8(out).unwrap(), "こんにちは\n");
        assert_eq!(service.recognize_calls.load(Ordering::Relaxed), 1);
        assert!(service.start_calls.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_local_file_first_alternative_of_first_segment_only() {
        let service = MockSpeech::with_segments(vec![
            segment(&[("first", 0.9), ("second", 0.5)]),
            segment(&[("other segment", 0.8)]),
        ]);
        let path = write_temp_audio("multi.flac");
        let mut out = Vec::new();

        transcriber(&service)
            .run(path.to_str().unwrap(), &mut out)
            .await
            .unwrap();

        assert_eq!(String::from_utf8(out).unwrap(), "first\n");
    }

    #[tokio::test]
    async fn test_local_unreadable_file_is_fatal() {
        let service = MockSpeech::with_segments(vec![]);
        let mut out = Vec::new();
        let result = transcriber(&service)
            .run("/nonexistent/audio.flac", &mut out)
            .await;
        assert!(matches!(result, Err(SpeechError::FileRead { .. })));
        assert_eq!(service.recognize_calls.load(Ordering::Relaxed), 0);
        assert!(out.is_empty());
    }

    #[tokio::test]
    async fn test_remote_uri_never_reads_local_file() {
        let service = MockSpeech::with_segments(vec![segment(&[("brooklyn", 0.97)])]);
        let mut out = Vec::new();

        transcriber(&service)
            .run("gs://bucket/object.flac", &mut out)
            .await
            .unwrap();

        assert_eq!(service.recognize_calls.load(Ordering::Relaxed), 0);
        assert_eq!(
            *service.start_calls.lock().unwrap(),
            vec!["gs://bucket/object.flac".to_string()],
        );
    }

    #[tokio::test]
    async fn test_remote_prints_pair_per_alternative_in_order() {
        let service = MockSpeech::with_segments(vec![
            segment(&[("hello", 0.95), ("hallo", 0.6)]),
            segment(&[("world", 0.9)]),
        ]);
        let mut out = Vec::new();

        transcriber(&service)
            .run("gs://bucket/audio.flac", &mut out)
            .await
            .unwrap();

        assert_eq!(
            String::from_utf8(out).unwrap(),
            "hello\n0.95\nhallo\n0.6\nworld\n0.9\n",
        );
    }

    #[tokio::test]
    async fn test_remote_polls_until_done() {
        let mut service = MockSpeech::with_segments(vec![segment(&[("done", 1.0)])]);
        service.polls_until_done = 3;
        let mut out = Vec::new();

        transcriber(&service)
            .run("gs://bucket/audio.flac", &mut out)
            .await
            .unwrap();

        assert!(service.polls_seen.load(Ordering::Relaxed) >= 4);
        assert_eq!(String::from_utf8(out).unwrap(), "done\n1\n");
    }

    #[tokio::test]
    async fn test_remote_timeout_discards_partial_result() {
        let service = MockSpeech::never_done();
        let mut out = Vec::new();

        let result = transcriber(&service)
            .run("gs://bucket/slow.flac", &mut out)
            .await;

        match result {
            Err(SpeechError::OperationTimeout { name, .. }) => {
                assert_eq!(name, "operations/123");
            }
            other => panic!("expected OperationTimeout, got {other:?}"),
        }
        assert!(out.is_empty());
    }

    #[tokio::test]
    async fn test_service_error_produces_no_output() {
        let service = MockSpeech::failing();
        let path = write_temp_audio("error.flac");
        let mut out = Vec::new();

        let result = transcriber(&service)
            .run(path.to_str().unwrap(), &mut out)
            .await;
        assert!(matches!(result, Err(SpeechError::Request(_))));
        assert!(out.is_empty());
    }

    #[tokio::test]
    async fn test_from_config_uses_flac_defaults() {
        let service = MockSpeech::with_segments(vec![]);
        let config = SpeechConfig::default();
        let transcriber = Transcriber::from_config(&service, &config);
        assert_eq!(transcriber.config.encoding, AudioEncoding::Flac);
        assert_eq!(transcriber.config.sample_rate_hertz, 44100);
        assert_eq!(transcriber.config.language_code, "ja-JP");
        assert_eq!(transcriber.operation_timeout, Duration::from_secs(360));
    }
}
