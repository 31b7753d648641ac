//! Busmate speech crate - speech-to-text and text-to-speech seams.
//!
//! Both directions are treated as black-box codecs: bytes in / text out for
//! recognition, text in / audio out for synthesis. This crate defines the
//! traits, the value types that cross them, the Google backends, and mock
//! implementations for tests.

use std::future::Future;

use busmate_core::config::SpeechConfig;
use busmate_core::error::BusmateError;

pub mod google;

pub use google::{GoogleSpeechClient, GoogleTtsClient};

// =============================================================================
// Input events
// =============================================================================

/// A finished microphone recording delivered by the front end.
///
/// The front end may present the same event more than once (for instance
/// when it redraws), so every event carries a stable identifier.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SpeechEvent {
    /// Identifier assigned by the recorder.
    pub id: String,
    /// Encoded audio (typically WAV).
    pub audio: Vec<u8>,
}

impl SpeechEvent {
    pub fn new(id: impl Into<String>, audio: Vec<u8>) -> Self {
        Self {
            id: id.into(),
            audio,
        }
    }
}

// =============================================================================
// Result types
// =============================================================================

/// Recognized text for one recording.
#[derive(Debug, Clone, PartialEq)]
pub struct Transcript {
    /// Full recognized text, never empty.
    pub text: String,
    /// Recognition locale, e.g. "vi-VN".
    pub language: String,
}

/// Encoding of synthesized audio.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AudioFormat {
    Mp3,
    Wav,
}

impl AudioFormat {
    pub fn mime_type(&self) -> &'static str {
        match self {
            AudioFormat::Mp3 => "audio/mp3",
            AudioFormat::Wav => "audio/wav",
        }
    }
}

/// Synthesized speech ready for playback.
#[derive(Debug, Clone, PartialEq)]
pub struct SpeechAudio {
    pub bytes: Vec<u8>,
    pub format: AudioFormat,
}

// =============================================================================
// Traits
// =============================================================================

/// Service for turning recorded audio into text.
///
/// "Nothing recognized" is an error, never an empty transcript.
pub trait TranscriptionService: Send + Sync {
    fn transcribe(
        &self,
        audio: &[u8],
    ) -> impl Future<Output = Result<Transcript, BusmateError>> + Send;
}

/// Service for turning reply text into playable audio.
pub trait SpeechSynthesizer: Send + Sync {
    fn synthesize(
        &self,
        text: &str,
    ) -> impl Future<Output = Result<SpeechAudio, BusmateError>> + Send;
}

/// Synthesize `text`, degrading any failure to "no audio".
pub async fn synthesize_or_silence<S: SpeechSynthesizer>(
    synthesizer: &S,
    text: &str,
) -> Option<SpeechAudio> {
    match synthesizer.synthesize(text).await {
        Ok(audio) => Some(audio),
        Err(e) => {
            tracing::warn!(error = %e, "Speech synthesis failed, continuing without audio");
            None
        }
    }
}

// =============================================================================
// Mock implementations
// =============================================================================

/// Mock transcription service for tests.
///
/// Returns a fixed text, or recognizes nothing when built with
/// [`MockTranscriptionService::silent`].
#[derive(Debug, Clone)]
pub struct MockTranscriptionService {
    text: Option<String>,
    language: String,
}

impl MockTranscriptionService {
    /// Always recognizes `"[mock transcription]"`.
    pub fn new() -> Self {
        Self::with_text("[mock transcription]")
    }

    pub fn with_text(text: impl Into<String>) -> Self {
        Self {
            text: Some(text.into()),
            language: SpeechConfig::default().language,
        }
    }

    /// Never recognizes anything.
    pub fn silent() -> Self {
        Self {
            text: None,
            language: SpeechConfig::default().language,
        }
    }
}

impl Default for MockTranscriptionService {
    fn default() -> Self {
        Self::new()
    }
}

impl TranscriptionService for MockTranscriptionService {
    async fn transcribe(&self, audio: &[u8]) -> Result<Transcript, BusmateError> {
        if audio.is_empty() {
            return Err(BusmateError::Transcription(
                "Cannot transcribe empty audio data".to_string(),
            ));
        }

        let text = self.text.as_deref().unwrap_or_default().trim().to_string();

        if text.is_empty() {
            return Err(BusmateError::Transcription(
                "No speech recognized".to_string(),
            ));
        }

        tracing::debug!(bytes = audio.len(), text_len = text.len(), "Mock transcription generated");

        Ok(Transcript {
            text,
            language: self.language.clone(),
        })
    }
}

/// Mock synthesizer producing deterministic bytes derived from the text.
#[derive(Debug, Clone, Default)]
pub struct MockSynthesizer;

impl MockSynthesizer {
    pub fn new() -> Self {
        Self
    }
}

impl SpeechSynthesizer for MockSynthesizer {
    async fn synthesize(&self, text: &str) -> Result<SpeechAudio, BusmateError> {
        if text.trim().is_empty() {
            return Err(BusmateError::Synthesis("Nothing to say".to_string()));
        }
        let mut bytes = b"MOCK-MP3:".to_vec();
        bytes.extend_from_slice(text.as_bytes());
        Ok(SpeechAudio {
            bytes,
            format: AudioFormat::Mp3,
        })
    }
}

/// Synthesizer used when no speech backend is configured. Always fails.
#[derive(Debug, Clone, Default)]
pub struct SilentSynthesizer;

impl SpeechSynthesizer for SilentSynthesizer {
    async fn synthesize(&self, _text: &str) -> Result<SpeechAudio, BusmateError> {
        Err(BusmateError::Synthesis(
            "No speech synthesis backend configured".to_string(),
        ))
    }
}

// =============================================================================
// Optional backends
// =============================================================================

/// A recognizer that may not be configured. `None` fails every call.
impl<T: TranscriptionService> TranscriptionService for Option<T> {
    async fn transcribe(&self, audio: &[u8]) -> Result<Transcript, BusmateError> {
        match self {
            Some(service) => service.transcribe(audio).await,
            None => Err(BusmateError::Transcription(
                "speech recognition is not configured".to_string(),
            )),
        }
    }
}

/// A synthesizer that may not be configured. `None` fails every call.
impl<S: SpeechSynthesizer> SpeechSynthesizer for Option<S> {
    async fn synthesize(&self, text: &str) -> Result<SpeechAudio, BusmateError> {
        match self {
            Some(synthesizer) => synthesizer.synthesize(text).await,
            None => Err(BusmateError::Synthesis(
                "speech synthesis is not configured".to_string(),
            )),
        }
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_mock_transcription_fixed() {
        let service = MockTranscriptionService::new();
        let result = service.transcribe(b"RIFF....WAVE").await.unwrap();
        assert_eq!(result.text, "[mock transcription]");
        assert_eq!(result.language, "vi-VN");
    }

    #[tokio::test]
    async fn test_mock_transcription_empty_audio() {
        let service = MockTranscriptionService::new();
        let result = service.transcribe(&[]).await;
        assert!(matches!(result, Err(BusmateError::Transcription(_))));
    }

    #[tokio::test]
    async fn test_mock_transcription_nothing_recognized_is_error() {
        let service = MockTranscriptionService::silent();
        let result = service.transcribe(&[1, 2, 3]).await;
        assert!(result.is_err());
        assert!(result.unwrap_err().to_string().contains("No speech"));
    }

    #[tokio::test]
    async fn test_mock_transcription_blank_text_is_error() {
        let service = MockTranscriptionService::with_text("   ");
        assert!(service.transcribe(b"RIFF").await.is_err());
    }

    #[tokio::test]
    async fn test_unconfigured_recognizer_reports_it() {
        let service: Option<MockTranscriptionService> = None;
        let err = service.transcribe(b"RIFF").await.unwrap_err();
        assert!(matches!(err, BusmateError::Transcription(_)));
        assert!(err.to_string().contains("not configured"));

        let service = Some(MockTranscriptionService::with_text("xe 08"));
        assert_eq!(service.transcribe(b"RIFF").await.unwrap().text, "xe 08");
    }

    #[tokio::test]
    async fn test_unconfigured_synthesizer_degrades_to_silence() {
        let synthesizer: Option<MockSynthesizer> = None;
        assert!(synthesize_or_silence(&synthesizer, "Xin chào").await.is_none());
        assert!(synthesize_or_silence(&Some(MockSynthesizer), "Xin chào")
            .await
            .is_some());
    }

    #[tokio::test]
    async fn test_mock_synthesizer() {
        let audio = MockSynthesizer::new().synthesize("Xin chào").await.unwrap();
        assert_eq!(audio.format, AudioFormat::Mp3);
        assert!(audio.bytes.starts_with(b"MOCK-MP3:"));
        assert!(audio.bytes.ends_with("Xin chào".as_bytes()));
    }

    #[tokio::test]
    async fn test_mock_synthesizer_rejects_blank() {
        assert!(MockSynthesizer::new().synthesize("  ").await.is_err());
    }

    #[tokio::test]
    async fn test_synthesize_or_silence_degrades() {
        assert!(synthesize_or_silence(&SilentSynthesizer, "Xin chào")
            .await
            .is_none());
        assert!(synthesize_or_silence(&MockSynthesizer, "Xin chào")
            .await
            .is_some());
    }

    #[test]
    fn test_audio_format_mime() {
        assert_eq!(AudioFormat::Mp3.mime_type(), "audio/mp3");
        assert_eq!(AudioFormat::Wav.mime_type(), "audio/wav");
    }

    #[test]
    fn test_speech_event_new() {
        let event = SpeechEvent::new("mic-1", vec![0, 1]);
        assert_eq!(event.id, "mic-1");
        assert_eq!(event.audio.len(), 2);
    }
}
