//! Google speech backends.
//!
//! Recognition goes through the Cloud Speech-to-Text `recognize` REST call
//! (audio sent inline as base64; WAV and FLAC headers are read by the
//! service). Synthesis uses the translate text-to-speech endpoint, which
//! returns MP3 and accepts only short texts, so longer replies are split on
//! word boundaries and the MP3 segments concatenated.

use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use busmate_core::config::SpeechConfig;
use busmate_core::error::{BusmateError, Result};
use serde::{Deserialize, Serialize};

use crate::{AudioFormat, SpeechAudio, SpeechSynthesizer, Transcript, TranscriptionService};

/// Longest text, in characters, sent in one synthesis request.
pub const MAX_SYNTHESIS_CHUNK: usize = 100;

// =============================================================================
// Speech-to-text
// =============================================================================

#[derive(Debug, Serialize)]
struct RecognizeRequest<'a> {
    config: RecognitionConfig<'a>,
    audio: RecognitionAudio,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct RecognitionConfig<'a> {
    language_code: &'a str,
}

#[derive(Debug, Serialize)]
struct RecognitionAudio {
    content: String,
}

#[derive(Debug, Deserialize)]
struct RecognizeResponse {
    #[serde(default)]
    results: Vec<RecognitionResult>,
}

#[derive(Debug, Deserialize)]
struct RecognitionResult {
    #[serde(default)]
    alternatives: Vec<RecognitionAlternative>,
}

#[derive(Debug, Deserialize)]
struct RecognitionAlternative {
    #[serde(default)]
    transcript: String,
}

impl RecognizeResponse {
    /// Best alternative of every result, joined. An empty response means
    /// nothing was recognized.
    fn into_text(self) -> Result<String> {
        let text = self
            .results
            .into_iter()
            .filter_map(|r| r.alternatives.into_iter().next())
            .map(|a| a.transcript.trim().to_string())
            .filter(|t| !t.is_empty())
            .collect::<Vec<_>>()
            .join(" ");

        if text.is_empty() {
            return Err(BusmateError::Transcription(
                "No speech recognized".to_string(),
            ));
        }
        Ok(text)
    }
}

/// Cloud Speech-to-Text client.
pub struct GoogleSpeechClient {
    client: reqwest::Client,
    endpoint: String,
    language: String,
    api_key: String,
}

impl GoogleSpeechClient {
    pub fn new(config: &SpeechConfig, api_key: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            endpoint: config.recognition_endpoint.clone(),
            language: config.language.clone(),
            api_key: api_key.into(),
        }
    }

    /// Build a client with the key read from the configured environment
    /// variable.
    pub fn from_env(config: &SpeechConfig) -> Result<Self> {
        let api_key = std::env::var(&config.api_key_env).map_err(|_| {
            BusmateError::Config(format!("{} is not set", config.api_key_env))
        })?;
        Ok(Self::new(config, api_key))
    }

    pub fn language(&self) -> &str {
        &self.language
    }
}

impl TranscriptionService for GoogleSpeechClient {
    async fn transcribe(&self, audio: &[u8]) -> Result<Transcript> {
        if audio.is_empty() {
            return Err(BusmateError::Transcription(
                "Cannot transcribe empty audio data".to_string(),
            ));
        }

        let body = RecognizeRequest {
            config: RecognitionConfig {
                language_code: &self.language,
            },
            audio: RecognitionAudio {
                content: STANDARD.encode(audio),
            },
        };

        tracing::debug!(bytes = audio.len(), language = %self.language, "Requesting speech recognition");

        let response: RecognizeResponse = self
            .client
            .post(&self.endpoint)
            .query(&[("key", self.api_key.as_str())])
            .json(&body)
            .send()
            .await
            .map_err(|e| BusmateError::Http(e.to_string()))?
            .error_for_status()
            .map_err(|e| BusmateError::Http(e.to_string()))?
            .json()
            .await
            .map_err(|e| BusmateError::Transcription(format!("unreadable response: {}", e)))?;

        let text = response.into_text()?;
        tracing::info!(text_len = text.len(), "Speech recognized");

        Ok(Transcript {
            text,
            language: self.language.clone(),
        })
    }
}

// =============================================================================
// Text-to-speech
// =============================================================================

/// Translate text-to-speech client producing MP3.
pub struct GoogleTtsClient {
    client: reqwest::Client,
    endpoint: String,
    language: String,
}

impl GoogleTtsClient {
    pub fn new(config: &SpeechConfig) -> Self {
        Self {
            client: reqwest::Client::new(),
            endpoint: config.synthesis_endpoint.clone(),
            language: config.synthesis_language.clone(),
        }
    }

    pub fn language(&self) -> &str {
        &self.language
    }
}

impl SpeechSynthesizer for GoogleTtsClient {
    async fn synthesize(&self, text: &str) -> Result<SpeechAudio> {
        let chunks = split_for_synthesis(text, MAX_SYNTHESIS_CHUNK);
        if chunks.is_empty() {
            return Err(BusmateError::Synthesis("Nothing to say".to_string()));
        }

        let total = chunks.len().to_string();
        let mut bytes = Vec::new();

        for (idx, chunk) in chunks.iter().enumerate() {
            let idx = idx.to_string();
            let textlen = chunk.chars().count().to_string();
            let params = [
                ("ie", "UTF-8"),
                ("client", "tw-ob"),
                ("tl", self.language.as_str()),
                ("q", chunk.as_str()),
                ("total", total.as_str()),
                ("idx", idx.as_str()),
                ("textlen", textlen.as_str()),
            ];

            let segment = self
                .client
                .get(&self.endpoint)
                .query(&params)
                .send()
                .await
                .map_err(|e| BusmateError::Http(e.to_string()))?
                .error_for_status()
                .map_err(|e| BusmateError::Http(e.to_string()))?
                .bytes()
                .await
                .map_err(|e| BusmateError::Synthesis(format!("unreadable audio: {}", e)))?;

            bytes.extend_from_slice(&segment);
        }

        tracing::debug!(chunks = chunks.len(), bytes = bytes.len(), "Speech synthesized");

        Ok(SpeechAudio {
            bytes,
            format: AudioFormat::Mp3,
        })
    }
}

/// Split `text` into pieces of at most `max_chars` characters, breaking on
/// whitespace. A single word longer than `max_chars` is cut mid-word.
pub fn split_for_synthesis(text: &str, max_chars: usize) -> Vec<String> {
    let max_chars = max_chars.max(1);
    let mut chunks = Vec::new();
    let mut current = String::new();
    let mut current_len = 0usize;

    for word in text.split_whitespace() {
        let word_len = word.chars().count();

        if word_len > max_chars {
            if !current.is_empty() {
                chunks.push(std::mem::take(&mut current));
                current_len = 0;
            }
            let chars: Vec<char> = word.chars().collect();
            chunks.extend(chars.chunks(max_chars).map(|piece| piece.iter().collect()));
            continue;
        }

        if current.is_empty() {
            current.push_str(word);
            current_len = word_len;
        } else if current_len + 1 + word_len <= max_chars {
            current.push(' ');
            current.push_str(word);
            current_len += 1 + word_len;
        } else {
            chunks.push(std::mem::replace(&mut current, word.to_string()));
            current_len = word_len;
        }
    }

    if !current.is_empty() {
        chunks.push(current);
    }
    chunks
}
