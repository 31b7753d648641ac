//! Text-generation providers.
//!
//! The assistant sends one plain-text prompt per turn and expects one
//! plain-text reply. No conversation history is sent.

use std::collections::VecDeque;
use std::sync::Mutex;

use async_trait::async_trait;
use busmate_core::config::AssistantConfig;
use busmate_core::error::{BusmateError, Result};
use serde::{Deserialize, Serialize};

/// A language model that answers a single prompt.
#[async_trait]
pub trait TextGenerator: Send + Sync {
    async fn generate(&self, prompt: &str) -> Result<String>;
}

#[async_trait]
impl<G: TextGenerator + ?Sized> TextGenerator for Box<G> {
    async fn generate(&self, prompt: &str) -> Result<String> {
        (**self).generate(prompt).await
    }
}

// =============================================================================
// Gemini
// =============================================================================

#[derive(Debug, Serialize)]
struct GenerateRequest<'a> {
    contents: Vec<RequestContent<'a>>,
}

#[derive(Debug, Serialize)]
struct RequestContent<'a> {
    parts: Vec<RequestPart<'a>>,
}

#[derive(Debug, Serialize)]
struct RequestPart<'a> {
    text: &'a str,
}

#[derive(Debug, Deserialize)]
struct GenerateResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    #[serde(default)]
    content: Option<CandidateContent>,
}

#[derive(Debug, Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<CandidatePart>,
}

#[derive(Debug, Deserialize)]
struct CandidatePart {
    #[serde(default)]
    text: Option<String>,
}

impl GenerateResponse {
    /// Concatenated text of the first candidate.
    fn into_text(self) -> Result<String> {
        let text: String = self
            .candidates
            .into_iter()
            .next()
            .and_then(|c| c.content)
            .map(|content| content.parts.into_iter().filter_map(|p| p.text).collect())
            .unwrap_or_default();

        if text.trim().is_empty() {
            return Err(BusmateError::Generation(
                "model returned no text".to_string(),
            ));
        }
        Ok(text.trim().to_string())
    }
}

/// Google Gemini `generateContent` client.
pub struct GeminiClient {
    client: reqwest::Client,
    config: AssistantConfig,
    api_key: String,
}

impl GeminiClient {
    pub fn new(config: AssistantConfig, api_key: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            config,
            api_key: api_key.into(),
        }
    }

    /// Build a client with the key read from the configured environment
    /// variable.
    pub fn from_env(config: AssistantConfig) -> Result<Self> {
        let api_key = std::env::var(&config.api_key_env).map_err(|_| {
            BusmateError::Config(format!("{} is not set", config.api_key_env))
        })?;
        Ok(Self::new(config, api_key))
    }

    fn url(&self) -> String {
        format!(
            "{}/models/{}:generateContent",
            self.config.endpoint.trim_end_matches('/'),
            self.config.model
        )
    }
}

#[async_trait]
impl TextGenerator for GeminiClient {
    async fn generate(&self, prompt: &str) -> Result<String> {
        let body = GenerateRequest {
            contents: vec![RequestContent {
                parts: vec![RequestPart { text: prompt }],
            }],
        };

        tracing::debug!(model = %self.config.model, prompt_len = prompt.len(), "Calling text generator");

        let response: GenerateResponse = self
            .client
            .post(self.url())
            .query(&[("key", self.api_key.as_str())])
            .json(&body)
            .send()
            .await
            .map_err(|e| BusmateError::Http(e.to_string()))?
            .error_for_status()
            .map_err(|e| BusmateError::Http(e.to_string()))?
            .json()
            .await
            .map_err(|e| BusmateError::Generation(format!("unreadable response: {}", e)))?;

        response.into_text()
    }
}

// =============================================================================
// Offline generators
// =============================================================================

/// Offline generator that answers with the prompt it was given.
#[derive(Debug, Clone, Default)]
pub struct EchoGenerator;

#[async_trait]
impl TextGenerator for EchoGenerator {
    async fn generate(&self, prompt: &str) -> Result<String> {
        Ok(format!("(offline) {}", prompt))
    }
}

/// Generator that plays back queued replies and remembers every prompt.
///
/// Once the queue is empty every call fails.
#[derive(Debug, Default)]
pub struct ScriptedGenerator {
    replies: Mutex<VecDeque<std::result::Result<String, String>>>,
    prompts: Mutex<Vec<String>>,
}

impl ScriptedGenerator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn reply(self, text: impl Into<String>) -> Self {
        self.push(Ok(text.into()))
    }

    pub fn fail(self, reason: impl Into<String>) -> Self {
        self.push(Err(reason.into()))
    }

    fn push(self, item: std::result::Result<String, String>) -> Self {
        if let Ok(mut replies) = self.replies.lock() {
            replies.push_back(item);
        }
        self
    }

    /// Prompts received so far, oldest first.
    pub fn prompts(&self) -> Vec<String> {
        self.prompts.lock().map(|p| p.clone()).unwrap_or_default()
    }
}

#[async_trait]
impl TextGenerator for ScriptedGenerator {
    async fn generate(&self, prompt: &str) -> Result<String> {
        self.prompts
            .lock()
            .map_err(|e| BusmateError::Generation(format!("prompt log poisoned: {}", e)))?
            .push(prompt.to_string());

        let next = self
            .replies
            .lock()
            .map_err(|e| BusmateError::Generation(format!("reply queue poisoned: {}", e)))?
            .pop_front();

        match next {
            Some(Ok(reply)) => Ok(reply),
            Some(Err(reason)) => Err(BusmateError::Generation(reason)),
            None => Err(BusmateError::Generation("no scripted reply left".to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn parse(value: serde_json::Value) -> GenerateResponse {
        serde_json::from_value(value).unwrap()
    }

    #[test]
    fn test_response_text_joins_parts() {
        let response = parse(json!({
            "candidates": [{
                "content": { "parts": [{ "text": "Xe 08 " }, { "text": "đến sau 5 phút." }], "role": "model" },
                "finishReason": "STOP"
            }]
        }));
        assert_eq!(response.into_text().unwrap(), "Xe 08 đến sau 5 phút.");
    }

    #[test]
    fn test_response_without_candidates_is_error() {
        let err = parse(json!({ "promptFeedback": { "blockReason": "SAFETY" } }))
            .into_text()
            .unwrap_err();
        assert!(matches!(err, BusmateError::Generation(_)));
    }

    #[test]
    fn test_response_with_blank_text_is_error() {
        let response = parse(json!({ "candidates": [{ "content": { "parts": [{ "text": "  " }] } }] }));
        assert!(response.into_text().is_err());
    }

    #[test]
    fn test_request_body_shape() {
        let body = GenerateRequest {
            contents: vec![RequestContent {
                parts: vec![RequestPart { text: "Xin chào" }],
            }],
        };
        assert_eq!(
            serde_json::to_value(&body).unwrap(),
            json!({ "contents": [{ "parts": [{ "text": "Xin chào" }] }] })
        );
    }

    #[test]
    fn test_gemini_url() {
        let config = AssistantConfig {
            endpoint: "https://example.test/v1beta/".to_string(),
            model: "gemini-2.5-flash".to_string(),
            ..AssistantConfig::default()
        };
        let client = GeminiClient::new(config, "k");
        assert_eq!(
            client.url(),
            "https://example.test/v1beta/models/gemini-2.5-flash:generateContent"
        );
    }

    #[tokio::test]
    async fn test_echo_generator() {
        let reply = EchoGenerator.generate("Context: . User: hi.").await.unwrap();
        assert_eq!(reply, "(offline) Context: . User: hi.");
    }

    #[tokio::test]
    async fn test_scripted_generator_plays_queue_in_order() {
        let generator = ScriptedGenerator::new().reply("một").fail("quota").reply("ba");
        assert_eq!(generator.generate("p1").await.unwrap(), "một");
        assert!(generator.generate("p2").await.is_err());
        assert_eq!(generator.generate("p3").await.unwrap(), "ba");
        assert!(generator.generate("p4").await.is_err());
        assert_eq!(generator.prompts(), vec!["p1", "p2", "p3", "p4"]);
    }
}
