use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::error::{BusmateError, Result};

/// Top-level configuration for the Busmate application.
///
/// Loaded from `~/.busmate/config.toml` by default. Every section falls back
/// to its defaults when missing from the file.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BusmateConfig {
    #[serde(default)]
    pub general: GeneralConfig,
    #[serde(default)]
    pub directions: DirectionsConfig,
    #[serde(default)]
    pub assistant: AssistantConfig,
    #[serde(default)]
    pub speech: SpeechConfig,
}

impl BusmateConfig {
    /// Load configuration from a TOML file.
    ///
    /// Returns an error if the file cannot be read or parsed.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: BusmateConfig = toml::from_str(&content)?;
        info!("Configuration loaded from {}", path.display());
        Ok(config)
    }

    /// Load configuration from a TOML file, falling back to defaults if the
    /// file does not exist or cannot be parsed.
    pub fn load_or_default(path: &Path) -> Self {
        match Self::load(path) {
            Ok(config) => config,
            Err(e) => {
                warn!(
                    "Failed to load config from {}: {}. Using defaults.",
                    path.display(),
                    e
                );
                Self::default()
            }
        }
    }

    /// Save the current configuration to a TOML file.
    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content =
            toml::to_string_pretty(self).map_err(|e| BusmateError::Config(e.to_string()))?;
        std::fs::write(path, content)?;
        info!("Configuration saved to {}", path.display());
        Ok(())
    }
}

/// General application settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneralConfig {
    /// Log level: trace, debug, info, warn, error.
    pub log_level: String,
    /// Speak the recommended route and every assistant reply.
    pub auto_speak: bool,
    /// Ranking criterion used until the user picks another one.
    pub default_criterion: String,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            auto_speak: true,
            default_criterion: "shortest time".to_string(),
        }
    }
}

/// Directions provider settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DirectionsConfig {
    /// Directions REST endpoint.
    pub endpoint: String,
    /// Name of the environment variable holding the API key.
    pub api_key_env: String,
    /// Language of instructions and duration texts.
    pub language: String,
    /// Transit sub-mode requested from the provider.
    pub transit_mode: String,
    /// Saved directions response to replay instead of calling the provider.
    pub replay_file: Option<String>,
}

impl Default for DirectionsConfig {
    fn default() -> Self {
        Self {
            endpoint: "https://maps.googleapis.com/maps/api/directions/json".to_string(),
            api_key_env: "GOOGLE_MAPS_API_KEY".to_string(),
            language: "vi".to_string(),
            transit_mode: "bus".to_string(),
            replay_file: None,
        }
    }
}

/// Text-generation provider settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AssistantConfig {
    /// Base URL of the generation API.
    pub endpoint: String,
    /// Model name.
    pub model: String,
    /// Name of the environment variable holding the API key.
    pub api_key_env: String,
    /// Language the assistant is told to answer in.
    pub reply_language: String,
}

impl Default for AssistantConfig {
    fn default() -> Self {
        Self {
            endpoint: "https://generativelanguage.googleapis.com/v1beta".to_string(),
            model: "gemini-2.5-pro".to_string(),
            api_key_env: "GEMINI_API_KEY".to_string(),
            reply_language: "Vietnamese".to_string(),
        }
    }
}

/// Speech recognition and synthesis settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SpeechConfig {
    /// Speech-to-text `recognize` endpoint.
    pub recognition_endpoint: String,
    /// Name of the environment variable holding the speech-to-text API key.
    pub api_key_env: String,
    /// Recognition locale.
    pub language: String,
    /// Text-to-speech endpoint.
    pub synthesis_endpoint: String,
    /// Synthesis language code.
    pub synthesis_language: String,
    /// Where the latest spoken audio is written. Defaults to the temp dir.
    pub output_file: Option<String>,
}

impl Default for SpeechConfig {
    fn default() -> Self {
        Self {
            recognition_endpoint: "https://speech.googleapis.com/v1/speech:recognize".to_string(),
            api_key_env: "GOOGLE_SPEECH_API_KEY".to_string(),
            language: "vi-VN".to_string(),
            synthesis_endpoint: "https://translate.google.com/translate_tts".to_string(),
            synthesis_language: "vi".to_string(),
            output_file: None,
        }
    }
}
