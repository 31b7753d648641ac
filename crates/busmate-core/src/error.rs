use thiserror::Error;

/// Top-level error type for the Busmate system.
///
/// Provider failures (directions, generation, transcription, synthesis) each
/// get their own variant so callers can turn them into a status message
/// without matching on strings.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum BusmateError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Directions error: {0}")]
    Directions(String),

    #[error("Generation error: {0}")]
    Generation(String),

    #[error("Transcription error: {0}")]
    Transcription(String),

    #[error("Synthesis error: {0}")]
    Synthesis(String),

    #[error("HTTP error: {0}")]
    Http(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(String),
}

impl BusmateError {
    /// Whether this error came from an external provider call rather than
    /// from local configuration or I/O.
    pub fn is_provider_failure(&self) -> bool {
        matches!(
            self,
            BusmateError::Directions(_)
                | BusmateError::Generation(_)
                | BusmateError::Transcription(_)
                | BusmateError::Synthesis(_)
                | BusmateError::Http(_)
        )
    }
}

impl From<toml::de::Error> for BusmateError {
    fn from(err: toml::de::Error) -> Self {
        BusmateError::Config(err.to_string())
    }
}

impl From<toml::ser::Error> for BusmateError {
    fn from(err: toml::ser::Error) -> Self {
        BusmateError::Config(err.to_string())
    }
}

impl From<serde_json::Error> for BusmateError {
    fn from(err: serde_json::Error) -> Self {
        BusmateError::Serialization(err.to_string())
    }
}

/// A specialized `Result` type for Busmate operations.
pub type Result<T> = std::result::Result<T, BusmateError>;
