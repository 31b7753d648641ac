//! Error types for the conversational interface.

use busmate_core::error::BusmateError;

/// Errors from the chat engine.
#[derive(Debug, thiserror::Error)]
pub enum ChatError {
    #[error("message cannot be empty")]
    EmptyMessage,
    #[error("message exceeds maximum length of {0} characters")]
    MessageTooLong(usize),
    #[error("LLM error: {0}")]
    LlmError(String),
    #[error("voice error: {0}")]
    VoiceError(String),
}

impl From<BusmateError> for ChatError {
    fn from(err: BusmateError) -> Self {
        match err {
            BusmateError::Transcription(_) | BusmateError::Synthesis(_) => {
                ChatError::VoiceError(err.to_string())
            }
            other => ChatError::LlmError(other.to_string()),
        }
    }
}
