//! Conversational interface for Busmate.
//!
//! Keeps the recommended route as conversation context, arbitrates between
//! typed and spoken input, and drives the search → answer flow.

pub mod context;
pub mod error;
pub mod llm;
pub mod orchestrator;

pub use context::{
    route_announcement, route_synopsis, ConversationSession, InputSource, Role, Turn, TurnInput,
    MAX_MESSAGE_LENGTH,
};
pub use error::ChatError;
pub use llm::{EchoGenerator, GeminiClient, ScriptedGenerator, TextGenerator};
pub use orchestrator::{AssistantSettings, SearchOutcome, TransitAssistant, TurnOutcome};
