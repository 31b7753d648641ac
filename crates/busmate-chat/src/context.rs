//! Conversation context management.
//!
//! Holds the single "current route" fact the assistant answers from, the
//! transcript of the session, and the bookkeeping that keeps a recording
//! from being transcribed twice.

use std::collections::HashSet;

use busmate_route::RouteSummary;
use busmate_speech::{SpeechEvent, TranscriptionService};
use serde::{Deserialize, Serialize};

use crate::error::ChatError;

/// Maximum typed message length in characters.
pub const MAX_MESSAGE_LENGTH: usize = 2000;

// =============================================================================
// Transcript
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
}

/// One transcript entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Turn {
    pub role: Role,
    pub content: String,
}

/// Which channel supplied a turn's input.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputSource {
    Typed,
    Speech,
}

/// The single input that won a turn.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TurnInput {
    pub text: String,
    pub source: InputSource,
}

// =============================================================================
// ConversationSession
// =============================================================================

/// Per-session state, passed explicitly into every handler.
///
/// Starts empty. The context is overwritten by each successful search; the
/// transcript only ever grows.
#[derive(Debug, Clone, Default)]
pub struct ConversationSession {
    current_context: Option<String>,
    transcript: Vec<Turn>,
    last_speech_event_id: Option<String>,
    consumed_speech_ids: HashSet<String>,
}

impl ConversationSession {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the current route fact.
    pub fn set_context(&mut self, text: impl Into<String>) {
        self.current_context = Some(text.into());
    }

    pub fn current_context(&self) -> Option<&str> {
        self.current_context.as_deref()
    }

    pub fn transcript(&self) -> &[Turn] {
        &self.transcript
    }

    pub fn last_speech_event_id(&self) -> Option<&str> {
        self.last_speech_event_id.as_deref()
    }

    pub fn append_turn(&mut self, role: Role, content: impl Into<String>) {
        self.transcript.push(Turn {
            role,
            content: content.into(),
        });
    }

    /// Prompt sent to the text generator for `user_input`.
    pub fn build_prompt(&self, user_input: &str, language: &str) -> String {
        format!(
            "Context: {}. User: {}. Answer short in {}.",
            self.current_context.as_deref().unwrap_or(""),
            user_input,
            language
        )
    }

    /// Pick the one input for this turn.
    ///
    /// Non-blank typed text wins. Otherwise a speech event that has not been
    /// consumed yet is transcribed. Every new speech event is marked consumed
    /// as soon as it is seen, whether or not it ends up supplying the input,
    /// so a redraw presenting it again is ignored. Returns `Err` only for an
    /// over-long typed message; `Ok(None)` means the turn has no input.
    pub async fn resolve_turn_input<T: TranscriptionService>(
        &mut self,
        typed: Option<&str>,
        speech: Option<&SpeechEvent>,
        transcriber: &T,
    ) -> Result<Option<TurnInput>, ChatError> {
        let fresh_speech = speech.filter(|event| self.consume_speech_event(event));

        match typed.map(validate_typed) {
            Some(Ok(text)) => {
                return Ok(Some(TurnInput {
                    text: text.to_string(),
                    source: InputSource::Typed,
                }))
            }
            Some(Err(ChatError::EmptyMessage)) | None => {}
            Some(Err(e)) => return Err(e),
        }

        let Some(event) = fresh_speech else {
            return Ok(None);
        };

        match transcriber.transcribe(&event.audio).await {
            Ok(transcript) => Ok(Some(TurnInput {
                text: transcript.text,
                source: InputSource::Speech,
            })),
            Err(e) => {
                tracing::warn!(event_id = %event.id, error = %e, "Speech transcription failed");
                Ok(None)
            }
        }
    }

    /// Record `event` as consumed. Returns `false` if any earlier turn of
    /// this session already consumed an event with the same id.
    fn consume_speech_event(&mut self, event: &SpeechEvent) -> bool {
        if !self.consumed_speech_ids.insert(event.id.clone()) {
            tracing::debug!(event_id = %event.id, "Speech event already consumed");
            return false;
        }
        self.last_speech_event_id = Some(event.id.clone());
        true
    }
}

fn validate_typed(text: &str) -> Result<&str, ChatError> {
    let text = text.trim();
    if text.is_empty() {
        return Err(ChatError::EmptyMessage);
    }
    if text.chars().count() > MAX_MESSAGE_LENGTH {
        return Err(ChatError::MessageTooLong(MAX_MESSAGE_LENGTH));
    }
    Ok(text)
}

// =============================================================================
// Route phrasing
// =============================================================================

/// One-line synopsis of a route, stored as the conversation context.
pub fn route_synopsis(route: &RouteSummary) -> String {
    format!(
        "Lộ trình: {}, hết {}. Đi bộ {}.",
        route.summary(),
        route.duration_text(),
        route.walking_text()
    )
}

/// Spoken call-to-action for the recommended route.
pub fn route_announcement(route: &RouteSummary) -> String {
    format!(
        "Hãy đón {}. Xe đến trong {} phút.",
        route.summary(),
        route.wait_minutes()
    )
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use busmate_speech::MockTranscriptionService;

    fn event(id: &str) -> SpeechEvent {
        SpeechEvent::new(id, b"RIFF-audio".to_vec())
    }

    #[test]
    fn test_new_session_is_empty() {
        let session = ConversationSession::new();
        assert!(session.current_context().is_none());
        assert!(session.transcript().is_empty());
        assert!(session.last_speech_event_id().is_none());
    }

    #[test]
    fn test_set_context_overwrites() {
        let mut session = ConversationSession::new();
        session.set_context("Lộ trình: Xe 08");
        session.set_context("Lộ trình: Xe 19");
        assert_eq!(session.current_context(), Some("Lộ trình: Xe 19"));

        let prompt = session.build_prompt("Mấy giờ xe tới?", "Vietnamese");
        assert!(prompt.contains("Xe 19"));
        assert!(!prompt.contains("Xe 08"));
    }

    #[test]
    fn test_build_prompt_without_context() {
        let session = ConversationSession::new();
        assert_eq!(
            session.build_prompt("Xin chào", "Vietnamese"),
            "Context: . User: Xin chào. Answer short in Vietnamese."
        );
    }

    #[test]
    fn test_build_prompt_with_context() {
        let mut session = ConversationSession::new();
        session.set_context("Lộ trình: Xe 08, hết 25 phút. Đi bộ 300m.");
        assert_eq!(
            session.build_prompt("Đi bộ bao xa?", "English"),
            "Context: Lộ trình: Xe 08, hết 25 phút. Đi bộ 300m.. User: Đi bộ bao xa?. Answer short in English."
        );
    }

    #[test]
    fn test_append_turn_keeps_arrival_order() {
        let mut session = ConversationSession::new();
        session.append_turn(Role::User, "một");
        session.append_turn(Role::Assistant, "hai");
        session.append_turn(Role::User, "ba");
        let contents: Vec<&str> = session.transcript().iter().map(|t| t.content.as_str()).collect();
        assert_eq!(contents, vec!["một", "hai", "ba"]);
        assert_eq!(session.transcript()[1].role, Role::Assistant);
    }

    #[tokio::test]
    async fn test_typed_text_wins() {
        let mut session = ConversationSession::new();
        let stt = MockTranscriptionService::with_text("giọng nói");
        let input = session
            .resolve_turn_input(Some("  gõ phím "), None, &stt)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(input.text, "gõ phím");
        assert_eq!(input.source, InputSource::Typed);
    }

    #[tokio::test]
    async fn test_typed_text_beats_speech_but_consumes_event() {
        let mut session = ConversationSession::new();
        let stt = MockTranscriptionService::with_text("giọng nói");
        let input = session
            .resolve_turn_input(Some("gõ phím"), Some(&event("mic-1")), &stt)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(input.source, InputSource::Typed);
        assert_eq!(session.last_speech_event_id(), Some("mic-1"));

        let again = session
            .resolve_turn_input(None, Some(&event("mic-1")), &stt)
            .await
            .unwrap();
        assert!(again.is_none());
    }

    #[tokio::test]
    async fn test_new_speech_event_is_transcribed() {
        let mut session = ConversationSession::new();
        let stt = MockTranscriptionService::with_text("xe 08 tới chưa");
        let input = session
            .resolve_turn_input(None, Some(&event("mic-1")), &stt)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(input.text, "xe 08 tới chưa");
        assert_eq!(input.source, InputSource::Speech);
    }

    #[tokio::test]
    async fn test_blank_typed_falls_back_to_speech() {
        let mut session = ConversationSession::new();
        let stt = MockTranscriptionService::with_text("từ micro");
        let input = session
            .resolve_turn_input(Some("   "), Some(&event("mic-1")), &stt)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(input.text, "từ micro");
    }

    #[tokio::test]
    async fn test_consumed_speech_event_is_never_reprocessed() {
        let mut session = ConversationSession::new();
        let stt = MockTranscriptionService::with_text("một lần");
        assert!(session
            .resolve_turn_input(None, Some(&event("mic-1")), &stt)
            .await
            .unwrap()
            .is_some());
        for _ in 0..3 {
            assert!(session
                .resolve_turn_input(None, Some(&event("mic-1")), &stt)
                .await
                .unwrap()
                .is_none());
        }
        assert!(session
            .resolve_turn_input(None, Some(&event("mic-2")), &stt)
            .await
            .unwrap()
            .is_some());
    }

    #[tokio::test]
    async fn test_earlier_speech_event_is_not_replayed_after_a_newer_one() {
        let mut session = ConversationSession::new();
        let stt = MockTranscriptionService::with_text("câu hỏi");
        for id in ["mic-a", "mic-b"] {
            assert!(session
                .resolve_turn_input(None, Some(&event(id)), &stt)
                .await
                .unwrap()
                .is_some());
        }
        assert!(session
            .resolve_turn_input(None, Some(&event("mic-a")), &stt)
            .await
            .unwrap()
            .is_none());
        assert_eq!(session.last_speech_event_id(), Some("mic-b"));
    }

    #[tokio::test]
    async fn test_failed_transcription_yields_no_input_and_consumes_event() {
        let mut session = ConversationSession::new();
        let stt = MockTranscriptionService::silent();
        let input = session
            .resolve_turn_input(None, Some(&event("mic-1")), &stt)
            .await
            .unwrap();
        assert!(input.is_none());
        assert_eq!(session.last_speech_event_id(), Some("mic-1"));
        assert!(session.transcript().is_empty());
    }

    #[tokio::test]
    async fn test_no_input_at_all() {
        let mut session = ConversationSession::new();
        let stt = MockTranscriptionService::new();
        assert!(session
            .resolve_turn_input(None, None, &stt)
            .await
            .unwrap()
            .is_none());
    }

    #[tokio::test]
    async fn test_over_long_typed_message_is_rejected() {
        let mut session = ConversationSession::new();
        let stt = MockTranscriptionService::new();
        let long = "a".repeat(MAX_MESSAGE_LENGTH + 1);
        let err = session
            .resolve_turn_input(Some(long.as_str()), None, &stt)
            .await
            .unwrap_err();
        assert!(matches!(err, ChatError::MessageTooLong(MAX_MESSAGE_LENGTH)));
    }
}
