//! Transit assistant: central coordinator wiring directions, ranking,
//! context and the speech/text providers.
//!
//! Every handler runs one turn to completion. Provider failures are turned
//! into outcome variants here and never escape to the caller.

use busmate_core::config::BusmateConfig;
use busmate_route::{Clock, Criterion, DirectionsProvider, RouteAnalyzer, RouteSummary, SystemClock};
use busmate_speech::{synthesize_or_silence, SpeechAudio, SpeechEvent, SpeechSynthesizer, TranscriptionService};
use tracing::{debug, info, warn};

use crate::context::{route_announcement, route_synopsis, ConversationSession, Role, TurnInput};
use crate::error::ChatError;
use crate::llm::TextGenerator;

/// Status shown when the directions lookup fails.
const DIRECTIONS_UNAVAILABLE: &str = "Hệ thống đang bảo trì hoặc quá tải.";
/// Status shown when no route survives analysis.
const NO_ROUTES: &str = "Không tìm thấy tuyến xe nào.";

/// Behaviour switches for the assistant.
#[derive(Debug, Clone)]
pub struct AssistantSettings {
    /// Speak the recommended route and every reply.
    pub auto_speak: bool,
    /// Language the generator is asked to answer in.
    pub reply_language: String,
}

impl Default for AssistantSettings {
    fn default() -> Self {
        Self::from(&BusmateConfig::default())
    }
}

impl From<&BusmateConfig> for AssistantSettings {
    fn from(config: &BusmateConfig) -> Self {
        Self {
            auto_speak: config.general.auto_speak,
            reply_language: config.assistant.reply_language.clone(),
        }
    }
}

// =============================================================================
// Outcomes
// =============================================================================

/// Result of one route search.
#[derive(Debug)]
pub enum SearchOutcome {
    /// Origin or destination was blank; nothing was looked up.
    Skipped,
    /// The directions provider failed.
    ProviderFailure { message: String },
    /// The provider answered but no usable route came out of it.
    NoRoutes,
    /// Ranked routes, best first, plus the spoken recommendation if enabled.
    Found {
        routes: Vec<RouteSummary>,
        announcement: Option<SpeechAudio>,
    },
}

impl SearchOutcome {
    pub fn best(&self) -> Option<&RouteSummary> {
        match self {
            SearchOutcome::Found { routes, .. } => routes.first(),
            _ => None,
        }
    }

    /// Human-readable status line for the front end.
    pub fn status_message(&self) -> String {
        match self {
            SearchOutcome::Skipped => String::new(),
            SearchOutcome::ProviderFailure { message } => message.clone(),
            SearchOutcome::NoRoutes => NO_ROUTES.to_string(),
            SearchOutcome::Found { routes, .. } => routes
                .first()
                .map(|best| format!("Nên đi: {}", best.summary()))
                .unwrap_or_else(|| NO_ROUTES.to_string()),
        }
    }
}

/// Result of one chat turn.
#[derive(Debug)]
pub enum TurnOutcome {
    /// Neither channel produced input; the transcript is unchanged.
    NoInput,
    /// The typed message was refused before reaching the generator.
    Rejected(ChatError),
    /// The user turn was recorded but the generator failed.
    ProviderFailure { input: TurnInput, error: ChatError },
    /// Both turns were recorded.
    Replied {
        input: TurnInput,
        reply: String,
        audio: Option<SpeechAudio>,
    },
}

// =============================================================================
// TransitAssistant
// =============================================================================

/// Coordinates a search → context → chat session over pluggable providers.
pub struct TransitAssistant<D, G, T, S, C = SystemClock> {
    directions: D,
    generator: G,
    transcriber: T,
    synthesizer: S,
    analyzer: RouteAnalyzer<C>,
    settings: AssistantSettings,
}

impl<D, G, T, S> TransitAssistant<D, G, T, S, SystemClock>
where
    D: DirectionsProvider,
    G: TextGenerator,
    T: TranscriptionService,
    S: SpeechSynthesizer,
{
    pub fn new(
        directions: D,
        generator: G,
        transcriber: T,
        synthesizer: S,
        settings: AssistantSettings,
    ) -> Self {
        Self {
            directions,
            generator,
            transcriber,
            synthesizer,
            analyzer: RouteAnalyzer::new(),
            settings,
        }
    }
}

impl<D, G, T, S, C> TransitAssistant<D, G, T, S, C>
where
    D: DirectionsProvider,
    G: TextGenerator,
    T: TranscriptionService,
    S: SpeechSynthesizer,
    C: Clock,
{
    /// Replace the clock used for departure time and wait computation.
    pub fn with_clock<C2: Clock>(self, clock: C2) -> TransitAssistant<D, G, T, S, C2> {
        TransitAssistant {
            directions: self.directions,
            generator: self.generator,
            transcriber: self.transcriber,
            synthesizer: self.synthesizer,
            analyzer: RouteAnalyzer::with_clock(clock),
            settings: self.settings,
        }
    }

    pub fn directions(&self) -> &D {
        &self.directions
    }

    pub fn generator(&self) -> &G {
        &self.generator
    }

    pub fn transcriber(&self) -> &T {
        &self.transcriber
    }

    pub fn settings(&self) -> &AssistantSettings {
        &self.settings
    }

    pub fn set_auto_speak(&mut self, enabled: bool) {
        self.settings.auto_speak = enabled;
    }

    /// Look up, rank and remember the best route from `origin` to
    /// `destination`.
    ///
    /// On success the session context is replaced by the best route's
    /// synopsis. Any other outcome leaves the context untouched.
    pub async fn search(
        &self,
        session: &mut ConversationSession,
        origin: &str,
        destination: &str,
        criterion: Criterion,
    ) -> SearchOutcome {
        let (origin, destination) = (origin.trim(), destination.trim());
        if origin.is_empty() || destination.is_empty() {
            debug!("Search skipped: origin or destination missing");
            return SearchOutcome::Skipped;
        }

        let departure = self.analyzer.clock().now();
        let raw_routes = match self
            .directions
            .directions(origin, destination, departure)
            .await
        {
            Ok(routes) => routes,
            Err(e) => {
                warn!(error = %e, origin, destination, "Directions lookup failed");
                return SearchOutcome::ProviderFailure {
                    message: format!("{} ({})", DIRECTIONS_UNAVAILABLE, e),
                };
            }
        };

        let routes = self.analyzer.analyze(&raw_routes, criterion);
        let Some(best) = routes.first() else {
            info!(origin, destination, "No route found");
            return SearchOutcome::NoRoutes;
        };

        session.set_context(route_synopsis(best));
        info!(
            best = best.summary(),
            wait_minutes = best.wait_minutes(),
            alternatives = routes.len(),
            %criterion,
            "Route recommended"
        );

        let announcement = if self.settings.auto_speak {
            synthesize_or_silence(&self.synthesizer, &route_announcement(best)).await
        } else {
            None
        };

        SearchOutcome::Found {
            routes,
            announcement,
        }
    }

    /// Run one chat turn from whichever input channel wins.
    pub async fn chat_turn(
        &self,
        session: &mut ConversationSession,
        typed: Option<&str>,
        speech: Option<&SpeechEvent>,
    ) -> TurnOutcome {
        let input = match session
            .resolve_turn_input(typed, speech, &self.transcriber)
            .await
        {
            Ok(Some(input)) => input,
            Ok(None) => return TurnOutcome::NoInput,
            Err(e) => {
                debug!(error = %e, "Typed message rejected");
                return TurnOutcome::Rejected(e);
            }
        };

        session.append_turn(Role::User, input.text.clone());
        let prompt = session.build_prompt(&input.text, &self.settings.reply_language);

        match self.generator.generate(&prompt).await {
            Ok(reply) => {
                session.append_turn(Role::Assistant, reply.clone());
                info!(source = ?input.source, reply_len = reply.len(), "Assistant replied");

                let audio = if self.settings.auto_speak {
                    synthesize_or_silence(&self.synthesizer, &reply).await
                } else {
                    None
                };
                TurnOutcome::Replied {
                    input,
                    reply,
                    audio,
                }
            }
            Err(e) => {
                warn!(error = %e, "Text generation failed");
                TurnOutcome::ProviderFailure {
                    input,
                    error: e.into(),
                }
            }
        }
    }
}
