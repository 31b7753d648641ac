//! Busmate application binary - composition root.
//!
//! 1. Parse CLI flags and load configuration from TOML
//! 2. Initialize tracing
//! 3. Choose live or offline providers
//! 4. Run the interactive search / chat loop on stdin

mod cli;

use std::path::{Path, PathBuf};

use clap::Parser;
use tokio::io::{AsyncBufReadExt, BufReader};

use busmate_chat::{
    AssistantSettings, ConversationSession, EchoGenerator, GeminiClient, Role, SearchOutcome,
    TextGenerator, TransitAssistant, TurnOutcome,
};
use busmate_core::config::{AssistantConfig, BusmateConfig, DirectionsConfig, SpeechConfig};
use busmate_route::{
    Criterion, DirectionsProvider, FileDirections, GoogleDirectionsClient, RouteSummary,
    StaticDirections,
};
use busmate_speech::{GoogleSpeechClient, GoogleTtsClient, SpeechAudio, SpeechEvent};

use cli::{CliArgs, Command};

type Assistant = TransitAssistant<
    Box<dyn DirectionsProvider>,
    Box<dyn TextGenerator>,
    Option<GoogleSpeechClient>,
    Option<GoogleTtsClient>,
>;

/// Pick the directions source: saved replay > live API > unavailable.
fn directions_provider(config: &DirectionsConfig, offline: bool) -> Box<dyn DirectionsProvider> {
    if let Some(ref path) = config.replay_file {
        tracing::info!(path = %path, "Replaying saved directions");
        return Box::new(FileDirections::new(path));
    }
    if offline {
        tracing::info!("Offline mode: route search disabled (set directions.replay_file to replay)");
        return Box::new(StaticDirections::failure("offline mode"));
    }
    match GoogleDirectionsClient::from_env(config.clone()) {
        Ok(client) => Box::new(client),
        Err(e) => {
            tracing::warn!(error = %e, "Directions API unavailable, route search disabled");
            Box::new(StaticDirections::failure(e.to_string()))
        }
    }
}

/// Pick the text generator: Gemini when a key is present, echo otherwise.
fn text_generator(config: &AssistantConfig, offline: bool) -> Box<dyn TextGenerator> {
    if offline {
        return Box::new(EchoGenerator);
    }
    match GeminiClient::from_env(config.clone()) {
        Ok(client) => {
            tracing::info!(model = %config.model, "Text generator ready");
            Box::new(client)
        }
        Err(e) => {
            tracing::warn!(error = %e, "Text generator unavailable, using offline echo");
            Box::new(EchoGenerator)
        }
    }
}

/// Speech recognition needs an API key; without one `/voice` is refused.
fn speech_recognizer(config: &SpeechConfig, offline: bool) -> Option<GoogleSpeechClient> {
    if offline {
        return None;
    }
    match GoogleSpeechClient::from_env(config) {
        Ok(client) => {
            tracing::info!(language = %client.language(), "Speech recognition ready");
            Some(client)
        }
        Err(e) => {
            tracing::warn!(error = %e, "Speech recognition unavailable, /voice disabled");
            None
        }
    }
}

/// Spoken output needs the network only.
fn speech_synthesizer(config: &SpeechConfig, offline: bool) -> Option<GoogleTtsClient> {
    if offline {
        tracing::info!("Offline mode: spoken output disabled");
        return None;
    }
    Some(GoogleTtsClient::new(config))
}

/// File the latest spoken audio is written to.
fn audio_output_path(config: &SpeechConfig) -> PathBuf {
    match config.output_file {
        Some(ref path) => PathBuf::from(path),
        None => std::env::temp_dir().join("busmate-speech.mp3"),
    }
}

fn print_routes(routes: &[RouteSummary]) {
    for (i, route) in routes.iter().enumerate() {
        println!(
            "  {}. {} | {} | đi bộ {} | {} chuyến | chờ {} phút",
            i + 1,
            route.summary(),
            route.duration_text(),
            route.walking_text(),
            route.transfer_count(),
            route.wait_minutes()
        );
    }
}

async fn save_audio(path: &Path, audio: &Option<SpeechAudio>) {
    let Some(audio) = audio else {
        return;
    };
    match tokio::fs::write(path, &audio.bytes).await {
        Ok(()) => println!("  [{}: {}]", audio.format.mime_type(), path.display()),
        Err(e) => tracing::warn!(path = %path.display(), error = %e, "Cannot write speech audio"),
    }
}

async fn print_turn(outcome: &TurnOutcome, audio_path: &Path) {
    match outcome {
        TurnOutcome::NoInput => println!("(không nhận được nội dung)"),
        TurnOutcome::Rejected(e) => println!("! {}", e),
        TurnOutcome::ProviderFailure { error, .. } => println!("! {}", error),
        TurnOutcome::Replied { reply, audio, .. } => {
            println!("{}", reply);
            save_audio(audio_path, audio).await;
        }
    }
}

async fn read_speech_event(path: &Path) -> std::io::Result<SpeechEvent> {
    let audio = tokio::fs::read(path).await?;
    Ok(SpeechEvent::new(uuid::Uuid::new_v4().to_string(), audio))
}

/// Interactive loop. Turns run strictly one after another.
async fn run(
    assistant: Assistant,
    mut criterion: Criterion,
    audio_path: PathBuf,
) -> std::io::Result<()> {
    let mut session = ConversationSession::new();
    let mut lines = BufReader::new(tokio::io::stdin()).lines();

    println!("Busmate ({}). /search <từ> -> <đến>, /criterion, /voice, /history, /quit", criterion);

    while let Some(line) = lines.next_line().await? {
        match Command::parse(&line) {
            Command::Empty => {}
            Command::Quit => break,
            Command::Usage(usage) => println!("usage: {}", usage),
            Command::Search {
                origin,
                destination,
            } => {
                let outcome = assistant
                    .search(&mut session, &origin, &destination, criterion)
                    .await;
                match &outcome {
                    SearchOutcome::Skipped => println!("Nhập điểm đi và điểm đến."),
                    SearchOutcome::Found {
                        routes,
                        announcement,
                    } => {
                        println!("{}", outcome.status_message());
                        print_routes(routes);
                        save_audio(&audio_path, announcement).await;
                    }
                    _ => println!("{}", outcome.status_message()),
                }
            }
            Command::Criterion(name) => match name.parse::<Criterion>() {
                Ok(c) => {
                    criterion = c;
                    println!("Tiêu chí: {}", criterion);
                }
                Err(e) => println!("! {}", e),
            },
            Command::Voice(_) if assistant.transcriber().is_none() => {
                println!("! Nhận dạng giọng nói chưa được cấu hình.");
            }
            Command::Voice(path) => match read_speech_event(&path).await {
                Ok(event) => {
                    let outcome = assistant.chat_turn(&mut session, None, Some(&event)).await;
                    print_turn(&outcome, &audio_path).await;
                }
                Err(e) => {
                    tracing::warn!(path = %path.display(), error = %e, "Cannot read recording");
                    println!("! {}: {}", path.display(), e);
                }
            },
            Command::History => {
                for turn in session.transcript() {
                    let who = match turn.role {
                        Role::User => "bạn",
                        Role::Assistant => "busmate",
                    };
                    println!("  {}: {}", who, turn.content);
                }
            }
            Command::Chat(text) => {
                let outcome = assistant.chat_turn(&mut session, Some(text.as_str()), None).await;
                print_turn(&outcome, &audio_path).await;
            }
        }
    }

    tracing::info!(turns = session.transcript().len(), "Session ended");
    Ok(())
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = CliArgs::parse();

    // Config is read before tracing exists, so its outcome is logged afterwards.
    let config_file = args.resolve_config_path();
    let (config, load_error) = match BusmateConfig::load(&config_file) {
        Ok(config) => (config, None),
        Err(e) => (BusmateConfig::default(), Some(e)),
    };

    // Tracing. RUST_LOG > --log-level > config.
    let level = args.resolve_log_level(&config.general.log_level);
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&level)),
        )
        .with_writer(std::io::stderr)
        .init();

    tracing::info!("Starting Busmate v{}", env!("CARGO_PKG_VERSION"));
    match load_error {
        None => tracing::info!(path = %config_file.display(), "Configuration loaded"),
        Some(e) => tracing::warn!(
            path = %config_file.display(),
            error = %e,
            "Failed to load config, using defaults"
        ),
    }

    let criterion = match args
        .resolve_criterion(&config.general.default_criterion)
        .parse::<Criterion>()
    {
        Ok(c) => c,
        Err(e) => {
            tracing::warn!(error = %e, "Unknown criterion, using default");
            Criterion::default()
        }
    };

    let synthesizer = speech_synthesizer(&config.speech, args.offline);
    let settings = AssistantSettings {
        auto_speak: args.resolve_auto_speak(config.general.auto_speak) && synthesizer.is_some(),
        ..AssistantSettings::from(&config)
    };

    let assistant: Assistant = TransitAssistant::new(
        directions_provider(&config.directions, args.offline),
        text_generator(&config.assistant, args.offline),
        speech_recognizer(&config.speech, args.offline),
        synthesizer,
        settings,
    );

    run(assistant, criterion, audio_output_path(&config.speech)).await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_offline_disables_speech_backends() {
        let config = SpeechConfig::default();
        assert!(speech_recognizer(&config, true).is_none());
        assert!(speech_synthesizer(&config, true).is_none());
    }

    #[test]
    fn test_synthesizer_uses_configured_language() {
        let config = SpeechConfig {
            synthesis_language: "en".to_string(),
            ..SpeechConfig::default()
        };
        let synthesizer = speech_synthesizer(&config, false).expect("online synthesizer");
        assert_eq!(synthesizer.language(), "en");
    }

    #[test]
    fn test_recognizer_without_key_is_disabled() {
        let config = SpeechConfig {
            api_key_env: "BUSMATE_TEST_SPEECH_KEY_THAT_IS_NEVER_SET".to_string(),
            ..SpeechConfig::default()
        };
        assert!(speech_recognizer(&config, false).is_none());
    }

    #[test]
    fn test_audio_output_path() {
        let config = SpeechConfig {
            output_file: Some("/tmp/reply.mp3".to_string()),
            ..SpeechConfig::default()
        };
        assert_eq!(audio_output_path(&config), PathBuf::from("/tmp/reply.mp3"));
        assert_eq!(
            audio_output_path(&SpeechConfig::default()),
            std::env::temp_dir().join("busmate-speech.mp3")
        );
    }
}
