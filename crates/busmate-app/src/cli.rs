//! CLI argument definitions and interactive command parsing for Busmate.
//!
//! Priority resolution: CLI args > env vars > config file > defaults.

use clap::Parser;
use std::path::PathBuf;

/// Busmate: a bus route assistant that ranks transit options and answers
/// questions about the recommended route.
#[derive(Parser, Debug)]
#[command(name = "busmate", version, about)]
pub struct CliArgs {
    /// Path to the configuration file.
    #[arg(short = 'c', long = "config")]
    pub config: Option<PathBuf>,

    /// Log level (trace, debug, info, warn, error).
    #[arg(short = 'l', long = "log-level")]
    pub log_level: Option<String>,

    /// Ranking criterion (shortest time, least walking, fewest transfers).
    #[arg(long = "criterion")]
    pub criterion: Option<String>,

    /// Do not synthesize spoken announcements or replies.
    #[arg(long = "no-speak")]
    pub no_speak: bool,

    /// Never call remote providers.
    #[arg(long = "offline")]
    pub offline: bool,
}

impl CliArgs {
    /// Resolve the configuration file path.
    ///
    /// Priority: --config flag > BUSMATE_CONFIG env var > ~/.busmate/config.toml.
    pub fn resolve_config_path(&self) -> PathBuf {
        if let Some(ref p) = self.config {
            return p.clone();
        }
        if let Ok(p) = std::env::var("BUSMATE_CONFIG") {
            return PathBuf::from(p);
        }
        default_config_path()
    }

    /// Resolve the log level. RUST_LOG, when set, still overrides this.
    ///
    /// Priority: --log-level flag > config file value.
    pub fn resolve_log_level(&self, config_level: &str) -> String {
        self.log_level
            .clone()
            .unwrap_or_else(|| config_level.to_string())
    }

    /// Resolve the ranking criterion name.
    ///
    /// Priority: --criterion flag > config file value.
    pub fn resolve_criterion<'a>(&'a self, config_criterion: &'a str) -> &'a str {
        self.criterion.as_deref().unwrap_or(config_criterion)
    }

    /// Whether spoken output is on, given the config setting.
    pub fn resolve_auto_speak(&self, config_auto_speak: bool) -> bool {
        config_auto_speak && !self.no_speak
    }
}

/// Default config file path for the current platform.
fn default_config_path() -> PathBuf {
    #[cfg(target_os = "windows")]
    if let Ok(home) = std::env::var("USERPROFILE") {
        return PathBuf::from(home).join(".busmate").join("config.toml");
    }
    #[cfg(not(target_os = "windows"))]
    if let Ok(home) = std::env::var("HOME") {
        return PathBuf::from(home).join(".busmate").join("config.toml");
    }
    PathBuf::from("config.toml")
}

// =============================================================================
// Interactive commands
// =============================================================================

/// One line of interactive input.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// `/search <origin> -> <destination>`
    Search { origin: String, destination: String },
    /// `/criterion <name>`
    Criterion(String),
    /// `/voice <wav-path>`
    Voice(PathBuf),
    /// `/history`
    History,
    /// `/quit`
    Quit,
    /// Anything that is not a command is a typed chat message.
    Chat(String),
    /// Blank line.
    Empty,
    /// A recognised command with bad arguments; carries the usage line.
    Usage(&'static str),
}

const SEARCH_USAGE: &str = "/search <origin> -> <destination>";
const CRITERION_USAGE: &str = "/criterion <shortest time|least walking|fewest transfers>";
const VOICE_USAGE: &str = "/voice <wav-path>";

impl Command {
    pub fn parse(line: &str) -> Self {
        let line = line.trim();
        if line.is_empty() {
            return Command::Empty;
        }
        if !line.starts_with('/') {
            return Command::Chat(line.to_string());
        }

        let (name, rest) = match line.split_once(char::is_whitespace) {
            Some((name, rest)) => (name, rest.trim()),
            None => (line, ""),
        };

        match name {
            "/search" => match rest.split_once("->") {
                Some((origin, destination)) => Command::Search {
                    origin: origin.trim().to_string(),
                    destination: destination.trim().to_string(),
                },
                None => Command::Usage(SEARCH_USAGE),
            },
            "/criterion" if !rest.is_empty() => Command::Criterion(rest.to_string()),
            "/criterion" => Command::Usage(CRITERION_USAGE),
            "/voice" if !rest.is_empty() => Command::Voice(PathBuf::from(rest)),
            "/voice" => Command::Usage(VOICE_USAGE),
            "/history" => Command::History,
            "/quit" | "/exit" => Command::Quit,
            _ => Command::Chat(line.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(argv: &[&str]) -> CliArgs {
        CliArgs::parse_from(std::iter::once("busmate").chain(argv.iter().copied()))
    }

    #[test]
    fn test_flags_parse() {
        let a = args(&["--config", "/tmp/b.toml", "--criterion", "least walking", "--no-speak", "--offline"]);
        assert_eq!(a.config, Some(PathBuf::from("/tmp/b.toml")));
        assert_eq!(a.criterion.as_deref(), Some("least walking"));
        assert!(a.no_speak);
        assert!(a.offline);
    }

    #[test]
    fn test_explicit_config_path_wins() {
        let a = args(&["-c", "/etc/busmate.toml"]);
        assert_eq!(a.resolve_config_path(), PathBuf::from("/etc/busmate.toml"));
    }

    #[test]
    fn test_log_level_priority() {
        assert_eq!(args(&["-l", "debug"]).resolve_log_level("info"), "debug");
        assert_eq!(args(&[]).resolve_log_level("warn"), "warn");
    }

    #[test]
    fn test_criterion_and_speak_priority() {
        let a = args(&["--criterion", "fewest transfers"]);
        assert_eq!(a.resolve_criterion("shortest time"), "fewest transfers");
        assert_eq!(args(&[]).resolve_criterion("least walking"), "least walking");
        assert!(!args(&["--no-speak"]).resolve_auto_speak(true));
        assert!(args(&[]).resolve_auto_speak(true));
        assert!(!args(&[]).resolve_auto_speak(false));
    }

    #[test]
    fn test_parse_search() {
        assert_eq!(
            Command::parse("/search Bến Thành -> Chợ Lớn"),
            Command::Search {
                origin: "Bến Thành".to_string(),
                destination: "Chợ Lớn".to_string(),
            }
        );
        assert_eq!(Command::parse("/search Bến Thành"), Command::Usage(SEARCH_USAGE));
    }

    #[test]
    fn test_parse_search_keeps_blank_side() {
        // The assistant decides what to do with a blank field.
        assert_eq!(
            Command::parse("/search  -> Chợ Lớn"),
            Command::Search {
                origin: String::new(),
                destination: "Chợ Lớn".to_string(),
            }
        );
    }

    #[test]
    fn test_parse_other_commands() {
        assert_eq!(
            Command::parse("/criterion least walking"),
            Command::Criterion("least walking".to_string())
        );
        assert_eq!(Command::parse("/criterion"), Command::Usage(CRITERION_USAGE));
        assert_eq!(
            Command::parse("/voice rec/hoi.wav"),
            Command::Voice(PathBuf::from("rec/hoi.wav"))
        );
        assert_eq!(Command::parse("/voice"), Command::Usage(VOICE_USAGE));
        assert_eq!(Command::parse("/history"), Command::History);
        assert_eq!(Command::parse("/quit"), Command::Quit);
    }

    #[test]
    fn test_plain_text_is_chat() {
        assert_eq!(
            Command::parse("  Xe nào tới trước?  "),
            Command::Chat("Xe nào tới trước?".to_string())
        );
        assert_eq!(Command::parse("/unknown thing"), Command::Chat("/unknown thing".to_string()));
        assert_eq!(Command::parse("   "), Command::Empty);
    }
}
