//! Mochi Island CLI - a dynamic-island virtual pet in your terminal.

mod render;

use std::sync::Arc;

use anyhow::Context;
use chrono::Local;
use clap::Parser;
use mochi_island_core::{
    Event, GeminiProvider, Island, IslandConfig, IslandState, ProviderConfig,
};
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing_subscriber::EnvFilter;

/// Mochi Island - a pixel cat living in a dynamic island.
///
/// Mochi gets hungry and bored over time. Tap the island to open it, then
/// feed Mochi, play with it, or chat. Replies come from Gemini when an API
/// key is configured.
#[derive(Parser, Debug)]
#[command(name = "mochi-island")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Gemini API key.
    ///
    /// Without a key Mochi still answers, just with a placeholder.
    #[arg(long = "api-key", env = "GEMINI_API_KEY", hide_env_values = true)]
    pub api_key: Option<String>,

    /// Model used for replies.
    #[arg(short = 'm', long = "model", default_value = "gemini-2.5-flash")]
    pub model: String,

    /// Override the Gemini API base URL.
    #[arg(long = "base-url")]
    pub base_url: Option<String>,

    /// Decay/idle tick period in milliseconds.
    #[arg(long = "tick-ms", default_value = "2000")]
    pub tick_ms: u64,

    /// How long eating and playing last, in milliseconds.
    #[arg(long = "revert-ms", default_value = "2000")]
    pub revert_ms: u64,

    /// Seed for idle animations, for reproducible sessions.
    #[arg(long = "seed")]
    pub seed: Option<u64>,

    /// Enable verbose logging.
    #[arg(short = 'v', long = "verbose")]
    pub verbose: bool,
}

impl Cli {
    /// Convert CLI arguments to an IslandConfig.
    pub fn island_config(&self) -> IslandConfig {
        let mut config = IslandConfig::new()
            .tick_ms(self.tick_ms)
            .revert_ms(self.revert_ms);

        if let Some(seed) = self.seed {
            config = config.idle_seed(seed);
        }

        config
    }

    /// Convert CLI arguments to a ProviderConfig.
    pub fn provider_config(&self) -> ProviderConfig {
        let mut config = ProviderConfig::new().model(&self.model);

        if let Some(ref key) = self.api_key {
            config = config.api_key(key);
        }

        if let Some(ref url) = self.base_url {
            config = config.base_url(url);
        }

        config
    }
}

/// A line typed by the user.
#[derive(Debug, Clone, PartialEq, Eq)]
enum Command {
    Tap,
    Expand,
    Collapse,
    Feed,
    Play,
    Say(String),
    Status,
    Json,
    Help,
    Quit,
    Unknown(String),
    Nothing,
}

/// Parse one input line. While expanded, unrecognised text is chat.
fn parse_command(line: &str, expanded: bool) -> Command {
    let trimmed = line.trim();
    let (word, rest) = match trimmed.split_once(char::is_whitespace) {
        Some((word, rest)) => (word, rest),
        None => (trimmed, ""),
    };

    match word.to_ascii_lowercase().as_str() {
        "" => Command::Nothing,
        "tap" => Command::Tap,
        "expand" | "open" => Command::Expand,
        "collapse" | "close" => Command::Collapse,
        "feed" => Command::Feed,
        "play" => Command::Play,
        "say" => Command::Say(rest.to_string()),
        "status" => Command::Status,
        "json" => Command::Json,
        "help" | "?" => Command::Help,
        "quit" | "exit" => Command::Quit,
        _ if expanded => Command::Say(line.to_string()),
        _ => Command::Unknown(word.to_string()),
    }
}

const HELP: &str = "commands: tap, expand, collapse, feed, play, say <text>, status, json, help, quit\n\
                    while the island is open, any other text is sent to the pet";

fn init_tracing(verbose: bool) {
    let default = if verbose {
        "mochi_island=debug,mochi_island_core=debug"
    } else {
        "warn"
    };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default)),
        )
        .with_writer(std::io::stderr)
        .init();
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let provider =
        GeminiProvider::new(cli.provider_config()).context("failed to build HTTP client")?;
    let pet_name = provider.config().pet_name.clone();
    if !provider.config().has_api_key() {
        tracing::warn!("no API key configured; {} will answer with a placeholder", pet_name);
    }

    let (mut island, mut events) = Island::spawn(cli.island_config(), Arc::new(provider))
        .context("invalid island configuration")?;

    println!("{}\n", render::lock_screen(&Local::now()));
    println!("{}", render::island(&island.snapshot(), &pet_name));

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        tokio::select! {
            line = lines.next_line() => {
                let Some(line) = line.context("failed to read stdin")? else {
                    break;
                };
                let expanded = island.island_state() == IslandState::Expanded;
                match parse_command(&line, expanded) {
                    Command::Nothing => {}
                    Command::Tap => {
                        island.toggle();
                        println!("{}", render::island(&island.snapshot(), &pet_name));
                    }
                    Command::Expand => {
                        island.expand();
                        println!("{}", render::island(&island.snapshot(), &pet_name));
                    }
                    Command::Collapse => {
                        island.collapse();
                        println!("{}", render::island(&island.snapshot(), &pet_name));
                    }
                    Command::Feed => {
                        island.feed();
                        println!("{}", render::island(&island.snapshot(), &pet_name));
                    }
                    Command::Play => {
                        island.play();
                        println!("{}", render::island(&island.snapshot(), &pet_name));
                    }
                    Command::Say(text) => {
                        if island.send_message(&text).is_some() {
                            println!("{} is typing...", pet_name);
                        }
                    }
                    Command::Status => {
                        println!("{}\n", render::lock_screen(&Local::now()));
                        println!("{}", render::island(&island.snapshot(), &pet_name));
                    }
                    Command::Json => {
                        println!("{}", serde_json::to_string_pretty(&island.snapshot())?);
                    }
                    Command::Help => println!("{}", HELP),
                    Command::Quit => break,
                    Command::Unknown(word) => {
                        println!("unknown command '{}' (tap the island to chat, 'help' for more)", word);
                    }
                }
            }
            Some(event) = events.recv() => match event {
                Event::MessageAppended { message } if !message.is_from_user() => {
                    println!("{}", render::transcript_line(&message, &pet_name));
                }
                other => tracing::debug!("{}", other),
            },
        }
    }

    island.shutdown();
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_gestures() {
        assert_eq!(parse_command("tap", false), Command::Tap);
        assert_eq!(parse_command("  FEED ", true), Command::Feed);
        assert_eq!(parse_command("play", true), Command::Play);
        assert_eq!(parse_command("open", false), Command::Expand);
        assert_eq!(parse_command("close", true), Command::Collapse);
        assert_eq!(parse_command("", true), Command::Nothing);
        assert_eq!(parse_command("quit", true), Command::Quit);
    }

    #[test]
    fn test_parse_chat() {
        assert_eq!(
            parse_command("say  hello there", false),
            Command::Say(" hello there".to_string())
        );
        assert_eq!(
            parse_command("hello there", true),
            Command::Say("hello there".to_string())
        );
        assert_eq!(
            parse_command("hello there", false),
            Command::Unknown("hello".to_string())
        );
    }

    #[test]
    fn test_cli_to_configs() {
        let cli = Cli::parse_from([
            "mochi-island",
            "--api-key",
            "k",
            "--tick-ms",
            "500",
            "--seed",
            "3",
            "--base-url",
            "http://localhost:1234",
        ]);

        let island = cli.island_config();
        assert_eq!(island.tick_period.as_millis(), 500);
        assert_eq!(island.idle_seed, Some(3));

        let provider = cli.provider_config();
        assert_eq!(provider.api_key.as_deref(), Some("k"));
        assert_eq!(
            provider.endpoint(),
            "http://localhost:1234/models/gemini-2.5-flash:generateContent"
        );
    }
}
