//! Configuration for the echo server.
//!
//! Supports both command-line arguments and a TOML configuration file.
//! CLI arguments take precedence over config file values.

use anyhow::Context;
use clap::Parser;
use serde::Deserialize;
use std::path::PathBuf;
use std::time::Duration;

/// Command-line arguments for the echo server.
#[derive(Parser, Debug)]
#[command(name = "delayed-echo")]
#[command(version = "0.1.0")]
#[command(about = "WebSocket echo server with delayed binary replies", long_about = None)]
pub struct CliArgs {
    /// Path to TOML configuration file
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Address to bind to (e.g., 127.0.0.1:9001)
    #[arg(short, long)]
    pub listen: Option<String>,

    /// Working-buffer capacity in bytes; messages longer than this are
    /// rejected with a close frame
    #[arg(short = 'b', long)]
    pub buffer_capacity: Option<usize>,

    /// Classifier rule set
    #[arg(long, value_enum)]
    pub variant: Option<Variant>,

    /// Delay in milliseconds before echoing a binary message
    #[arg(long)]
    pub reply_delay_ms: Option<u64>,

    /// Whether to send a greeting text message right after the upgrade
    #[arg(long)]
    pub announce: Option<bool>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long)]
    pub log_level: Option<String>,
}

/// Classifier rule set selector.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum Variant {
    /// Command sentinels, rewritten text echo, delayed binary echo.
    Permissive,
    /// No sentinels; binary messages are rejected outright.
    Strict,
}

/// Per-session echo settings.
#[derive(Clone, Debug)]
pub struct Config {
    /// Working-buffer capacity; also the oversize threshold.
    pub buffer_capacity: usize,
    /// Active classifier rule set.
    pub variant: Variant,
    /// Delay applied before replying to a binary message.
    pub reply_delay: Duration,
    /// Send the unsolicited greeting after the upgrade (permissive only).
    pub announce_on_connect: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            buffer_capacity: default_buffer_capacity(),
            variant: Variant::Permissive,
            reply_delay: Duration::from_millis(default_reply_delay_ms()),
            announce_on_connect: true,
        }
    }
}

/// TOML configuration file structure.
#[derive(Debug, Deserialize, Default)]
pub struct TomlConfig {
    #[serde(default)]
    pub server: ServerSection,
    #[serde(default)]
    pub echo: EchoSection,
    #[serde(default)]
    pub logging: LoggingSection,
}

/// Server-related configuration.
#[derive(Debug, Deserialize)]
pub struct ServerSection {
    /// Address to bind to.
    #[serde(default = "default_listen")]
    pub listen: String,
}

impl Default for ServerSection {
    fn default() -> Self {
        Self {
            listen: default_listen(),
        }
    }
}

/// Echo policy configuration.
#[derive(Debug, Deserialize)]
pub struct EchoSection {
    #[serde(default = "default_buffer_capacity")]
    pub buffer_capacity: usize,
    #[serde(default = "default_variant")]
    pub variant: Variant,
    #[serde(default = "default_reply_delay_ms")]
    pub reply_delay_ms: u64,
    #[serde(default = "default_announce")]
    pub announce_on_connect: bool,
}

impl Default for EchoSection {
    fn default() -> Self {
        Self {
            buffer_capacity: default_buffer_capacity(),
            variant: default_variant(),
            reply_delay_ms: default_reply_delay_ms(),
            announce_on_connect: default_announce(),
        }
    }
}

/// Logging configuration.
#[derive(Debug, Deserialize)]
pub struct LoggingSection {
    #[serde(default = "default_log_level")]
    pub level: String,
}

impl Default for LoggingSection {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

/// Effective settings after merging CLI arguments over the file.
#[derive(Clone, Debug)]
pub struct Settings {
    pub listen: String,
    pub echo: Config,
    pub log_level: String,
}

impl Settings {
    /// Resolve effective settings from CLI arguments and the optional file.
    pub fn load(args: &CliArgs) -> crate::Result<Self> {
        let file = match &args.config {
            Some(path) => {
                let text = std::fs::read_to_string(path)
                    .with_context(|| format!("read config {}", path.display()))?;
                toml::from_str::<TomlConfig>(&text)
                    .with_context(|| format!("parse config {}", path.display()))?
            }
            None => TomlConfig::default(),
        };

        let echo = Config {
            buffer_capacity: args.buffer_capacity.unwrap_or(file.echo.buffer_capacity),
            variant: args.variant.unwrap_or(file.echo.variant),
            reply_delay: Duration::from_millis(
                args.reply_delay_ms.unwrap_or(file.echo.reply_delay_ms),
            ),
            announce_on_connect: args.announce.unwrap_or(file.echo.announce_on_connect),
        };

        Ok(Self {
            listen: args.listen.clone().unwrap_or(file.server.listen),
            echo,
            log_level: args.log_level.clone().unwrap_or(file.logging.level),
        })
    }
}

fn default_listen() -> String {
    "127.0.0.1:9001".to_string()
}

fn default_buffer_capacity() -> usize {
    64 * 1024
}

fn default_variant() -> Variant {
    Variant::Permissive
}

fn default_reply_delay_ms() -> u64 {
    25_000
}

fn default_announce() -> bool {
    true
}

fn default_log_level() -> String {
    "info".to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn no_args() -> CliArgs {
        CliArgs {
            config: None,
            listen: None,
            buffer_capacity: None,
            variant: None,
            reply_delay_ms: None,
            announce: None,
            log_level: None,
        }
    }

    #[test]
    fn defaults_without_file_or_flags() {
        let settings = Settings::load(&no_args()).unwrap();
        assert_eq!(settings.listen, "127.0.0.1:9001");
        assert_eq!(settings.echo.buffer_capacity, 64 * 1024);
        assert_eq!(settings.echo.variant, Variant::Permissive);
        assert_eq!(settings.echo.reply_delay, Duration::from_secs(25));
        assert!(settings.echo.announce_on_connect);
        assert_eq!(settings.log_level, "info");
    }

    #[test]
    fn cli_flags_override_defaults() {
        let args = CliArgs {
            listen: Some("0.0.0.0:9002".into()),
            buffer_capacity: Some(1024),
            variant: Some(Variant::Strict),
            reply_delay_ms: Some(100),
            announce: Some(false),
            ..no_args()
        };
        let settings = Settings::load(&args).unwrap();
        assert_eq!(settings.listen, "0.0.0.0:9002");
        assert_eq!(settings.echo.buffer_capacity, 1024);
        assert_eq!(settings.echo.variant, Variant::Strict);
        assert_eq!(settings.echo.reply_delay, Duration::from_millis(100));
        assert!(!settings.echo.announce_on_connect);
    }

    #[test]
    fn toml_sections_parse() {
        let file: TomlConfig = toml::from_str(
            r#"
            [server]
            listen = "127.0.0.1:8080"

            [echo]
            buffer_capacity = 1024
            variant = "strict"
            reply_delay_ms = 500
            announce_on_connect = false

            [logging]
            level = "debug"
            "#,
        )
        .unwrap();
        assert_eq!(file.server.listen, "127.0.0.1:8080");
        assert_eq!(file.echo.buffer_capacity, 1024);
        assert_eq!(file.echo.variant, Variant::Strict);
        assert_eq!(file.echo.reply_delay_ms, 500);
        assert!(!file.echo.announce_on_connect);
        assert_eq!(file.logging.level, "debug");
    }

    #[test]
    fn missing_sections_fall_back_to_defaults() {
        let file: TomlConfig = toml::from_str("[echo]\nvariant = \"strict\"\n").unwrap();
        assert_eq!(file.echo.variant, Variant::Strict);
        assert_eq!(file.echo.buffer_capacity, 64 * 1024);
        assert_eq!(file.server.listen, "127.0.0.1:9001");
    }
}
