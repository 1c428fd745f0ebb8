//! Core configuration types and loading.

use serde::Deserialize;
use std::path::Path;
use thiserror::Error;

use super::limits::{NetworkConfig, OutputConfig};
use super::security::RateLimitConfig;

/// Configuration errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file: {0}")]
    Io(#[from] std::io::Error),
    #[error("failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),
}

/// Bot configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    /// Bot identity and trigger.
    pub bot: BotConfig,
    /// IRC server to connect to.
    pub server: ServerConfig,
    /// Command rate limits.
    #[serde(default)]
    pub rate_limits: RateLimitConfig,
    /// Reply batching limits.
    #[serde(default)]
    pub output: OutputConfig,
    /// Outbound line pacing.
    #[serde(default)]
    pub network: NetworkConfig,
    /// Module manifest.
    #[serde(default)]
    pub modules: ModulesConfig,
    /// Database configuration.
    #[serde(default)]
    pub database: DatabaseConfig,
    /// Cached headline feed; without it `headlines` has nothing to show.
    pub headlines: Option<HeadlinesConfig>,
    /// Prometheus metrics HTTP port. `0` or unset disables the endpoint.
    pub metrics_port: Option<u16>,
}

impl Config {
    /// Load configuration from a TOML file.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        let config: Config = toml::from_str(&content)?;
        Ok(config)
    }
}

/// Bot identity configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct BotConfig {
    /// Nickname (e.g., "slircbot").
    pub nick: String,
    /// Username sent in USER (defaults to the nick).
    pub username: Option<String>,
    /// Realname sent in USER.
    #[serde(default = "default_realname")]
    pub realname: String,
    /// Command trigger prefix (default: "!").
    #[serde(default = "default_trigger")]
    pub trigger: String,
    /// Name of the command that claims bot ownership (default: "owner").
    #[serde(default = "default_owner_command")]
    pub owner_command: String,
}

impl BotConfig {
    pub fn username(&self) -> &str {
        self.username.as_deref().unwrap_or(&self.nick)
    }
}

/// IRC server configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    /// Server hostname.
    pub host: String,
    /// Server port (default: 6667).
    #[serde(default = "default_port")]
    pub port: u16,
    /// Connection password (optional).
    pub password: Option<String>,
    /// Channels joined after registration.
    #[serde(default)]
    pub channels: Vec<String>,
    /// Connect over TLS (default: false).
    #[serde(default)]
    pub use_tls: bool,
}

/// Database configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseConfig {
    /// Path to SQLite database file, or ":memory:".
    #[serde(default = "default_database_path")]
    pub path: String,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            path: default_database_path(),
        }
    }
}

/// Static module manifest.
#[derive(Debug, Clone, Deserialize)]
pub struct ModulesConfig {
    /// Built-in modules to register, in registration order.
    #[serde(default = "default_enabled_modules")]
    pub enabled: Vec<String>,
}

impl Default for ModulesConfig {
    fn default() -> Self {
        Self {
            enabled: default_enabled_modules(),
        }
    }
}

/// Headline feed refreshed in the background.
#[derive(Debug, Clone, Deserialize)]
pub struct HeadlinesConfig {
    /// RSS or Atom feed URL; item titles become headlines.
    pub url: String,
    /// Seconds between successful refreshes (default: 900).
    #[serde(default = "default_refresh_secs")]
    pub refresh_secs: u64,
    /// Seconds to wait after a failed fetch (default: 60).
    #[serde(default = "default_retry_secs")]
    pub retry_secs: u64,
    /// Lines printed by the command (default: 3).
    #[serde(default = "default_max_items")]
    pub max_items: usize,
}

fn default_realname() -> String {
    "Straylight IRC Bot".to_string()
}

fn default_trigger() -> String {
    "!".to_string()
}

fn default_owner_command() -> String {
    "owner".to_string()
}

fn default_port() -> u16 {
    6667
}

fn default_database_path() -> String {
    "slircbot.db".to_string()
}

fn default_enabled_modules() -> Vec<String> {
    crate::modules::BUILTIN_NAMES
        .iter()
        .map(|s| s.to_string())
        .collect()
}

fn default_refresh_secs() -> u64 {
    900
}

fn default_retry_secs() -> u64 {
    60
}

fn default_max_items() -> usize {
    3
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    const MINIMAL: &str = r##"
        [bot]
        nick = "slircbot"

        [server]
        host = "irc.example.net"
        channels = ["#test"]
    "##;

    #[test]
    fn minimal_config_fills_defaults() {
        let config: Config = toml::from_str(MINIMAL).unwrap();
        assert_eq!(config.bot.trigger, "!");
        assert_eq!(config.bot.owner_command, "owner");
        assert_eq!(config.bot.username(), "slircbot");
        assert_eq!(config.server.port, 6667);
        assert_eq!(config.server.channels, vec!["#test".to_string()]);
        assert!(!config.server.use_tls);
        assert_eq!(config.rate_limits.max_per_10s, 5);
        assert_eq!(config.output.max_output_lines, 5);
        assert_eq!(config.database.path, "slircbot.db");
        assert!(config.modules.enabled.contains(&"karma".to_string()));
        assert!(config.headlines.is_none());
    }

    #[test]
    fn load_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(
            file,
            "{MINIMAL}\n[output]\nmax_output_lines = 2\n[headlines]\nurl = \"http://x/\"\n"
        )
        .unwrap();
        let config = Config::load(file.path()).unwrap();
        assert_eq!(config.output.max_output_lines, 2);
        assert_eq!(config.headlines.unwrap().refresh_secs, 900);
    }

    #[test]
    fn missing_file_is_io_error() {
        let err = Config::load("/nonexistent/slircbot.toml").unwrap_err();
        assert!(matches!(err, ConfigError::Io(_)));
    }
}
