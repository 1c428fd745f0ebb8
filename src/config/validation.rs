//! Configuration validation.
//!
//! Validates configuration at startup to catch common errors early.

use super::Config;
use crate::classifier::is_valid_command_name;
use std::path::Path;
use thiserror::Error;

/// Validation errors for configuration.
#[derive(Debug, Error)]
pub enum ValidationError {
    #[error("bot.nick is required")]
    MissingNick,
    #[error("server.host is required")]
    MissingHost,
    #[error("bot.trigger must not be empty")]
    EmptyTrigger,
    #[error("bot.owner_command {0:?} is not a valid command name")]
    InvalidOwnerCommand(String),
    #[error("rate_limits.{0} must be greater than zero")]
    ZeroRateLimit(&'static str),
    #[error("rate_limits.max_per_minute ({minute}) must be at least max_per_10s ({ten})")]
    InconsistentRateLimits { ten: usize, minute: usize },
    #[error("output.max_output_lines must be greater than zero")]
    ZeroOutputLines,
    #[error("network.{0} must be greater than zero")]
    ZeroNetworkLimit(&'static str),
    #[error("modules.enabled names unknown module {0:?}")]
    UnknownModule(String),
    #[error("modules.enabled lists {0:?} more than once")]
    DuplicateModule(String),
    #[error("headlines.url is required when [headlines] is present")]
    MissingHeadlinesUrl,
    #[error("database.path parent directory does not exist: {0}")]
    DatabasePathInvalid(String),
}

/// Validate a configuration, returning all errors found.
pub fn validate(config: &Config) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    // Required fields
    if config.bot.nick.is_empty() {
        errors.push(ValidationError::MissingNick);
    }
    if config.server.host.is_empty() {
        errors.push(ValidationError::MissingHost);
    }
    if config.bot.trigger.is_empty() {
        errors.push(ValidationError::EmptyTrigger);
    }
    if !is_valid_command_name(&config.bot.owner_command) {
        errors.push(ValidationError::InvalidOwnerCommand(
            config.bot.owner_command.clone(),
        ));
    }

    // Rate limits
    let limits = &config.rate_limits;
    for (name, value) in [
        ("max_per_10s", limits.max_per_10s),
        ("max_per_minute", limits.max_per_minute),
        ("max_global_per_second", limits.max_global_per_second),
    ] {
        if value == 0 {
            errors.push(ValidationError::ZeroRateLimit(name));
        }
    }
    if limits.max_per_minute < limits.max_per_10s {
        errors.push(ValidationError::InconsistentRateLimits {
            ten: limits.max_per_10s,
            minute: limits.max_per_minute,
        });
    }

    if config.output.max_output_lines == 0 {
        errors.push(ValidationError::ZeroOutputLines);
    }
    if config.network.send_rate_per_second == 0 {
        errors.push(ValidationError::ZeroNetworkLimit("send_rate_per_second"));
    }
    if config.network.send_burst == 0 {
        errors.push(ValidationError::ZeroNetworkLimit("send_burst"));
    }
    if config.network.send_queue == 0 {
        errors.push(ValidationError::ZeroNetworkLimit("send_queue"));
    }

    // Module manifest
    let mut seen = std::collections::HashSet::new();
    for name in &config.modules.enabled {
        if !crate::modules::BUILTIN_NAMES.contains(&name.as_str()) {
            errors.push(ValidationError::UnknownModule(name.clone()));
        }
        if !seen.insert(name.as_str()) {
            errors.push(ValidationError::DuplicateModule(name.clone()));
        }
    }

    if let Some(ref headlines) = config.headlines
        && headlines.url.trim().is_empty()
    {
        errors.push(ValidationError::MissingHeadlinesUrl);
    }

    // Database path validation
    if config.database.path != ":memory:" {
        let db_path = Path::new(&config.database.path);
        if let Some(parent) = db_path.parent()
            && !parent.as_os_str().is_empty()
            && !parent.exists()
        {
            errors.push(ValidationError::DatabasePathInvalid(
                config.database.path.clone(),
            ));
        }
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn minimal_valid_config() -> String {
        r#"
[bot]
nick = "slircbot"

[server]
host = "irc.example.net"
"#
        .to_string()
    }

    #[test]
    fn test_valid_config_passes() {
        let config: Config = toml::from_str(&minimal_valid_config()).unwrap();
        assert!(validate(&config).is_ok());
    }

    #[test]
    fn test_empty_trigger_fails() {
        let toml = r#"
[bot]
nick = "slircbot"
trigger = ""

[server]
host = "irc.example.net"
"#;
        let config: Config = toml::from_str(toml).unwrap();
        let errors = validate(&config).unwrap_err();
        assert!(errors.iter().any(|e| matches!(e, ValidationError::EmptyTrigger)));
    }

    #[test]
    fn test_all_errors_reported_together() {
        let toml = r#"
[bot]
nick = ""
owner_command = "Claim!"

[server]
host = ""

[rate_limits]
max_per_10s = 0

[modules]
enabled = ["karma", "karma", "weather"]
"#;
        let config: Config = toml::from_str(toml).unwrap();
        let errors = validate(&config).unwrap_err();
        assert!(errors.iter().any(|e| matches!(e, ValidationError::MissingNick)));
        assert!(errors.iter().any(|e| matches!(e, ValidationError::MissingHost)));
        assert!(errors.iter().any(|e| matches!(e, ValidationError::InvalidOwnerCommand(_))));
        assert!(errors.iter().any(|e| matches!(e, ValidationError::ZeroRateLimit("max_per_10s"))));
        assert!(errors.iter().any(|e| matches!(e, ValidationError::DuplicateModule(m) if m == "karma")));
        assert!(errors.iter().any(|e| matches!(e, ValidationError::UnknownModule(m) if m == "weather")));
    }

    #[test]
    fn test_missing_database_dir_fails() {
        let toml = r#"
[bot]
nick = "slircbot"

[server]
host = "irc.example.net"

[database]
path = "/nonexistent/dir/bot.db"
"#;
        let config: Config = toml::from_str(toml).unwrap();
        let errors = validate(&config).unwrap_err();
        assert!(errors.iter().any(|e| matches!(e, ValidationError::DatabasePathInvalid(_))));
    }
}
