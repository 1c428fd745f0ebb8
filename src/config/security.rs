//! Command rate limiting configuration.

use serde::Deserialize;
use std::time::Duration;

/// Rate limiting configuration for anti-flood protection.
///
/// Counts only addressed input (commands and shorthands); plain chat is never
/// throttled.
#[derive(Debug, Clone, Deserialize)]
pub struct RateLimitConfig {
    /// Commands allowed per identity in any 10 second window (default: 5).
    #[serde(default = "default_max_per_10s")]
    pub max_per_10s: usize,
    /// Commands allowed per identity in any 60 second window (default: 20).
    /// Reaching it bans the identity for `ban_duration_secs`.
    #[serde(default = "default_max_per_minute")]
    pub max_per_minute: usize,
    /// Ban length after exceeding the per-minute window (default: 300).
    #[serde(default = "default_ban_duration_secs")]
    pub ban_duration_secs: u64,
    /// Commands allowed across all identities per second (default: 4).
    #[serde(default = "default_max_global_per_second")]
    pub max_global_per_second: usize,
}

impl RateLimitConfig {
    pub fn ban_duration(&self) -> Duration {
        Duration::from_secs(self.ban_duration_secs)
    }
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            max_per_10s: default_max_per_10s(),
            max_per_minute: default_max_per_minute(),
            ban_duration_secs: default_ban_duration_secs(),
            max_global_per_second: default_max_global_per_second(),
        }
    }
}

fn default_max_per_10s() -> usize {
    5
}

fn default_max_per_minute() -> usize {
    20
}

fn default_ban_duration_secs() -> u64 {
    300
}

fn default_max_global_per_second() -> usize {
    4
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partial_section_keeps_other_defaults() {
        let config: RateLimitConfig = toml::from_str("max_per_10s = 2").unwrap();
        assert_eq!(config.max_per_10s, 2);
        assert_eq!(config.max_per_minute, 20);
        assert_eq!(config.ban_duration(), Duration::from_secs(300));
    }
}
