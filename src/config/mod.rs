//! Configuration loading and management.
//!
//! This module is split into logical submodules:
//! - [`types`]: Core config struct definitions (Config, BotConfig, ServerConfig)
//! - [`security`]: Command rate limiting (RateLimitConfig)
//! - [`limits`]: Output and outbound pacing limits (OutputConfig, NetworkConfig)
//! - [`validation`]: Startup checks returning every problem at once

mod limits;
mod security;
mod types;
pub mod validation;

pub use limits::{NetworkConfig, OutputConfig};
pub use security::RateLimitConfig;
pub use types::{
    BotConfig, Config, ConfigError, DatabaseConfig, HeadlinesConfig, ModulesConfig, ServerConfig,
};
