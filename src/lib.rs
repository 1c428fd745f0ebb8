//! slircbot - Straylight IRC Bot
//!
//! Routes chat lines to modules: trigger classification, shorthand
//! disambiguation, permission and rate gating, and flood-safe output.

pub mod bot;
pub mod classifier;
pub mod config;
pub mod db;
pub mod error;
pub mod handlers;
pub mod http;
pub mod intent;
pub mod metrics;
pub mod modules;
pub mod network;
pub mod security;
pub mod state;

pub use bot::Bot;
pub use intent::{Event, Intent, IntentKind};
