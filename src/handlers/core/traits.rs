//! The module contract.
//!
//! A module declares what it answers to once, through [`Module::config`], and
//! is then invoked through [`Module::run`] for every intent routed to it.
//! Permission checks, rate limiting and output batching happen around the
//! call; modules never repeat them.

use super::context::Context;
use crate::error::ModuleResult;
use crate::intent::{Intent, ShorthandKind};
use async_trait::async_trait;
use std::collections::{BTreeMap, BTreeSet};

/// A command/event handler.
#[async_trait]
pub trait Module: Send + Sync {
    /// Unique registry key (e.g., "karma").
    fn name(&self) -> &'static str;

    /// Declared routes and requirements. Called once at registration.
    fn config(&self) -> ModuleConfig;

    /// Handle one intent. Returning `Ok(Some(true))` marks an event as
    /// handled; commands count as handled whatever is returned.
    async fn run(&self, ctx: &mut Context<'_>, intent: &Intent) -> ModuleResult;
}

/// Help text: one string for the module, or one per command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Help {
    Text(String),
    PerCommand(BTreeMap<String, String>),
}

impl Default for Help {
    fn default() -> Self {
        Self::Text(String::new())
    }
}

impl Help {
    pub fn for_command(&self, command: &str) -> Option<&str> {
        match self {
            Self::Text(text) if !text.is_empty() => Some(text),
            Self::Text(_) => None,
            Self::PerCommand(map) => map.get(command).map(String::as_str),
        }
    }
}

/// What a module answers to, as returned by [`Module::config`].
#[derive(Debug, Clone, Default)]
pub struct ModuleConfig {
    pub commands: BTreeSet<String>,
    pub events: BTreeSet<String>,
    pub shorthands: BTreeSet<ShorthandKind>,
    /// Ordered, without duplicates.
    pub permissions: Vec<String>,
    pub help: Help,
    /// Left out of help listings; permission failures stay silent.
    pub hidden: bool,
}

impl ModuleConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn command(mut self, name: &str) -> Self {
        self.commands.insert(name.to_string());
        self
    }

    pub fn event(mut self, signal: &str) -> Self {
        self.events.insert(signal.to_string());
        self
    }

    pub fn shorthand(mut self, kind: ShorthandKind) -> Self {
        self.shorthands.insert(kind);
        self
    }

    pub fn permission(mut self, permission: &str) -> Self {
        if !self.permissions.iter().any(|p| p == permission) {
            self.permissions.push(permission.to_string());
        }
        self
    }

    pub fn help(mut self, text: &str) -> Self {
        self.help = Help::Text(text.to_string());
        self
    }

    pub fn command_help(mut self, command: &str, text: &str) -> Self {
        let mut map = match self.help {
            Help::PerCommand(map) => map,
            Help::Text(_) => BTreeMap::new(),
        };
        map.insert(command.to_string(), text.to_string());
        self.help = Help::PerCommand(map);
        self
    }

    pub fn hidden(mut self) -> Self {
        self.hidden = true;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn permissions_stay_ordered_and_unique() {
        let config = ModuleConfig::new()
            .permission("admin")
            .permission("user")
            .permission("admin");
        assert_eq!(config.permissions, vec!["admin", "user"]);
    }

    #[test]
    fn help_lookup() {
        let text = ModuleConfig::new().help("does things").help;
        assert_eq!(text.for_command("anything"), Some("does things"));

        let map = ModuleConfig::new()
            .command_help("karma", "karma <item>")
            .command_help("top", "top karma")
            .help;
        assert_eq!(map.for_command("top"), Some("top karma"));
        assert_eq!(map.for_command("other"), None);
        assert_eq!(Help::default().for_command("x"), None);
    }
}
