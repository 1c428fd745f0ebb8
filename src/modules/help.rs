//! `help` and `help <command>`.

use crate::error::ModuleResult;
use crate::handlers::{Context, Module, ModuleConfig};
use crate::intent::Intent;
use async_trait::async_trait;
use std::collections::BTreeSet;

pub struct HelpIndex;

#[async_trait]
impl Module for HelpIndex {
    fn name(&self) -> &'static str {
        "help"
    }

    fn config(&self) -> ModuleConfig {
        ModuleConfig::new()
            .command("help")
            .permission("user")
            .help("help [command]: list commands, or explain one.")
    }

    async fn run(&self, ctx: &mut Context<'_>, intent: &Intent) -> ModuleResult {
        let services = ctx.services;
        let trigger = services.trigger.as_str();
        let registry = &services.registry;
        let wanted = intent
            .command_args()
            .unwrap_or_default()
            .split_whitespace()
            .next()
            .map(|s| s.trim_start_matches(trigger).to_ascii_lowercase());

        let Some(command) = wanted else {
            let names: BTreeSet<String> = registry
                .advertised()
                .iter()
                .flat_map(|m| m.commands.iter().map(|c| format!("{trigger}{c}")))
                .collect();
            let names: Vec<String> = names.into_iter().collect();
            ctx.reply(format!("Commands: {}", names.join(", ")));
            return Ok(None);
        };

        let text = registry
            .find_command_handlers(&command)
            .iter()
            .filter(|m| !m.hidden)
            .find_map(|m| m.help.for_command(&command).map(str::to_string));

        match text {
            Some(text) => ctx.reply(text),
            None if registry.advertised().iter().any(|m| m.commands.contains(&command)) => {
                ctx.reply(format!("No help for {trigger}{command}."))
            }
            None => ctx.reply(format!("No such command: {trigger}{command}")),
        }
        Ok(None)
    }
}
