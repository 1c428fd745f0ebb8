//! Owner claim.
//!
//! The first identity to run the owner command becomes the bot's owner and
//! an admin. The permission gate always admits this command.

use crate::error::ModuleResult;
use crate::handlers::{Context, Module, ModuleConfig};
use crate::intent::Intent;
use async_trait::async_trait;
use tracing::info;

pub struct Owner {
    command: String,
}

impl Owner {
    pub fn new(command: &str) -> Self {
        Self {
            command: command.to_ascii_lowercase(),
        }
    }
}

#[async_trait]
impl Module for Owner {
    fn name(&self) -> &'static str {
        "owner"
    }

    fn config(&self) -> ModuleConfig {
        ModuleConfig::new()
            .command(&self.command)
            .help("Claim ownership of the bot. Only works while it has no owner.")
            .hidden()
    }

    async fn run(&self, ctx: &mut Context<'_>, intent: &Intent) -> ModuleResult {
        if ctx.caller.is_owner() {
            ctx.reply("You are already my owner.");
            return Ok(None);
        }

        if ctx.db().users().claim_owner(&intent.nick, &intent.hostmask).await? {
            info!(nick = %intent.nick, hostmask = %intent.hostmask, "owner claimed");
            ctx.reply("You are now my owner.");
        } else {
            ctx.reply("I already have an owner.");
        }
        Ok(None)
    }
}
