//! `forget <key>`: drop a factoid. Admins only.

use crate::error::ModuleResult;
use crate::handlers::{Context, Module, ModuleConfig};
use crate::intent::Intent;
use crate::security::ADMIN_PERMISSION;
use async_trait::async_trait;
use tracing::info;

pub struct Forget;

#[async_trait]
impl Module for Forget {
    fn name(&self) -> &'static str {
        "forget"
    }

    fn config(&self) -> ModuleConfig {
        ModuleConfig::new()
            .command("forget")
            .permission(ADMIN_PERMISSION)
            .help("forget <key>: remove everything I know about key.")
    }

    async fn run(&self, ctx: &mut Context<'_>, intent: &Intent) -> ModuleResult {
        let key = intent.command_args().unwrap_or_default().trim();
        if key.is_empty() {
            ctx.reply(format!("Usage: {}forget <key>", ctx.trigger()));
            return Ok(None);
        }

        match ctx.db().factoids().forget(key).await? {
            0 => ctx.reply(format!("I didn't know anything about {key}.")),
            n => {
                info!(key = %key, removed = n, by = %intent.nick, "factoid forgotten");
                ctx.reply(format!("Forgot {key} ({n} value{}).", if n == 1 { "" } else { "s" }));
            }
        }
        Ok(None)
    }
}
