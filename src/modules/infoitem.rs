//! Factoids through the shorthand route: `key = value` and `key?`.

use crate::error::ModuleResult;
use crate::handlers::{Context, Module, ModuleConfig};
use crate::intent::{Intent, IntentKind, ShorthandKind};
use async_trait::async_trait;

pub struct InfoItem;

#[async_trait]
impl Module for InfoItem {
    fn name(&self) -> &'static str {
        "infoitem"
    }

    fn config(&self) -> ModuleConfig {
        ModuleConfig::new()
            .shorthand(ShorthandKind::Factoid)
            .permission("user")
            .help("key = value teaches me something; key? tells you what I know.")
    }

    async fn run(&self, ctx: &mut Context<'_>, intent: &Intent) -> ModuleResult {
        match &intent.kind {
            IntentKind::ShorthandSet { key, value } => {
                let added = ctx.db().factoids().add(key, value, &intent.nick).await?;
                if added {
                    ctx.reply(format!("Okay, {key} = {value}."));
                } else {
                    ctx.reply("I already had that.");
                }
            }
            IntentKind::ShorthandGet { key } => {
                let values = ctx.db().factoids().get(key).await?;
                if !values.is_empty() {
                    ctx.say(format!("{key} = {}", values.join(" | ")));
                }
            }
            _ => {}
        }
        Ok(None)
    }
}
