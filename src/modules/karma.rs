//! Karma: `item++`, `item--` and the `karma <item>` query.

use crate::error::ModuleResult;
use crate::handlers::{Context, Module, ModuleConfig};
use crate::intent::{Intent, IntentKind, ShorthandKind};
use async_trait::async_trait;

/// Reasons shown alongside a score.
const REASONS_SHOWN: i64 = 2;

pub struct Karma;

#[async_trait]
impl Module for Karma {
    fn name(&self) -> &'static str {
        "karma"
    }

    fn config(&self) -> ModuleConfig {
        ModuleConfig::new()
            .command("karma")
            .shorthand(ShorthandKind::Karma)
            .permission("user")
            .command_help(
                "karma",
                "karma <item>: show an item's score. Vote with item++ or item-- (optionally followed by # reason).",
            )
    }

    async fn run(&self, ctx: &mut Context<'_>, intent: &Intent) -> ModuleResult {
        match &intent.kind {
            IntentKind::Karma {
                key,
                direction,
                reason,
            } => {
                if key.eq_ignore_ascii_case(&intent.nick) {
                    ctx.reply("You can't change your own karma.");
                    return Ok(None);
                }
                let score = ctx
                    .db()
                    .karma()
                    .adjust(key, *direction, reason.as_deref(), &intent.nick)
                    .await?;
                ctx.say(format!("{key} now has karma of {score}."));
            }
            IntentKind::Command { args, .. } => {
                let item = args.trim();
                if item.is_empty() {
                    ctx.reply(format!("Which item? Usage: {}karma <item>", ctx.trigger()));
                    return Ok(None);
                }
                let karma = ctx.db().karma();
                match karma.get(item).await? {
                    Some(score) => {
                        let reasons = karma.reasons(item, REASONS_SHOWN).await?;
                        if reasons.is_empty() {
                            ctx.say(format!("{item} has karma of {score}."));
                        } else {
                            let why: Vec<String> = reasons
                                .into_iter()
                                .map(|(direction, reason)| format!("{reason} ({direction})"))
                                .collect();
                            ctx.say(format!("{item} has karma of {score}: {}", why.join("; ")));
                        }
                    }
                    None => ctx.say(format!("{item} has neutral karma.")),
                }
            }
            _ => {}
        }
        Ok(None)
    }
}
