//! `seen <nick>`: when and where someone was last active.
//!
//! Fed by fan-out of message, join, part and quit events.

use crate::error::ModuleResult;
use crate::handlers::{Context, Module, ModuleConfig};
use crate::intent::{Intent, signal};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use dashmap::DashMap;

/// Longest quoted message kept per nick.
const MAX_QUOTE: usize = 120;

/// Nicks remembered before the oldest sighting is dropped.
const MAX_SIGHTINGS: usize = 10_000;

#[derive(Debug, Clone)]
struct Sighting {
    nick: String,
    /// `None` when the only thing seen was a quit.
    channel: Option<String>,
    activity: String,
    at: DateTime<Utc>,
}

/// Keyed by lower-cased nick.
pub struct Seen {
    sightings: DashMap<String, Sighting>,
    limit: usize,
}

impl Seen {
    pub fn new() -> Self {
        Self::with_limit(MAX_SIGHTINGS)
    }

    pub fn with_limit(limit: usize) -> Self {
        Self {
            sightings: DashMap::new(),
            limit: limit.max(1),
        }
    }

    fn record(&self, intent: &Intent, signal: &str) {
        let activity = match signal {
            signal::MESSAGE if intent.is_private => return,
            signal::MESSAGE => format!("saying \"{}\"", quote(&intent.raw_text)),
            signal::JOIN => "joining".to_string(),
            signal::PART => "leaving".to_string(),
            signal::QUIT if intent.raw_text.is_empty() => "quitting".to_string(),
            signal::QUIT => format!("quitting ({})", quote(&intent.raw_text)),
            _ => return,
        };

        let key = intent.nick.to_lowercase();
        // QUIT is network-wide; keep the channel they were last seen in.
        let channel = if signal == signal::QUIT {
            self.sightings.get(&key).and_then(|s| s.channel.clone())
        } else {
            Some(intent.channel.clone())
        };

        if !self.sightings.contains_key(&key) && self.sightings.len() >= self.limit {
            self.evict_oldest();
        }
        self.sightings.insert(
            key,
            Sighting {
                nick: intent.nick.clone(),
                channel,
                activity,
                at: Utc::now(),
            },
        );
    }

    fn evict_oldest(&self) {
        let oldest = self
            .sightings
            .iter()
            .min_by_key(|entry| entry.value().at)
            .map(|entry| entry.key().clone());
        if let Some(key) = oldest {
            self.sightings.remove(&key);
        }
    }

    pub fn len(&self) -> usize {
        self.sightings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sightings.is_empty()
    }
}

impl Default for Seen {
    fn default() -> Self {
        Self::new()
    }
}

fn quote(text: &str) -> String {
    if text.chars().count() <= MAX_QUOTE {
        return text.to_string();
    }
    let cut: String = text.chars().take(MAX_QUOTE).collect();
    format!("{cut}...")
}

#[async_trait]
impl Module for Seen {
    fn name(&self) -> &'static str {
        "seen"
    }

    fn config(&self) -> ModuleConfig {
        ModuleConfig::new()
            .command("seen")
            .event(signal::MESSAGE)
            .event(signal::JOIN)
            .event(signal::PART)
            .event(signal::QUIT)
            .permission("user")
            .help("seen <nick>: when I last saw someone, and what they were doing.")
    }

    async fn run(&self, ctx: &mut Context<'_>, intent: &Intent) -> ModuleResult {
        if let Some(signal) = intent.signal() {
            self.record(intent, signal);
            return Ok(Some(true));
        }

        let Some(nick) = intent
            .command_args()
            .and_then(|args| args.split_whitespace().next())
        else {
            ctx.reply(format!("Usage: {}seen <nick>", ctx.trigger()));
            return Ok(None);
        };

        if nick.eq_ignore_ascii_case(&intent.nick) {
            ctx.reply("Looking for yourself?");
            return Ok(None);
        }

        let here = !intent.is_private && ctx.services.roster.is_member(&intent.channel, nick);
        let sighting = self.sightings.get(&nick.to_lowercase()).map(|s| s.value().clone());

        match sighting {
            Some(s) => {
                let place = s.channel.map(|c| format!(" in {c}")).unwrap_or_default();
                let mut line = format!(
                    "{} was last seen{place} at {}, {}.",
                    s.nick,
                    s.at.format("%Y-%m-%d %H:%M UTC"),
                    s.activity
                );
                if here {
                    line.push_str(" They're here now.");
                }
                ctx.say(line);
            }
            None if here => ctx.say(format!("{nick} is here, but hasn't said anything yet.")),
            None => ctx.say(format!("I haven't seen {nick}.")),
        }
        Ok(None)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::intent::IntentKind;

    fn event(sig: &str, nick: &str, channel: &str, text: &str) -> Intent {
        Intent {
            kind: IntentKind::PlainEvent {
                signal: sig.to_string(),
            },
            raw_text: text.to_string(),
            channel: channel.to_string(),
            nick: nick.to_string(),
            hostmask: format!("{nick}!{nick}@example.net"),
            is_private: !channel.starts_with('#'),
        }
    }

    #[test]
    fn quit_keeps_last_channel() {
        let seen = Seen::new();
        seen.record(&event(signal::QUIT, "dave", "dave", "bye"), signal::QUIT);
        assert_eq!(seen.sightings.get("dave").unwrap().channel, None);

        seen.record(&event(signal::JOIN, "carol", "#rust", ""), signal::JOIN);
        seen.record(&event(signal::QUIT, "Carol", "Carol", ""), signal::QUIT);
        let s = seen.sightings.get("carol").unwrap();
        assert_eq!(s.channel.as_deref(), Some("#rust"));
        assert_eq!(s.activity, "quitting");
    }

    #[test]
    fn oldest_sighting_is_evicted_at_limit() {
        let seen = Seen::with_limit(2);
        seen.record(&event(signal::JOIN, "a", "#x", ""), signal::JOIN);
        std::thread::sleep(std::time::Duration::from_millis(2));
        seen.record(&event(signal::JOIN, "b", "#x", ""), signal::JOIN);
        std::thread::sleep(std::time::Duration::from_millis(2));
        // Refreshing a known nick never evicts.
        seen.record(&event(signal::PART, "b", "#x", ""), signal::PART);
        assert_eq!(seen.len(), 2);

        seen.record(&event(signal::JOIN, "c", "#x", ""), signal::JOIN);
        assert_eq!(seen.len(), 2);
        assert!(!seen.sightings.contains_key("a"));
        assert!(seen.sightings.contains_key("b"));
        assert!(seen.sightings.contains_key("c"));
    }

    #[test]
    fn long_quotes_are_cut() {
        let text = "x".repeat(MAX_QUOTE + 10);
        let quoted = quote(&text);
        assert!(quoted.ends_with("..."));
        assert_eq!(quoted.chars().count(), MAX_QUOTE + 3);
        assert_eq!(quote("short"), "short");
    }
}
