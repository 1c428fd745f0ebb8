//! Integration test common infrastructure.
//!
//! A bot wired to an in-memory database and a capturing outbound sink, so
//! tests can feed it events and assert on exactly what it would have sent.

#![allow(dead_code)]

use slircbot::config::Config;
use slircbot::db::Database;
use slircbot::handlers::{Module, Outbound, Registry, ResponseMiddleware};
use slircbot::handlers::core::DispatchOutcome;
use slircbot::intent::{Event, signal};
use slircbot::modules::{BUILTIN_NAMES, Manifest};
use slircbot::state::SharedCache;
use slircbot::Bot;
use std::sync::Arc;
use tokio::sync::Mutex;

pub const CHANNEL: &str = "#test";

pub const CONFIG: &str = r##"
[bot]
nick = "slircbot"

[server]
host = "127.0.0.1"
channels = ["#test"]

[rate_limits]
max_per_10s = 5
max_per_minute = 20
max_global_per_second = 1000

[output]
max_output_lines = 5

[database]
path = ":memory:"
"##;

pub fn hostmask(nick: &str) -> String {
    format!("{nick}!{nick}@test.example")
}

/// A bot under test.
pub struct TestBot {
    pub bot: Bot,
    pub db: Database,
    pub config: Config,
    pub headlines: Arc<SharedCache<Vec<String>>>,
    captured: Arc<Mutex<Vec<Outbound>>>,
}

impl TestBot {
    /// All built-in modules.
    pub async fn new() -> Self {
        Self::with_modules(Vec::new()).await
    }

    /// All built-ins followed by `extra`, registered in that order.
    pub async fn with_modules(extra: Vec<Arc<dyn Module>>) -> Self {
        let config: Config = toml::from_str(CONFIG).expect("test config parses");
        let db = Database::new(":memory:").await.expect("in-memory database");

        let headlines = Arc::new(SharedCache::default());
        let registry = Arc::new(Registry::new());
        let names: Vec<String> = BUILTIN_NAMES.iter().map(|s| s.to_string()).collect();
        Manifest::new(&config.bot.owner_command)
            .with_headlines(Arc::clone(&headlines), 3)
            .load(&registry, &names)
            .expect("built-ins load");
        for module in extra {
            registry.register_module(module).expect("extra module loads");
        }

        let (sink, captured) = ResponseMiddleware::capturing();
        let bot = Bot::new(&config, db.clone(), registry, sink).expect("bot builds");

        Self {
            bot,
            db,
            config,
            headlines,
            captured,
        }
    }

    /// Lines sent since the last call.
    pub async fn drain(&self) -> Vec<Outbound> {
        std::mem::take(&mut *self.captured.lock().await)
    }

    /// Deliver a PRIVMSG from `nick` to `target` and collect what was sent.
    pub async fn say(&self, nick: &str, target: &str, text: &str) -> Vec<Outbound> {
        self.say_outcome(nick, target, text).await.1
    }

    pub async fn say_outcome(
        &self,
        nick: &str,
        target: &str,
        text: &str,
    ) -> (DispatchOutcome, Vec<Outbound>) {
        let event = Event::message(nick, &hostmask(nick), target, text);
        let outcome = self.bot.handle_event(&event).await;
        (outcome, self.drain().await)
    }

    /// Deliver a non-message event.
    pub async fn observe(&self, sig: &str, nick: &str, channel: &str, text: &str) -> Vec<Outbound> {
        let event = Event {
            signal: sig.to_string(),
            nick: nick.to_string(),
            hostmask: if nick.is_empty() { String::new() } else { hostmask(nick) },
            channel: channel.to_string(),
            text: text.to_string(),
        };
        self.bot.handle_event(&event).await;
        self.drain().await
    }

    pub async fn join(&self, nick: &str) -> Vec<Outbound> {
        self.observe(signal::JOIN, nick, CHANNEL, "").await
    }
}

/// Texts of lines sent to `target`.
pub fn texts_to(lines: &[Outbound], target: &str) -> Vec<String> {
    lines
        .iter()
        .filter(|l| l.target == target)
        .map(|l| l.text.clone())
        .collect()
}
