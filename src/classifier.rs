//! Trigger classification.
//!
//! Turns one inbound [`Event`] into exactly one [`Intent`]. Rules are tried in
//! a fixed order and the first match wins:
//!
//! 1. `<t>key = value`  -> shorthand set, unless `key` is a registered command
//! 2. `<t>key?`         -> shorthand get, unless `key` is a registered command
//! 3. `<t>key++` / `<t>key-- #reason` -> karma, unless the whole word is a command
//! 4. `<t>name args`    -> command
//! 5. anything else     -> plain `message` event
//!
//! Shorthand rules run before command parsing so `!c++` is never read as a
//! command named `c++`.

use crate::error::ClassificationError;
use crate::intent::{Direction, Event, Intent, IntentKind, signal};
use regex::Regex;

/// Matches the command names the command rule can produce.
pub fn is_valid_command_name(name: &str) -> bool {
    !name.is_empty()
        && name
            .bytes()
            .all(|b| b.is_ascii_lowercase() || b.is_ascii_digit() || b == b'-')
}

/// Compiled trigger grammar.
#[derive(Debug, Clone)]
pub struct Classifier {
    trigger: String,
    set_re: Regex,
    get_re: Regex,
    karma_re: Regex,
    command_re: Regex,
}

impl Classifier {
    /// Compile the grammar for `trigger`.
    ///
    /// An empty trigger cannot be told apart from ordinary chat and is
    /// rejected; this is a startup error, never a per-message one.
    pub fn new(trigger: &str) -> Result<Self, ClassificationError> {
        if trigger.is_empty() {
            return Err(ClassificationError::EmptyTrigger);
        }
        if trigger.chars().any(char::is_whitespace) {
            return Err(ClassificationError::WhitespaceTrigger(trigger.to_string()));
        }
        let t = regex::escape(trigger);
        let compile = |pattern: String| {
            Regex::new(&pattern).map_err(|e| ClassificationError::Pattern(e.to_string()))
        };

        Ok(Self {
            trigger: trigger.to_string(),
            set_re: compile(format!(r"^{t}([a-zA-Z0-9_-]+)\s*=\s*(.+)$"))?,
            get_re: compile(format!(r"^{t}([a-zA-Z0-9_-]+)\?$"))?,
            karma_re: compile(format!(r"^{t}([a-zA-Z0-9_-]+)(\+\+|--)(?:\s+#(.*))?$"))?,
            command_re: compile(format!(r"^{t}([-a-zA-Z0-9]+)(?:\s(.*))?$"))?,
        })
    }

    pub fn trigger(&self) -> &str {
        &self.trigger
    }

    /// Classify one event. `is_command` answers whether a lower-cased name is
    /// currently registered as a real command.
    pub fn classify<F>(&self, event: &Event, is_command: F) -> Intent
    where
        F: Fn(&str) -> bool,
    {
        let kind = if event.signal == signal::MESSAGE {
            self.classify_text(&event.text, &is_command)
        } else {
            IntentKind::PlainEvent {
                signal: event.signal.clone(),
            }
        };

        Intent {
            kind,
            raw_text: event.text.clone(),
            channel: event.channel.clone(),
            nick: event.nick.clone(),
            hostmask: event.hostmask.clone(),
            is_private: event.is_private(),
        }
    }

    fn classify_text<F>(&self, raw: &str, is_command: &F) -> IntentKind
    where
        F: Fn(&str) -> bool,
    {
        let text = raw.trim_end();
        if !text.starts_with(self.trigger.as_str()) {
            return plain_message();
        }

        if let Some(caps) = self.set_re.captures(text) {
            let key = &caps[1];
            if !is_command(&key.to_ascii_lowercase()) {
                return IntentKind::ShorthandSet {
                    key: key.to_string(),
                    value: caps[2].trim().to_string(),
                };
            }
        }

        if let Some(caps) = self.get_re.captures(text) {
            let key = &caps[1];
            if !is_command(&key.to_ascii_lowercase()) {
                return IntentKind::ShorthandGet {
                    key: key.to_string(),
                };
            }
        }

        if let Some(caps) = self.karma_re.captures(text) {
            let key = &caps[1];
            let op = &caps[2];
            let word = format!("{}{}", key.to_ascii_lowercase(), op);
            if !is_command(&word) {
                let direction = if op == "++" { Direction::Up } else { Direction::Down };
                let reason = caps
                    .get(3)
                    .map(|m| m.as_str().trim().to_string())
                    .filter(|r| !r.is_empty());
                return IntentKind::Karma {
                    key: key.to_string(),
                    direction,
                    reason,
                };
            }
        }

        if let Some(caps) = self.command_re.captures(text) {
            return IntentKind::Command {
                name: caps[1].to_ascii_lowercase(),
                args: caps.get(2).map(|m| m.as_str().to_string()).unwrap_or_default(),
            };
        }

        plain_message()
    }
}

fn plain_message() -> IntentKind {
    IntentKind::PlainEvent {
        signal: signal::MESSAGE.to_string(),
    }
}
