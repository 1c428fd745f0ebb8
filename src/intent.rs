//! Normalized inbound events.
//!
//! An [`Intent`] is built once per inbound line by the
//! [`Classifier`](crate::classifier::Classifier) and is immutable afterwards.

use std::fmt;

/// Protocol signal names shared by the adapter, classifier and registry.
pub mod signal {
    pub const MESSAGE: &str = "message";
    pub const JOIN: &str = "join";
    pub const PART: &str = "part";
    pub const QUIT: &str = "quit";
    pub const NAMREPLY: &str = "namreply";
}

/// A normalized inbound event as emitted by the connection adapter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Event {
    /// One of the names in [`signal`].
    pub signal: String,
    pub nick: String,
    /// Full `nick!user@host` mask, or the bare nick when the server sent none.
    pub hostmask: String,
    /// Channel name, or the sender's nick for private messages.
    pub channel: String,
    pub text: String,
}

impl Event {
    /// Build a `message` event. A channel not starting with a channel prefix
    /// is treated as a private query from `nick`.
    pub fn message(nick: &str, hostmask: &str, target: &str, text: &str) -> Self {
        let channel = if is_channel_name(target) { target } else { nick };
        Self {
            signal: signal::MESSAGE.to_string(),
            nick: nick.to_string(),
            hostmask: hostmask.to_string(),
            channel: channel.to_string(),
            text: text.to_string(),
        }
    }

    pub fn is_private(&self) -> bool {
        !is_channel_name(&self.channel)
    }
}

/// Whether `name` carries one of the standard channel prefixes.
pub fn is_channel_name(name: &str) -> bool {
    name.starts_with(['#', '&', '+', '!'])
}

/// Karma adjustment direction for `token++` / `token--`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Direction {
    Up,
    Down,
}

impl Direction {
    pub fn delta(self) -> i64 {
        match self {
            Self::Up => 1,
            Self::Down => -1,
        }
    }
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Up => f.write_str("up"),
            Self::Down => f.write_str("down"),
        }
    }
}

/// The shorthand family a module can subscribe to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ShorthandKind {
    /// `key = value` and `key?`.
    Factoid,
    /// `key++` and `key--`.
    Karma,
}

/// What the classifier decided a line is.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IntentKind {
    Command {
        /// Always lower-cased.
        name: String,
        /// Remainder after the first whitespace, empty if absent.
        args: String,
    },
    ShorthandSet {
        key: String,
        value: String,
    },
    /// The karma variant of a shorthand set.
    Karma {
        key: String,
        direction: Direction,
        reason: Option<String>,
    },
    ShorthandGet {
        key: String,
    },
    PlainEvent {
        signal: String,
    },
}

impl IntentKind {
    /// Short label for logs and metrics.
    pub fn label(&self) -> &'static str {
        match self {
            Self::Command { .. } => "command",
            Self::ShorthandSet { .. } => "shorthand_set",
            Self::Karma { .. } => "karma",
            Self::ShorthandGet { .. } => "shorthand_get",
            Self::PlainEvent { .. } => "event",
        }
    }

    /// Shorthand route this intent is dispatched on, if any.
    pub fn shorthand(&self) -> Option<ShorthandKind> {
        match self {
            Self::ShorthandSet { .. } | Self::ShorthandGet { .. } => Some(ShorthandKind::Factoid),
            Self::Karma { .. } => Some(ShorthandKind::Karma),
            _ => None,
        }
    }

    /// Whether the intent is throttled by the rate gate.
    pub fn is_addressed(&self) -> bool {
        !matches!(self, Self::PlainEvent { .. })
    }
}

/// One classified inbound event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Intent {
    pub kind: IntentKind,
    pub raw_text: String,
    pub channel: String,
    pub nick: String,
    pub hostmask: String,
    pub is_private: bool,
}

impl Intent {
    /// Where a channel-bound reply goes: the channel, or the nick in a query.
    pub fn reply_target(&self) -> &str {
        if self.is_private { &self.nick } else { &self.channel }
    }

    pub fn command_name(&self) -> Option<&str> {
        match &self.kind {
            IntentKind::Command { name, .. } => Some(name),
            _ => None,
        }
    }

    pub fn command_args(&self) -> Option<&str> {
        match &self.kind {
            IntentKind::Command { args, .. } => Some(args),
            _ => None,
        }
    }

    /// The factoid/karma key for shorthand intents.
    pub fn pattern_key(&self) -> Option<&str> {
        match &self.kind {
            IntentKind::ShorthandSet { key, .. }
            | IntentKind::ShorthandGet { key }
            | IntentKind::Karma { key, .. } => Some(key),
            _ => None,
        }
    }

    pub fn pattern_value(&self) -> Option<&str> {
        match &self.kind {
            IntentKind::ShorthandSet { value, .. } => Some(value),
            _ => None,
        }
    }

    pub fn signal(&self) -> Option<&str> {
        match &self.kind {
            IntentKind::PlainEvent { signal } => Some(signal),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn private_message_uses_nick_as_channel() {
        let ev = Event::message("alice", "alice!a@host", "slircbot", "hi");
        assert_eq!(ev.channel, "alice");
        assert!(ev.is_private());

        let ev = Event::message("alice", "alice!a@host", "#rust", "hi");
        assert_eq!(ev.channel, "#rust");
        assert!(!ev.is_private());
    }

    #[test]
    fn shorthand_routes() {
        let get = IntentKind::ShorthandGet { key: "foo".into() };
        assert_eq!(get.shorthand(), Some(ShorthandKind::Factoid));
        let karma = IntentKind::Karma {
            key: "foo".into(),
            direction: Direction::Down,
            reason: None,
        };
        assert_eq!(karma.shorthand(), Some(ShorthandKind::Karma));
        assert!(!IntentKind::PlainEvent { signal: "join".into() }.is_addressed());
    }
}
