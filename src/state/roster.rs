//! Channel membership as observed from the server.
//!
//! Updated by the bot before each event is dispatched, so modules see
//! membership that already reflects the event they are handling.

use crate::intent::{Event, signal};
use dashmap::DashMap;
use std::collections::HashSet;
use tracing::trace;

/// Nicks per channel. Keys are lower-cased channel names; nicks keep the
/// case the server sent.
#[derive(Debug, Default)]
pub struct Roster {
    channels: DashMap<String, HashSet<String>>,
}

impl Roster {
    pub fn new() -> Self {
        Self::default()
    }

    /// Apply one membership-changing event. Other signals are ignored.
    pub fn observe(&self, event: &Event) {
        match event.signal.as_str() {
            signal::JOIN => self.join(&event.channel, &event.nick),
            signal::PART => self.part(&event.channel, &event.nick),
            signal::QUIT => self.quit(&event.nick),
            signal::NAMREPLY => self.names(&event.channel, &event.text),
            _ => {}
        }
    }

    pub fn join(&self, channel: &str, nick: &str) {
        self.channels
            .entry(channel.to_lowercase())
            .or_default()
            .insert(nick.to_string());
    }

    pub fn part(&self, channel: &str, nick: &str) {
        let key = channel.to_lowercase();
        if let Some(mut members) = self.channels.get_mut(&key) {
            members.retain(|m| !m.eq_ignore_ascii_case(nick));
        }
        self.channels.remove_if(&key, |_, members| members.is_empty());
    }

    pub fn quit(&self, nick: &str) {
        for mut entry in self.channels.iter_mut() {
            entry.value_mut().retain(|m| !m.eq_ignore_ascii_case(nick));
        }
        self.channels.retain(|_, members| !members.is_empty());
    }

    /// Merge a `353` names list, stripping status prefixes such as `@` and `+`.
    pub fn names(&self, channel: &str, list: &str) {
        let mut members = self.channels.entry(channel.to_lowercase()).or_default();
        for name in list.split_whitespace() {
            let nick = name.trim_start_matches(['@', '+', '%', '&', '~']);
            if !nick.is_empty() {
                members.insert(nick.to_string());
            }
        }
        trace!(channel = %channel, count = members.len(), "names merged");
    }

    pub fn is_member(&self, channel: &str, nick: &str) -> bool {
        self.channels
            .get(&channel.to_lowercase())
            .is_some_and(|m| m.iter().any(|n| n.eq_ignore_ascii_case(nick)))
    }

    /// Sorted members of `channel`.
    pub fn members(&self, channel: &str) -> Vec<String> {
        let mut members: Vec<String> = self
            .channels
            .get(&channel.to_lowercase())
            .map(|m| m.iter().cloned().collect())
            .unwrap_or_default();
        members.sort();
        members
    }

    pub fn channel_count(&self) -> usize {
        self.channels.len()
    }
}
