//! Mapping between `irc` client messages and bot events.
//!
//! Only what the bot observes is mapped; everything else, including
//! CTCP requests, stays with the client.

use crate::intent::{Event, signal};
use irc::client::prelude::{Command, Message, Prefix, Response};

/// Longest payload put in one outbound PRIVMSG, leaving room for the
/// server-added prefix inside the 512 byte line limit.
pub const MAX_PAYLOAD: usize = 400;

/// Convert a client message to a bot event, if it is one the bot observes.
pub fn to_event(message: &Message) -> Option<Event> {
    let (nick, hostmask) = match &message.prefix {
        Some(prefix) => source(prefix),
        None => (String::new(), String::new()),
    };

    let event = match &message.command {
        Command::PRIVMSG(target, text) => {
            if text.starts_with('\u{1}') {
                // CTCP
                return None;
            }
            Event::message(&nick, &hostmask, target, text)
        }
        Command::JOIN(channel, _, _) => observed(signal::JOIN, nick, hostmask, channel, ""),
        Command::PART(channel, reason) => observed(
            signal::PART,
            nick,
            hostmask,
            channel,
            reason.as_deref().unwrap_or_default(),
        ),
        Command::QUIT(reason) => {
            let channel = nick.clone();
            observed(
                signal::QUIT,
                nick,
                hostmask,
                &channel,
                reason.as_deref().unwrap_or_default(),
            )
        }
        // <me> <type> <channel> :<names>
        Command::Response(Response::RPL_NAMREPLY, args) => observed(
            signal::NAMREPLY,
            String::new(),
            String::new(),
            args.get(2)?,
            args.get(3)?,
        ),
        _ => return None,
    };
    Some(event)
}

/// Nick and full `nick!user@host` of a message source.
fn source(prefix: &Prefix) -> (String, String) {
    match prefix {
        Prefix::Nickname(nick, user, host) if !user.is_empty() && !host.is_empty() => {
            (nick.clone(), format!("{nick}!{user}@{host}"))
        }
        Prefix::Nickname(nick, _, _) => (nick.clone(), nick.clone()),
        Prefix::ServerName(name) => (String::new(), name.clone()),
    }
}

fn observed(sig: &str, nick: String, hostmask: String, channel: &str, text: &str) -> Event {
    Event {
        signal: sig.to_string(),
        nick,
        hostmask,
        channel: channel.to_string(),
        text: text.to_string(),
    }
}

/// Single-line payload clipped to [`MAX_PAYLOAD`] bytes on a char boundary.
pub fn clip(text: &str) -> String {
    let mut text = text.replace(['\r', '\n'], " ");
    let mut end = text.len().min(MAX_PAYLOAD);
    while !text.is_char_boundary(end) {
        end -= 1;
    }
    text.truncate(end);
    text
}

#[cfg(test)]
mod tests {
    use super::*;

    fn event(raw: &str) -> Option<Event> {
        to_event(&raw.parse::<Message>().unwrap())
    }

    #[test]
    fn privmsg_keeps_full_hostmask() {
        let ev = event("@time=x :alice!a@host PRIVMSG #rust :hello there\r\n").unwrap();
        assert_eq!(ev.signal, signal::MESSAGE);
        assert_eq!(ev.nick, "alice");
        assert_eq!(ev.hostmask, "alice!a@host");
        assert_eq!(ev.channel, "#rust");
        assert_eq!(ev.text, "hello there");
    }

    #[test]
    fn membership_events() {
        let ev = event(":bob!b@h JOIN #rust\r\n").unwrap();
        assert_eq!(ev.signal, signal::JOIN);
        assert_eq!(ev.channel, "#rust");

        let ev = event(":bob!b@h PART #rust :later\r\n").unwrap();
        assert_eq!(ev.signal, signal::PART);
        assert_eq!(ev.text, "later");

        let ev = event(":bob!b@h QUIT :gone\r\n").unwrap();
        assert_eq!(ev.signal, signal::QUIT);
        assert_eq!(ev.channel, "bob");
        assert_eq!(ev.text, "gone");

        let ev = event(":irc.example.net 353 slircbot = #rust :@alice +bob\r\n").unwrap();
        assert_eq!(ev.signal, signal::NAMREPLY);
        assert_eq!(ev.channel, "#rust");
        assert_eq!(ev.text, "@alice +bob");
    }

    #[test]
    fn unobserved_messages_are_ignored() {
        assert!(event(":a!a@h PRIVMSG #x :\u{1}VERSION\u{1}\r\n").is_none());
        assert!(event("PING :irc.example.net\r\n").is_none());
        assert!(event(":irc.example.net 372 slircbot :- motd\r\n").is_none());
    }

    #[test]
    fn clip_on_char_boundary() {
        let long = "é".repeat(MAX_PAYLOAD);
        let payload = clip(&long);
        assert!(payload.len() <= MAX_PAYLOAD);
        assert!(payload.chars().all(|c| c == 'é'));
        assert_eq!(clip("two\r\nlines"), "two  lines");
    }
}
