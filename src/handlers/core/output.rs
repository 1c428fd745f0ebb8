//! Per-dispatch reply accumulation and flood-safe flushing.

use crate::intent::Intent;

/// How a buffered line is delivered.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LineKind {
    /// To the channel as is.
    Say,
    /// To the channel, addressed to the requester.
    Reply,
    /// To the requester privately, whatever the line count.
    Private,
}

/// One line ready for the connection adapter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Outbound {
    pub target: String,
    pub text: String,
}

impl Outbound {
    pub fn new(target: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            target: target.into(),
            text: text.into(),
        }
    }
}

/// Lines produced by one handler invocation.
#[derive(Debug, Default)]
pub struct OutputBuffer {
    lines: Vec<(LineKind, String)>,
}

impl OutputBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Buffer `text`, one entry per non-empty line.
    pub fn push(&mut self, kind: LineKind, text: &str) {
        for line in text.split(['\r', '\n']).filter(|l| !l.trim().is_empty()) {
            self.lines.push((kind, line.to_string()));
        }
    }

    pub fn len(&self) -> usize {
        self.lines.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    pub fn clear(&mut self) {
        self.lines.clear();
    }

    pub fn lines(&self) -> impl Iterator<Item = (LineKind, &str)> {
        self.lines.iter().map(|(k, l)| (*k, l.as_str()))
    }
}

/// Turns a buffer into outbound lines.
#[derive(Debug, Clone)]
pub struct OutputBatcher {
    max_lines: usize,
    overflow_warning: String,
}

impl OutputBatcher {
    pub fn new(max_lines: usize, overflow_warning: impl Into<String>) -> Self {
        Self {
            max_lines,
            overflow_warning: overflow_warning.into(),
        }
    }

    /// Drain `buffer` into lines for `intent`'s requester and channel.
    ///
    /// More than `max_lines` buffered lines sends a single warning to the
    /// channel and every line to the requester privately.
    pub fn flush(&self, buffer: &mut OutputBuffer, intent: &Intent) -> Vec<Outbound> {
        let lines = std::mem::take(&mut buffer.lines);
        if lines.is_empty() {
            return Vec::new();
        }

        let channel = intent.reply_target();
        let nick = intent.nick.as_str();

        if lines.len() > self.max_lines {
            crate::metrics::record_output_overflow();
            let mut out = Vec::with_capacity(lines.len() + 1);
            out.push(Outbound::new(
                channel,
                format!("{nick}: {}", self.overflow_warning),
            ));
            out.extend(lines.into_iter().map(|(_, text)| Outbound::new(nick, text)));
            return out;
        }

        lines
            .into_iter()
            .map(|(kind, text)| match kind {
                LineKind::Say => Outbound::new(channel, text),
                LineKind::Reply if intent.is_private => Outbound::new(channel, text),
                LineKind::Reply => Outbound::new(channel, format!("{nick}: {text}")),
                LineKind::Private => Outbound::new(nick, text),
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::intent::IntentKind;

    fn intent(channel: &str) -> Intent {
        Intent {
            kind: IntentKind::Command {
                name: "x".into(),
                args: String::new(),
            },
            raw_text: "!x".into(),
            channel: channel.into(),
            nick: "alice".into(),
            hostmask: "alice!a@h".into(),
            is_private: !channel.starts_with('#'),
        }
    }

    #[test]
    fn routes_by_kind() {
        let batcher = OutputBatcher::new(5, "too much");
        let mut buf = OutputBuffer::new();
        buf.push(LineKind::Say, "hello");
        buf.push(LineKind::Reply, "done");
        buf.push(LineKind::Private, "secret");

        let out = batcher.flush(&mut buf, &intent("#test"));
        assert_eq!(
            out,
            vec![
                Outbound::new("#test", "hello"),
                Outbound::new("#test", "alice: done"),
                Outbound::new("alice", "secret"),
            ]
        );
        assert!(buf.is_empty());
    }

    #[test]
    fn overflow_redirects_everything_privately() {
        let batcher = OutputBatcher::new(3, "too much");
        let mut buf = OutputBuffer::new();
        for i in 0..4 {
            buf.push(LineKind::Say, &format!("line {i}"));
        }

        let out = batcher.flush(&mut buf, &intent("#test"));
        let to_channel: Vec<_> = out.iter().filter(|o| o.target == "#test").collect();
        let to_nick: Vec<_> = out.iter().filter(|o| o.target == "alice").collect();
        assert_eq!(to_channel.len(), 1);
        assert!(to_channel[0].text.contains("too much"));
        assert_eq!(to_nick.len(), 4);
        assert!(buf.is_empty());
    }

    #[test]
    fn exactly_max_lines_stays_in_channel() {
        let batcher = OutputBatcher::new(2, "too much");
        let mut buf = OutputBuffer::new();
        buf.push(LineKind::Say, "a\nb");
        let out = batcher.flush(&mut buf, &intent("#test"));
        assert!(out.iter().all(|o| o.target == "#test"));
        assert_eq!(out.len(), 2);
    }

    #[test]
    fn private_conversation_reply_is_not_prefixed() {
        let batcher = OutputBatcher::new(5, "too much");
        let mut buf = OutputBuffer::new();
        buf.push(LineKind::Reply, "done");
        let out = batcher.flush(&mut buf, &intent("alice"));
        assert_eq!(out, vec![Outbound::new("alice", "done")]);
    }

    #[test]
    fn push_drops_blank_lines() {
        let mut buf = OutputBuffer::new();
        buf.push(LineKind::Say, "one\r\n\r\n  \ntwo");
        assert_eq!(buf.len(), 2);
    }
}
