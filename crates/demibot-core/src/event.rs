//! Event kinds that plugins can subscribe to.

use std::fmt;
use std::str::FromStr;

/// The non-command inbound events broadcast to plugin handlers.
///
/// Each kind has a stable name used in logs and module definitions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum EventKind {
    /// A message addressed to a channel or to the bot (`privmsg`).
    Message,
    /// A notice (`noticed`).
    Notice,
    /// A `/me` action (`action`).
    Action,
    /// Someone changed their nickname (`nick`).
    NickChanged,
}

impl EventKind {
    /// All event kinds, in a stable order.
    pub const ALL: [EventKind; 4] = [
        EventKind::Message,
        EventKind::Notice,
        EventKind::Action,
        EventKind::NickChanged,
    ];

    /// Returns the stable name of this event kind.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Message => "privmsg",
            Self::Notice => "noticed",
            Self::Action => "action",
            Self::NickChanged => "nick",
        }
    }
}

impl fmt::Display for EventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for EventKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|kind| kind.as_str() == s)
            .ok_or_else(|| format!("unknown event kind '{s}'"))
    }
}
