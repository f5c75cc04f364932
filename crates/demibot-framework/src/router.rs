//! Command line parsing and command-name matching.

use serde::{Deserialize, Serialize};

/// A command split out of a line of inbound text.
///
/// The name is everything between the prefix and the first whitespace; the
/// argument string is everything after that whitespace character, untouched.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CommandLine<'a> {
    /// Command name, exactly as typed.
    pub name: &'a str,
    /// Raw argument string (empty when the line has no whitespace).
    pub args: &'a str,
}

impl<'a> CommandLine<'a> {
    /// Parses `text` if it begins with `prefix`.
    ///
    /// Returns `None` when the prefix is missing or the command name is empty.
    ///
    /// ```
    /// use demibot_framework::CommandLine;
    ///
    /// let cmd = CommandLine::parse(".timer 5 tea is ready", ".").unwrap();
    /// assert_eq!(cmd.name, "timer");
    /// assert_eq!(cmd.args, "5 tea is ready");
    /// ```
    pub fn parse(text: &'a str, prefix: &str) -> Option<Self> {
        let rest = text.strip_prefix(prefix)?;
        let (name, args) = match rest.char_indices().find(|(_, c)| c.is_whitespace()) {
            Some((i, c)) => (&rest[..i], &rest[i + c.len_utf8()..]),
            None => (rest, ""),
        };
        if name.is_empty() {
            return None;
        }
        Some(Self { name, args })
    }
}

/// How plugin command names are compared against the typed name.
///
/// Built-in commands always match exactly.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CommandMatching {
    /// Byte-for-byte comparison.
    #[default]
    Exact,
    /// Unicode case-insensitive comparison.
    CaseInsensitive,
}

impl CommandMatching {
    /// Returns `true` if a command registered as `registered` answers to `typed`.
    pub fn matches(&self, registered: &str, typed: &str) -> bool {
        match self {
            Self::Exact => registered == typed,
            Self::CaseInsensitive => registered.to_lowercase() == typed.to_lowercase(),
        }
    }
}
