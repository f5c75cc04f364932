//! Client identity and hostmask helpers.

/// The identity the client presents to the network.
///
/// Only the nickname is mutable over the life of a session; it changes when the
/// server reports a collision or when the client is renamed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Identity {
    /// Current nickname.
    pub nickname: String,
    /// Username (ident) sent at registration.
    pub username: String,
    /// Real name sent at registration.
    pub realname: String,
}

impl Identity {
    /// Creates a new identity.
    pub fn new(
        nickname: impl Into<String>,
        username: impl Into<String>,
        realname: impl Into<String>,
    ) -> Self {
        Self {
            nickname: nickname.into(),
            username: username.into(),
            realname: realname.into(),
        }
    }

    /// Returns `true` if `name` refers to this identity's nickname.
    ///
    /// Nicknames compare case-insensitively.
    pub fn is_me(&self, name: &str) -> bool {
        self.nickname.to_lowercase() == name.to_lowercase()
    }
}

/// Reduces a `nick!user@host` mask to its nickname.
///
/// Anything without both `!` and `@` is returned unchanged, so plain
/// nicknames and channel names pass through.
pub fn nick_of(mask: &str) -> &str {
    match (mask.find('!'), mask.find('@')) {
        (Some(bang), Some(_)) => &mask[..bang],
        _ => mask,
    }
}

/// Strips a leading `"<nick><punctuation>"` mention from `text`.
///
/// Returns the remainder with leading whitespace removed, or `None` when the
/// text does not open with a mention of `nick`.
///
/// ```
/// use demibot_core::strip_mention;
///
/// assert_eq!(strip_mention("bot: hello", "bot"), Some("hello"));
/// assert_eq!(strip_mention("Bot,   ping", "bot"), Some("ping"));
/// assert_eq!(strip_mention("bother", "bot"), None);
/// ```
pub fn strip_mention<'a>(text: &'a str, nick: &str) -> Option<&'a str> {
    if nick.is_empty() {
        return None;
    }
    let head = text.get(..nick.len())?;
    if head.to_lowercase() != nick.to_lowercase() {
        return None;
    }
    let rest = &text[nick.len()..];
    let mut chars = rest.chars();
    match chars.next() {
        Some(c) if c.is_ascii_punctuation() => Some(chars.as_str().trim_start()),
        _ => None,
    }
}
