//! Per-connection session state.
//!
//! A [`Session`] exists from "connection established" to "connection lost".
//! It owns the identity, the addressing rules, the reply formatter settings,
//! the chat log and the joined-channel set. Everything that needs session
//! state gets the `Arc<Session>` passed in; there is no global.

use std::collections::BTreeSet;
use std::sync::atomic::{AtomicU32, Ordering};

use parking_lot::RwLock;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use demibot_core::{Identity, strip_mention};
use demibot_framework::ReplyFormatter;

use crate::chatlog::ChatLog;
use crate::config::BotConfig;

/// Session settings derived from the configuration.
///
/// Replaced as a whole on rehash.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionSettings {
    pub prefix: String,
    pub formatter: ReplyFormatter,
    pub nick_suffix: String,
    pub max_nick_retries: Option<u32>,
    pub server: String,
    pub channels: Vec<String>,
    pub nickserv_password: Option<String>,
}

impl SessionSettings {
    pub fn from_config(config: &BotConfig) -> Self {
        Self {
            prefix: config.bot.prefix.clone(),
            formatter: ReplyFormatter::new(config.bot.wrap_width, config.bot.continuation.clone()),
            nick_suffix: config.bot.nick_suffix.clone(),
            max_nick_retries: config.bot.max_nick_retries,
            server: config.network.server.clone(),
            channels: config.network.channels.clone(),
            nickserv_password: config.network.nickserv_password.clone(),
        }
    }
}

/// An inbound message after addressing normalization.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Normalized {
    /// The text, with nick mentions rewritten to the command prefix.
    pub text: String,
    /// Where replies go.
    pub reply_target: String,
    /// Whether the message was sent to the client directly.
    pub private: bool,
}

/// State of one live connection.
pub struct Session {
    identity: RwLock<Identity>,
    settings: RwLock<SessionSettings>,
    chatlog: ChatLog,
    channels: RwLock<BTreeSet<String>>,
    nick_attempts: AtomicU32,
    shutdown: CancellationToken,
}

impl Session {
    pub fn new(identity: Identity, settings: SessionSettings, chatlog: ChatLog) -> Self {
        Self {
            identity: RwLock::new(identity),
            settings: RwLock::new(settings),
            chatlog,
            channels: RwLock::new(BTreeSet::new()),
            nick_attempts: AtomicU32::new(0),
            shutdown: CancellationToken::new(),
        }
    }

    pub fn identity(&self) -> Identity {
        self.identity.read().clone()
    }

    pub fn nickname(&self) -> String {
        self.identity.read().nickname.clone()
    }

    pub fn settings(&self) -> SessionSettings {
        self.settings.read().clone()
    }

    pub fn prefix(&self) -> String {
        self.settings.read().prefix.clone()
    }

    pub fn formatter(&self) -> ReplyFormatter {
        self.settings.read().formatter.clone()
    }

    /// Replaces the settings. The identity and chat log are left alone.
    pub fn apply_settings(&self, settings: SessionSettings) {
        *self.settings.write() = settings;
    }

    pub fn chatlog(&self) -> &ChatLog {
        &self.chatlog
    }

    /// Cancelled when the session ends; deferred replies watch it.
    pub fn shutdown_token(&self) -> &CancellationToken {
        &self.shutdown
    }

    /// Where replies to a message from `user` to `target` go: the user for
    /// private messages, the channel otherwise.
    pub fn reply_target(&self, user: &str, target: &str) -> String {
        if self.identity.read().is_me(target) {
            user.to_string()
        } else {
            target.to_string()
        }
    }

    /// Rewrites the ways a user can address the client into the command prefix.
    ///
    /// - private message: a leading `"<nick><punct>"` is replaced with the
    ///   prefix; otherwise the prefix is inserted unless already present, so
    ///   `ping` sent privately is the `ping` command;
    /// - channel message: a leading `"<nick><punct>"` is replaced with the
    ///   prefix; anything else is left alone.
    pub fn normalize(&self, user: &str, target: &str, text: &str) -> Normalized {
        let nick = self.nickname();
        let prefix = self.prefix();
        let private = nick.to_lowercase() == target.to_lowercase();

        let text = match strip_mention(text, &nick) {
            Some(rest) => format!("{prefix}{rest}"),
            None if private && !text.starts_with(&prefix) => format!("{prefix}{text}"),
            None => text.to_string(),
        };
        let reply_target = if private { user } else { target };

        Normalized {
            text,
            reply_target: reply_target.to_string(),
            private,
        }
    }

    /// Next nickname to try after a collision: the current one plus the
    /// suffix. `None` once the configured retry bound is exhausted.
    pub fn next_nickname(&self) -> Option<String> {
        let attempt = self.nick_attempts.fetch_add(1, Ordering::SeqCst) + 1;
        let (suffix, max) = {
            let settings = self.settings.read();
            (settings.nick_suffix.clone(), settings.max_nick_retries)
        };
        if max.is_some_and(|max| attempt > max) {
            return None;
        }

        let mut identity = self.identity.write();
        identity.nickname.push_str(&suffix);
        debug!(attempt, nickname = %identity.nickname, "Retrying with new nickname");
        Some(identity.nickname.clone())
    }

    /// Records a nick change; follows it if it was ours.
    pub fn nick_changed(&self, old: &str, new: &str) {
        self.chatlog.record(&format!("{old} is now known as {new}"));
        let mut identity = self.identity.write();
        if identity.is_me(old) {
            info!(old, new, "Own nickname changed");
            identity.nickname = new.to_string();
        }
    }

    pub fn mark_joined(&self, channel: &str) {
        self.channels.write().insert(channel.to_string());
    }

    /// Joined channels, sorted.
    pub fn channels(&self) -> Vec<String> {
        self.channels.read().iter().cloned().collect()
    }
}

impl std::fmt::Debug for Session {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Session")
            .field("identity", &*self.identity.read())
            .field("channels", &*self.channels.read())
            .field("chatlog", &self.chatlog)
            .finish_non_exhaustive()
    }
}
