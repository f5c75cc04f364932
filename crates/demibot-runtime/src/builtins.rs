//! Built-in commands.
//!
//! Built-ins are answered by the client itself, inline, before plugin lookup.
//! A built-in name always wins over a plugin command of the same name.

use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, warn};

use demibot_core::nick_of;
use demibot_framework::{Outbox, ParseError};

use crate::chatlog::ChatLog;
use crate::client::Client;
use crate::session::Session;

/// The commands every client answers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Builtin {
    /// `ping` → `<nick>, Pong`.
    Ping,
    /// `timer <seconds> <message>` → `<nick>, <message>` after the delay.
    Timer,
    /// `logs [on|off]` → toggles or reports the chat log.
    Logs,
    /// `rehash [conf]` → reloads modules, and the configuration with `conf`. Admins only.
    Rehash,
}

impl Builtin {
    pub const ALL: [Builtin; 4] = [Self::Ping, Self::Timer, Self::Logs, Self::Rehash];

    pub fn name(&self) -> &'static str {
        match self {
            Self::Ping => "ping",
            Self::Timer => "timer",
            Self::Logs => "logs",
            Self::Rehash => "rehash",
        }
    }

    /// Looks up a built-in by its exact name.
    pub fn lookup(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|b| b.name() == name)
    }
}

/// One built-in invocation.
pub(crate) struct BuiltinCall<'a> {
    pub client: &'a Client,
    pub session: &'a Arc<Session>,
    pub outbox: &'a Arc<dyn Outbox>,
    pub user: &'a str,
    pub target: &'a str,
    pub args: &'a str,
}

impl BuiltinCall<'_> {
    async fn reply(&self, text: &str) {
        if let Err(e) = self.outbox.say(self.target, text).await {
            warn!(target = %self.target, error = %e, "Failed to send built-in reply");
        }
    }
}

impl Builtin {
    pub(crate) async fn run(self, call: BuiltinCall<'_>) {
        debug!(command = self.name(), user = call.user, "Running built-in command");
        let nick = nick_of(call.user);

        match self {
            Self::Ping => call.reply(&format!("{nick}, Pong")).await,
            Self::Timer => match parse_timer(call.args) {
                Ok((delay, message)) => call.client.defer(
                    call.session,
                    Arc::clone(call.outbox),
                    call.target.to_string(),
                    delay,
                    format!("{nick}, {message}"),
                ),
                Err(e) => call.reply(&format!("{nick}, {e}")).await,
            },
            Self::Logs => {
                let prefix = call.session.prefix();
                let reply = toggle_logs(call.session.chatlog(), &prefix, call.args);
                call.reply(&reply).await;
            }
            Self::Rehash => {
                if !call.client.authorizer().is_admin(call.user) {
                    debug!(user = call.user, "Ignoring rehash from non-admin");
                    return;
                }
                let reload_config = call.args == "conf";
                match call
                    .client
                    .rehash(call.session, call.outbox, call.target, reload_config)
                    .await
                {
                    Ok(()) => call.reply("Rehash OK").await,
                    Err(e) => call.reply(&format!("Rehash error: {e}")).await,
                }
            }
        }
    }
}

/// Splits `"<seconds> <message>"`.
pub(crate) fn parse_timer(args: &str) -> Result<(Duration, &str), ParseError> {
    let (when, message) = args.split_once(' ').unwrap_or((args, ""));
    if when.is_empty() {
        return Err(ParseError::Missing("delay"));
    }
    let secs: u64 = when.parse().map_err(|_| ParseError::InvalidNumber {
        what: "delay",
        value: when.to_string(),
    })?;
    Ok((Duration::from_secs(secs), message))
}

/// Applies `logs [on|off]` and returns the reply.
pub(crate) fn toggle_logs(chatlog: &ChatLog, prefix: &str, args: &str) -> String {
    let changed = match args {
        "off" => chatlog.disable(),
        "on" => chatlog.enable(),
        _ => Ok(false),
    };

    match changed {
        Ok(true) if chatlog.is_enabled() => "logs are now enabled.".to_string(),
        Ok(true) => "logs are now disabled.".to_string(),
        Ok(false) if chatlog.is_enabled() => {
            format!("logs are enabled. Use {prefix}logs off to disable logging.")
        }
        Ok(false) => format!("logs are disabled. Use {prefix}logs on to enable logging."),
        Err(e) => {
            warn!(path = %chatlog.path().display(), error = %e, "Chat log toggle failed");
            format!("logs error: {e}")
        }
    }
}
