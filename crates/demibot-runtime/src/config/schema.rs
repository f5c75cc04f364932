//! Configuration schema definitions.
//!
//! ```toml
//! admins = ["alice!alice@admin.example.org", "bob"]
//!
//! [identity]
//! nickname = "demibot"
//! username = "demibot"
//! realname = "demibot"
//!
//! [network]
//! server = "irc.example.org"
//! channels = ["#demibot"]
//! nickserv_password = "hunter2"
//!
//! [bot]
//! prefix = "."
//! wrap_width = 400
//! command_matching = "case_insensitive"
//! logfile = "demibot.log"
//!
//! [logging]
//! level = "debug"
//! filters = { demibot_framework = "trace" }
//!
//! [plugins]
//! enabled = ["greet"]
//! settings.greet = { greeting = "hi" }
//! ```

use std::collections::HashMap;
use std::path::PathBuf;

use demibot_core::Identity;
use demibot_framework::CommandMatching;
use demibot_framework::reply::{DEFAULT_CONTINUATION, DEFAULT_WRAP_WIDTH};
use serde::{Deserialize, Serialize};

/// Root configuration structure.
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
pub struct BotConfig {
    /// Who the client is on the network.
    #[serde(default)]
    pub identity: IdentityConfig,

    /// Where the client connects and what it joins.
    #[serde(default)]
    pub network: NetworkConfig,

    /// Session behaviour: prefix, reply wrapping, nickname retry, chat log.
    #[serde(default)]
    pub bot: SessionConfig,

    /// Users allowed to run admin commands, as bare nicknames or full
    /// `nick!user@host` masks.
    #[serde(default)]
    pub admins: Vec<String>,

    /// Diagnostic logging.
    #[serde(default)]
    pub logging: LoggingConfig,

    /// Plugin module selection and per-module settings.
    #[serde(default)]
    pub plugins: PluginsConfig,
}

// =============================================================================
// Identity & network
// =============================================================================

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct IdentityConfig {
    #[serde(default = "default_name")]
    pub nickname: String,

    #[serde(default = "default_name")]
    pub username: String,

    #[serde(default = "default_name")]
    pub realname: String,
}

impl Default for IdentityConfig {
    fn default() -> Self {
        Self {
            nickname: default_name(),
            username: default_name(),
            realname: default_name(),
        }
    }
}

impl IdentityConfig {
    /// Builds the session identity.
    pub fn to_identity(&self) -> Identity {
        Identity::new(&self.nickname, &self.username, &self.realname)
    }
}

fn default_name() -> String {
    "demibot".to_string()
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct NetworkConfig {
    /// Server name, used in log entries.
    #[serde(default = "default_server")]
    pub server: String,

    /// Channels joined after sign-on, in order.
    #[serde(default)]
    pub channels: Vec<String>,

    /// Sent to NickServ as `IDENTIFY <password>` after sign-on.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub nickserv_password: Option<String>,
}

impl Default for NetworkConfig {
    fn default() -> Self {
        Self {
            server: default_server(),
            channels: Vec::new(),
            nickserv_password: None,
        }
    }
}

fn default_server() -> String {
    "localhost".to_string()
}

// =============================================================================
// Session
// =============================================================================

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SessionConfig {
    /// Leading text that marks a message as a command.
    #[serde(default = "default_prefix")]
    pub prefix: String,

    /// Maximum reply chunk width, in characters.
    #[serde(default = "default_wrap_width")]
    pub wrap_width: usize,

    /// Marker prefixed to every reply chunk after the first.
    #[serde(default = "default_continuation")]
    pub continuation: String,

    /// Appended to the nickname on every collision.
    #[serde(default = "default_nick_suffix")]
    pub nick_suffix: String,

    /// Give up after this many collisions. Unbounded when unset.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_nick_retries: Option<u32>,

    /// How plugin command names are matched.
    #[serde(default)]
    pub command_matching: CommandMatching,

    /// Chat log file, opened in append mode.
    #[serde(default = "default_logfile")]
    pub logfile: PathBuf,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            prefix: default_prefix(),
            wrap_width: default_wrap_width(),
            continuation: default_continuation(),
            nick_suffix: default_nick_suffix(),
            max_nick_retries: None,
            command_matching: CommandMatching::default(),
            logfile: default_logfile(),
        }
    }
}

fn default_prefix() -> String {
    ".".to_string()
}

fn default_wrap_width() -> usize {
    DEFAULT_WRAP_WIDTH
}

fn default_continuation() -> String {
    DEFAULT_CONTINUATION.to_string()
}

fn default_nick_suffix() -> String {
    "_".to_string()
}

fn default_logfile() -> PathBuf {
    PathBuf::from("demibot.log")
}

// =============================================================================
// Logging
// =============================================================================

/// Diagnostic log level.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Trace,
    Debug,
    #[default]
    Info,
    Warn,
    Error,
}

impl LogLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Trace => "trace",
            Self::Debug => "debug",
            Self::Info => "info",
            Self::Warn => "warn",
            Self::Error => "error",
        }
    }

    pub fn to_tracing_level(self) -> tracing::Level {
        match self {
            Self::Trace => tracing::Level::TRACE,
            Self::Debug => tracing::Level::DEBUG,
            Self::Info => tracing::Level::INFO,
            Self::Warn => tracing::Level::WARN,
            Self::Error => tracing::Level::ERROR,
        }
    }
}

impl std::fmt::Display for LogLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Log line format.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Compact,
    Full,
    Pretty,
    /// Requires the `json-log` feature; falls back to `compact` without it.
    Json,
}

/// Log destination.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogOutput {
    #[default]
    Stdout,
    Stderr,
    File,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct LoggingConfig {
    #[serde(default)]
    pub level: LogLevel,

    #[serde(default)]
    pub format: LogFormat,

    #[serde(default)]
    pub output: LogOutput,

    /// Log file, required when `output = "file"`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub file_path: Option<PathBuf>,

    /// Include thread ids in log lines.
    #[serde(default)]
    pub thread_ids: bool,

    /// Include source file and line in log lines.
    #[serde(default)]
    pub file_location: bool,

    /// Per-target level overrides, e.g. `demibot_framework = "trace"`.
    #[serde(default)]
    pub filters: HashMap<String, LogLevel>,
}

// =============================================================================
// Plugins
// =============================================================================

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct PluginsConfig {
    /// Modules to load. Every registered module is loaded when unset.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub enabled: Option<Vec<String>>,

    /// Per-module config sections, keyed by module name.
    #[serde(default)]
    pub settings: HashMap<String, serde_json::Value>,
}
