//! demibot Runtime - the per-connection half of demibot.
//!
//! This crate provides:
//! - The [`Client`], which implements the transport callbacks, normalizes
//!   addressing and routes commands and events
//! - The [`Session`] holding per-connection state (identity, settings, chat log)
//! - Built-in commands (`ping`, `timer`, `logs`, `rehash`)
//! - The rehash state machine ([`Rehasher`])
//! - Configuration loading and validation
//! - Logging configuration
//!
//! ```ignore
//! use demibot_runtime::{Client, FileConfigSource, load_config_from_file};
//! use demibot_framework::ModuleCatalog;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = load_config_from_file("demibot.toml")?;
//!     demibot_runtime::logging::init_from_config(&config.logging);
//!
//!     let client = Client::builder(transport, config)
//!         .config_source(FileConfigSource::new("demibot.toml"))
//!         .modules(ModuleCatalog::new().with(&GREET))
//!         .build()?;
//!     client.connect().await?;
//!     Ok(())
//! }
//! ```
//!
//! # Rehash
//!
//! An admin sending `rehash` reloads every module from the module source;
//! `rehash conf` first re-reads the configuration. Modules are swapped one by
//! one, so handlers already running finish against the instance they started
//! with.

pub mod auth;
pub mod builtins;
pub mod chatlog;
pub mod client;
pub mod config;
pub mod error;
pub mod logging;
pub mod rehash;
pub mod session;

#[cfg(test)]
pub(crate) mod testing;

// Re-exports
pub use auth::{AdminList, Authorizer};
pub use builtins::Builtin;
pub use chatlog::ChatLog;
pub use client::{Client, ClientBuilder};
pub use config::{
    BotConfig, ConfigError, ConfigLoader, ConfigResult, ConfigSource, FileConfigSource,
    load_config, load_config_from_file,
};
pub use error::{ClientError, ClientResult};
pub use logging::LoggingBuilder;
pub use rehash::{RehashError, RehashResult, RehashState, RehashStep, Rehasher};
pub use session::{Normalized, Session, SessionSettings};

// Re-export tracing for use by other crates
pub use tracing;
pub use tracing_subscriber;

/// Prelude module for convenient imports.
///
/// This provides all the commonly used logging macros:
/// - `trace!`, `debug!`, `info!`, `warn!`, `error!`
/// - `span`, `event`
/// - `instrument` attribute
/// - `Level` for span creation
pub mod prelude {
    pub use tracing::{Level, debug, error, info, instrument, span, trace, warn};
}
