//! Configuration for demibot.
//!
//! Layered loading (defaults, config file, `DEMIBOT_*` environment variables)
//! into a [`BotConfig`], plus validation and the [`ConfigSource`] used by
//! `rehash conf`.

pub mod error;
pub mod loader;
pub mod schema;
pub mod source;
pub mod validation;

pub use error::{ConfigError, ConfigResult};
pub use loader::{ConfigLoader, load_config, load_config_from_file};
pub use schema::{
    BotConfig, IdentityConfig, LogFormat, LogLevel, LogOutput, LoggingConfig, NetworkConfig,
    PluginsConfig, SessionConfig,
};
pub use source::{ConfigSource, FileConfigSource};
pub use validation::validate_config;
