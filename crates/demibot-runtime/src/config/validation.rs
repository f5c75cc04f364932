//! Configuration validation utilities.

use std::collections::HashSet;

use super::error::{ConfigError, ConfigResult};
use super::schema::{BotConfig, IdentityConfig, LogOutput, NetworkConfig, SessionConfig};

/// Validates the entire configuration.
pub fn validate_config(config: &BotConfig) -> ConfigResult<()> {
    validate_identity(&config.identity)?;
    validate_network(&config.network)?;
    validate_session(&config.bot)?;

    if config.admins.iter().any(|admin| admin.trim().is_empty()) {
        return Err(ConfigError::validation("Admin entries cannot be empty"));
    }

    if config.logging.output == LogOutput::File && config.logging.file_path.is_none() {
        return Err(ConfigError::missing_field("logging.file_path"));
    }

    Ok(())
}

fn validate_identity(identity: &IdentityConfig) -> ConfigResult<()> {
    for (field, value) in [
        ("identity.nickname", &identity.nickname),
        ("identity.username", &identity.username),
    ] {
        if value.is_empty() {
            return Err(ConfigError::missing_field(field));
        }
        if value.chars().any(char::is_whitespace) {
            return Err(ConfigError::validation(format!(
                "{field} cannot contain whitespace: {value:?}"
            )));
        }
    }
    Ok(())
}

fn validate_network(network: &NetworkConfig) -> ConfigResult<()> {
    if network.server.is_empty() {
        return Err(ConfigError::missing_field("network.server"));
    }

    let mut seen = HashSet::new();
    for channel in &network.channels {
        if !channel.starts_with(['#', '&', '+', '!']) || channel.len() < 2 {
            return Err(ConfigError::validation(format!(
                "Invalid channel name: {channel:?}"
            )));
        }
        if !seen.insert(channel.to_lowercase()) {
            return Err(ConfigError::validation(format!(
                "Duplicate channel: {channel}"
            )));
        }
    }

    Ok(())
}

fn validate_session(session: &SessionConfig) -> ConfigResult<()> {
    if session.prefix.is_empty() {
        return Err(ConfigError::missing_field("bot.prefix"));
    }
    if session.prefix.chars().any(char::is_whitespace) {
        return Err(ConfigError::validation("Command prefix cannot contain whitespace"));
    }

    if session.nick_suffix.is_empty() {
        return Err(ConfigError::missing_field("bot.nick_suffix"));
    }

    // Continuation chunks need room for at least one character after the marker.
    if session.wrap_width <= session.continuation.chars().count() {
        return Err(ConfigError::validation(format!(
            "Wrap width {} leaves no room after the continuation marker {:?}",
            session.wrap_width, session.continuation
        )));
    }

    Ok(())
}
