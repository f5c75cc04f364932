//! Runtime error types.

use thiserror::Error;

use demibot_core::TransportError;
use demibot_framework::LoadError;

use crate::config::ConfigError;

/// Errors that can occur while building or connecting a client.
#[derive(Error, Debug)]
pub enum ClientError {
    /// The configuration is invalid.
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// The initial module load failed.
    #[error("Module load error: {0}")]
    Load(#[from] LoadError),

    /// The transport refused to connect.
    #[error("Transport error: {0}")]
    Transport(#[from] TransportError),
}

/// Result type for client operations.
pub type ClientResult<T> = Result<T, ClientError>;
