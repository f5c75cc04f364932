//! Unified error types for the demibot core.
//!
//! Framework-level errors (handler failures, module loading) are defined in
//! demibot-framework; session-level errors in demibot-runtime.

use thiserror::Error;

// =============================================================================
// Transport Errors
// =============================================================================

/// Errors reported by a [`Transport`](crate::Transport) implementation.
#[derive(Debug, Clone, Error)]
pub enum TransportError {
    /// Connection could not be established.
    #[error("connection failed: {server} - {reason}")]
    ConnectionFailed {
        /// The server that failed to connect.
        server: String,
        /// Reason for failure.
        reason: String,
    },

    /// The connection is gone; nothing can be sent.
    #[error("connection closed: {reason}")]
    ConnectionClosed {
        /// Reason for closure.
        reason: String,
    },

    /// Message send failed.
    #[error("failed to send to '{target}': {reason}")]
    SendFailed {
        /// The target the message was addressed to.
        target: String,
        /// Reason for failure.
        reason: String,
    },

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(String),
}

impl From<std::io::Error> for TransportError {
    fn from(err: std::io::Error) -> Self {
        Self::Io(err.to_string())
    }
}

// =============================================================================
// Chat Log Errors
// =============================================================================

/// Errors raised by a [`ChatLogBackend`](crate::ChatLogBackend).
#[derive(Debug, Error)]
pub enum ChatLogError {
    /// The log could not be opened.
    #[error("failed to open chat log '{path}': {source}")]
    Open {
        /// Path of the log file.
        path: String,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// An entry could not be written.
    #[error("failed to write chat log entry: {0}")]
    Write(#[from] std::io::Error),
}

// =============================================================================
// Result Type Aliases
// =============================================================================

/// Result type for transport operations.
pub type TransportResult<T> = Result<T, TransportError>;

/// Result type for chat log operations.
pub type ChatLogResult<T> = Result<T, ChatLogError>;
