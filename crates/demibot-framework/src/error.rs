//! Error types for the demibot framework.

use thiserror::Error;
use tower::BoxError;

/// Malformed command arguments.
///
/// Raised at the point of use and reported back to the issuing user as a plain
/// reply; it never reaches the session.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseError {
    /// An argument that should have been a number was not.
    #[error("'{value}' is not a valid {what}")]
    InvalidNumber {
        /// What the argument describes (e.g. "delay").
        what: &'static str,
        /// The offending input.
        value: String,
    },

    /// A required argument was not supplied.
    #[error("missing {0}")]
    Missing(&'static str),
}

/// Errors raised while discovering or loading plugin modules.
#[derive(Debug, Error)]
pub enum LoadError {
    /// No module with this name exists in the source.
    #[error("module '{0}' not found")]
    NotFound(String),

    /// The module factory failed.
    #[error("module '{module}' failed to load: {source}")]
    Init {
        /// Name of the module.
        module: String,
        /// Error returned by the factory.
        #[source]
        source: BoxError,
    },

    /// The module source itself could not be read.
    #[error("module source unavailable: {0}")]
    Source(String),
}

/// Result type for module loading.
pub type LoadResult<T> = Result<T, LoadError>;
