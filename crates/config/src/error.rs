//! Configuration Error Types
//!
//! Every variant is a construction error: fix the identifier, the config file
//! or the environment and try again.

use derive_more::{Display, Error};

/// A configuration error with automatic location tracking.
pub type Error = exn::Exn<ErrorKind>;
/// Result type alias for configuration operations.
pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Display, Error, Clone, PartialEq, Eq)]
pub enum ErrorKind {
    /// The identifier is not a valid `scheme://host/path?query` URI.
    #[display("invalid emitter identifier: {_0}")]
    InvalidIdentifier(#[error(not(source))] String),
    /// The identifier path does not name exactly one repository.
    #[display("invalid path: {_0:?}")]
    InvalidPath(#[error(not(source))] String),
    /// The `access_token` option is required by this scheme.
    #[display("missing access token")]
    MissingToken,
    /// An option was present but its value could not be parsed.
    #[display("invalid value for option {_0}")]
    InvalidOption(#[error(not(source))] String),
    /// Merging defaults, the config file and the environment failed.
    #[display("failed to load configuration")]
    Load,
}

impl ErrorKind {
    /// Returns `true` if retrying might succeed.
    pub fn is_retryable(&self) -> bool {
        false
    }
}
