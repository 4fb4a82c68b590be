//! Filter Error Types
//!
//! This module provides structured errors using `exn` for automatic location
//! tracking and error tree construction.

use derive_more::{Display, Error};

/// A filter error with automatic location tracking.
pub type Error = exn::Exn<ErrorKind>;
/// Result type alias for filter operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Actionable error categories.
///
/// These describe what the caller should *do*, not what went wrong internally.
#[derive(Debug, Display, Error, Clone, PartialEq, Eq)]
pub enum ErrorKind {
    /// Reading or rewinding the candidate stream failed.
    #[display("I/O error")]
    Io,
    /// The candidate could not be parsed the way the filter requires.
    #[display("invalid or corrupted data")]
    InvalidData,
    /// A filter rule could not be compiled. Fix the configuration.
    #[display("invalid filter rule: {_0}")]
    InvalidRule(#[error(not(source))] String),
    /// A match mode other than `all` or `any`.
    #[display("invalid match mode: {_0}")]
    InvalidMode(#[error(not(source))] String),
}

impl ErrorKind {
    /// Returns `true` if retrying might succeed.
    pub fn is_retryable(&self) -> bool {
        matches!(self, ErrorKind::Io)
    }
}
