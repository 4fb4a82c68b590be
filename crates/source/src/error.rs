//! Source Error Types
//!
//! This module provides structured errors using `exn` for automatic location
//! tracking and error tree construction. Every variant is fatal to the walk
//! branch that produced it; sources never retry internally.

use derive_more::{Display, Error};
use std::io::Error as IoError;

/// A source error with automatic location tracking.
pub type Error = exn::Exn<ErrorKind>;
/// Result type alias for source operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Actionable error categories.
///
/// These describe what the caller should *do*, not what went wrong internally.
#[derive(Debug, Display, Error)]
pub enum ErrorKind {
    /// Nothing exists at the requested path
    #[display("not found: {_0}")]
    NotFound(#[error(not(source))] String),
    /// Access denied (bad or missing credentials)
    #[display("permission denied: {_0}")]
    PermissionDenied(#[error(not(source))] String),
    /// The remote API refused the request because its quota is exhausted
    #[display("rate limited: {_0}")]
    RateLimited(#[error(not(source))] String),
    /// Underlying I/O error
    #[display("I/O error: {_0}")]
    Io(IoError),
    /// Network-related error (connection, TLS, unexpected status)
    #[display("network error: {_0}")]
    Network(#[error(not(source))] String),
    /// The remote answered with something we could not make sense of
    #[display("invalid response: {_0}")]
    InvalidResponse(#[error(not(source))] String),
    /// Path is empty, absolute after normalization, or escapes the root
    #[display("invalid path: {_0:?}")]
    InvalidPath(#[error(not(source))] String),
}
impl From<IoError> for ErrorKind {
    fn from(err: IoError) -> Self {
        Self::Io(err)
    }
}

impl ErrorKind {
    /// Returns `true` if retrying might succeed.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Io(_) | Self::Network(_) | Self::RateLimited(_))
    }
}
