//! Walker Error Types
//!
//! Collaborator failures (source, filter, configuration) are raised as a
//! walker [`ErrorKind`] over the collaborator's own error tree, so the root
//! cause stays inspectable.

use derive_more::{Display, Error};

/// A walker error with automatic location tracking.
pub type Error = exn::Exn<ErrorKind>;
/// Result type alias for walker operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Classifies which stage of a walk failed.
///
/// ### Operational Errors
/// - [`ErrorKind::Callback`]
/// - [`ErrorKind::Worker`]
///
/// ### Dependency Errors
/// - [`ErrorKind::Fetch`]
/// - [`ErrorKind::Filter`]
/// - [`ErrorKind::Config`]
/// - [`ErrorKind::UnknownScheme`]
#[derive(Debug, Display, Error)]
pub enum ErrorKind {
    /// Fetching a node or materializing a file body failed.
    #[display("fetch failed")]
    Fetch,
    /// A filter could not evaluate a file.
    #[display("filter failed")]
    Filter,
    /// The emission callback returned an error.
    #[display("callback failed: {_0}")]
    Callback(#[error(not(source))] String),
    /// A concurrent worker panicked or was aborted.
    #[display("worker failed")]
    Worker,
    /// The walker could not be constructed from its identifier.
    #[display("invalid configuration")]
    Config,
    /// No constructor is registered for this scheme.
    #[display("unknown scheme {_0:?}")]
    UnknownScheme(#[error(not(source))] String),
}

impl ErrorKind {
    /// Returns `true` if retrying might succeed.
    ///
    /// Always `false` at this level; whether a failed fetch is worth retrying
    /// is answered by the source error underneath.
    pub fn is_retryable(&self) -> bool {
        false
    }
}
