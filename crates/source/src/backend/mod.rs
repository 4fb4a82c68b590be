//! Content source trait and implementations.
//!
//! This module defines the [`ContentSource`] trait, the single boundary
//! between the tree walker and whatever actually stores the tree (the GitHub
//! contents API, a local directory, an in-memory fixture).

#[cfg(feature = "github")]
mod github;
mod local;
#[cfg(any(test, feature = "mock"))]
mod mock;
mod throttled;

#[cfg(feature = "github")]
pub use self::github::{DEFAULT_API_URL, GitHubSource};
pub use self::local::LocalSource;
#[cfg(any(test, feature = "mock"))]
pub use self::mock::MockSource;
pub use self::throttled::ThrottledSource;
use crate::error::Result;
use crate::{RemotePath, TreeNode};
use async_trait::async_trait;

/// Unified interface for walkable content sources.
///
/// Implementations answer one question: "what is at this path?" Either a
/// file (with a lazily loaded body), a directory (with an ordered list of
/// child paths), or nothing walkable.
///
/// # Errors
/// Any transport or API failure is returned as-is. Sources never retry; that
/// is a policy decision for the caller (see
/// [`ErrorKind::is_retryable`](crate::error::ErrorKind::is_retryable)).
///
/// # Examples
///
/// ```
/// use canopy_source::{ContentSource, RemotePath, TreeNode, error::Result};
///
/// async fn count_children(source: &dyn ContentSource, path: &RemotePath) -> Result<usize> {
///     Ok(match source.fetch(path).await? {
///         TreeNode::Directory(children) => children.len(),
///         TreeNode::File(_) | TreeNode::Empty => 0,
///     })
/// }
/// ```
#[async_trait]
pub trait ContentSource: Send + Sync {
    /// Name of the configured source (used for logging only).
    fn name(&self) -> &str;

    /// Fetch the node at `path`.
    ///
    /// Directory children must be returned in a stable order; sequential
    /// walks emit in exactly this order.
    async fn fetch(&self, path: &RemotePath) -> Result<TreeNode>;
}
