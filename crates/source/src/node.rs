//! Tree nodes returned by content sources.

use crate::RemotePath;
use crate::error::Result;
use async_trait::async_trait;
use std::fmt;

/// Deferred access to the raw bytes of a remote file.
///
/// Bodies are only materialized once a file has passed the cheap checks
/// (extension gate), so sources should do as little work as possible until
/// [`load()`](Self::load) is called.
#[async_trait]
pub trait FileBody: Send + Sync {
    /// Materialize the raw file contents.
    async fn load(&self) -> Result<Vec<u8>>;

    /// Whether [`load()`](Self::load) issues its own outbound request (and
    /// therefore needs a throttle token).
    fn is_remote(&self) -> bool {
        false
    }
}

/// A body whose bytes are already in memory.
pub struct InlineBody(Vec<u8>);
impl InlineBody {
    pub fn new(data: impl Into<Vec<u8>>) -> Self {
        Self(data.into())
    }
}

#[async_trait]
impl FileBody for InlineBody {
    async fn load(&self) -> Result<Vec<u8>> {
        Ok(self.0.clone())
    }
}

/// A file in the remote tree.
pub struct RemoteFile {
    pub path: RemotePath,
    pub name: String,
    body: Box<dyn FileBody>,
}
impl RemoteFile {
    pub fn new(path: RemotePath, body: impl FileBody + 'static) -> Self {
        Self::from_boxed(path, Box::new(body))
    }

    pub fn from_boxed(path: RemotePath, body: Box<dyn FileBody>) -> Self {
        let name = path.name().to_string();
        Self { path, name, body }
    }

    /// Override the display name (some APIs report it separately from the path).
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    pub fn body(&self) -> &dyn FileBody {
        self.body.as_ref()
    }

    /// Swap the body accessor, keeping path and name. Used by decorators.
    pub fn map_body(self, f: impl FnOnce(Box<dyn FileBody>) -> Box<dyn FileBody>) -> Self {
        Self {
            path: self.path,
            name: self.name,
            body: f(self.body),
        }
    }

    /// Shorthand for `self.body().load()`.
    pub async fn load(&self) -> Result<Vec<u8>> {
        self.body.load().await
    }
}
impl fmt::Debug for RemoteFile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RemoteFile")
            .field("path", &self.path)
            .field("name", &self.name)
            .field("remote_body", &self.body.is_remote())
            .finish()
    }
}

/// The result of fetching one [`RemotePath`].
#[derive(Debug)]
pub enum TreeNode {
    File(RemoteFile),
    /// Child paths, in the order the source listed them.
    Directory(Vec<RemotePath>),
    /// Neither a file nor a directory (symlinks, submodules, ...). Walkers
    /// treat this as a legitimate empty result.
    Empty,
}
impl TreeNode {
    pub fn kind(&self) -> &'static str {
        match self {
            Self::File(_) => "file",
            Self::Directory(_) => "directory",
            Self::Empty => "empty",
        }
    }
}
