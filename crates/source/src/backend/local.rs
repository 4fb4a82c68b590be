//! Local filesystem content source.
//!
//! Serves a directory on disk through the same interface as the remote
//! sources, which is handy for walking a checked-out copy of a repository.
//! Files are read lazily via `tokio::fs`.

use crate::error::{ErrorKind, Result};
use crate::{ContentSource, FileBody, RemoteFile, RemotePath, TreeNode};
use async_trait::async_trait;
use std::path::{Path, PathBuf};
use tokio::fs;

/// Local filesystem content source.
///
/// All remote paths are relative to the configured root directory. Directory
/// listings are sorted by name so sequential walks are deterministic.
/// Symbolic links are never followed and fetch as [`TreeNode::Empty`].
///
/// # Examples
///
/// ```no_run
/// use canopy_source::backend::LocalSource;
///
/// # fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let source = LocalSource::new("checkout", "/srv/whosonfirst-data")?;
/// # Ok(())
/// # }
/// ```
#[derive(Clone, Debug)]
pub struct LocalSource {
    name: String,
    /// Root directory of the tree
    root: PathBuf,
}
impl LocalSource {
    /// Create a new local source.
    ///
    /// # Errors
    ///
    /// Returns an error if the path is not absolute or is not a directory.
    pub fn new(name: impl Into<String>, root: impl AsRef<Path>) -> Result<Self> {
        let root = root.as_ref().to_path_buf();
        if !root.is_absolute() || !root.is_dir() {
            exn::bail!(ErrorKind::InvalidPath(root.display().to_string()));
        }
        Ok(Self { name: name.into(), root })
    }

    fn absolute_path(&self, path: &RemotePath) -> PathBuf {
        // RemotePath is already normalized and cannot escape the root.
        path.as_str().split('/').fold(self.root.clone(), |acc, segment| acc.join(segment))
    }

    fn map_io_error(e: std::io::Error, path: &RemotePath) -> ErrorKind {
        match e.kind() {
            std::io::ErrorKind::NotFound => ErrorKind::NotFound(path.to_string()),
            std::io::ErrorKind::PermissionDenied => ErrorKind::PermissionDenied(path.to_string()),
            _ => ErrorKind::Io(e),
        }
    }

    async fn list(&self, path: &RemotePath, absolute: &Path) -> Result<Vec<RemotePath>> {
        let mut entries = fs::read_dir(absolute).await.map_err(|e| Self::map_io_error(e, path))?;
        let mut names = Vec::new();
        while let Some(entry) = entries.next_entry().await.map_err(|e| Self::map_io_error(e, path))? {
            match entry.file_name().into_string() {
                Ok(name) => names.push(name),
                // Remote paths are UTF-8; there is no way to address this entry.
                Err(name) => tracing::warn!(source = %self.name, ?name, "Skipping non UTF-8 directory entry"),
            }
        }
        names.sort();
        names.into_iter().map(|name| path.join(name)).collect()
    }
}

#[async_trait]
impl ContentSource for LocalSource {
    fn name(&self) -> &str {
        &self.name
    }

    async fn fetch(&self, path: &RemotePath) -> Result<TreeNode> {
        let absolute = self.absolute_path(path);
        let metadata = fs::symlink_metadata(&absolute).await.map_err(|e| Self::map_io_error(e, path))?;
        if metadata.file_type().is_symlink() {
            tracing::trace!(source = %self.name, %path, "Not following symbolic link");
            return Ok(TreeNode::Empty);
        }
        if metadata.is_dir() {
            return Ok(TreeNode::Directory(self.list(path, &absolute).await?));
        }
        if metadata.is_file() {
            let body = LocalBody { path: path.clone(), absolute };
            return Ok(TreeNode::File(RemoteFile::new(path.clone(), body)));
        }
        // Sockets, FIFOs and friends.
        Ok(TreeNode::Empty)
    }
}

struct LocalBody {
    path: RemotePath,
    absolute: PathBuf,
}

#[async_trait]
impl FileBody for LocalBody {
    async fn load(&self) -> Result<Vec<u8>> {
        Ok(fs::read(&self.absolute).await.map_err(|e| LocalSource::map_io_error(e, &self.path))?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn path(s: &str) -> RemotePath {
        RemotePath::new(s).unwrap()
    }

    fn setup() -> (tempfile::TempDir, LocalSource) {
        let temp_dir = tempfile::tempdir().unwrap();
        std::fs::create_dir_all(temp_dir.path().join("data/sub")).unwrap();
        std::fs::write(temp_dir.path().join("data/b.txt"), b"text").unwrap();
        std::fs::write(temp_dir.path().join("data/a.geojson"), b"{}").unwrap();
        std::fs::write(temp_dir.path().join("data/sub/c.geojson"), b"{\"c\":1}").unwrap();
        let source = LocalSource::new("local", temp_dir.path()).unwrap();
        (temp_dir, source)
    }

    #[test]
    fn test_new_requires_absolute_directory() {
        let temp_dir = tempfile::tempdir().unwrap();
        assert!(LocalSource::new("name", temp_dir.path()).is_ok());
        assert!(LocalSource::new("name", "relative/path").is_err());
        assert!(LocalSource::new("name", temp_dir.path().join("missing")).is_err());
    }

    #[tokio::test]
    async fn test_directory_listing_is_sorted() {
        let (_dir, source) = setup();
        let TreeNode::Directory(children) = source.fetch(&path("data")).await.unwrap() else {
            panic!("expected a directory");
        };
        assert_eq!(children, vec![path("data/a.geojson"), path("data/b.txt"), path("data/sub")]);
    }

    #[tokio::test]
    async fn test_file_is_read_lazily() {
        let (dir, source) = setup();
        let TreeNode::File(file) = source.fetch(&path("data/sub/c.geojson")).await.unwrap() else {
            panic!("expected a file");
        };
        assert_eq!(file.name, "c.geojson");
        // Content is read at load time, not at fetch time.
        std::fs::write(dir.path().join("data/sub/c.geojson"), b"{\"c\":2}").unwrap();
        assert_eq!(file.load().await.unwrap(), b"{\"c\":2}");
    }

    #[tokio::test]
    async fn test_missing_path() {
        let (_dir, source) = setup();
        let err = source.fetch(&path("data/nope.geojson")).await.unwrap_err();
        assert!(matches!(&*err, ErrorKind::NotFound(_)));
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_symlinks_are_not_followed() {
        let (dir, source) = setup();
        std::os::unix::fs::symlink(".", dir.path().join("data/loop")).unwrap();
        std::os::unix::fs::symlink("a.geojson", dir.path().join("data/alias.geojson")).unwrap();
        let TreeNode::Directory(children) = source.fetch(&path("data")).await.unwrap() else {
            panic!("expected a directory");
        };
        assert!(children.contains(&path("data/loop")));
        assert!(matches!(source.fetch(&path("data/loop")).await.unwrap(), TreeNode::Empty));
        assert!(matches!(source.fetch(&path("data/alias.geojson")).await.unwrap(), TreeNode::Empty));
    }
}
