//! In-memory content source for testing.

use crate::error::{ErrorKind, Result};
use crate::{ContentSource, FileBody, RemoteFile, RemotePath, TreeNode};
use async_trait::async_trait;
use std::collections::{BTreeMap, BTreeSet, HashMap, HashSet};
use std::sync::Arc;
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

/// In-memory content source for testing.
///
/// Directories are implied by file paths and listed in lexical order, which
/// matches what the GitHub contents API does. Failures and delays can be
/// injected per path, and every fetch and body load is counted so tests can
/// assert on how much work a walk did.
///
/// # Examples
///
/// Requires the `mock` feature.
///
/// ```ignore
/// use canopy_source::backend::MockSource;
/// use canopy_source::{ContentSource, RemotePath, TreeNode};
///
/// # #[tokio::main(flavor = "current_thread")]
/// # async fn main() -> Result<(), Box<dyn std::error::Error>> {
/// let source = MockSource::with_files([
///     ("data/a.geojson", "{}"),
///     ("data/sub/c.geojson", "{}"),
/// ]);
/// let TreeNode::Directory(children) = source.fetch(&"data".parse()?).await? else {
///     panic!("expected a directory");
/// };
/// assert_eq!(children, vec![RemotePath::new("data/a.geojson")?, RemotePath::new("data/sub")?]);
/// # Ok(())
/// # }
/// ```
pub struct MockSource {
    name: String,
    files: BTreeMap<RemotePath, Vec<u8>>,
    empty: HashSet<RemotePath>,
    failures: HashSet<RemotePath>,
    body_failures: HashSet<RemotePath>,
    delays: HashMap<RemotePath, Duration>,
    fetches: AtomicUsize,
    loads: Arc<AtomicUsize>,
    fetched: Mutex<Vec<RemotePath>>,
}

impl MockSource {
    /// Create a mock source pre-populated with files.
    ///
    /// Panics if any path fails validation. If test setup is wrong, then test
    /// should not pass.
    pub fn with_files(files: impl IntoIterator<Item = (impl AsRef<str>, impl Into<Vec<u8>>)>) -> Self {
        let files = files.into_iter().map(|(path, data)| (Self::path(path), data.into())).collect();
        Self {
            name: "mock".to_string(),
            files,
            empty: HashSet::new(),
            failures: HashSet::new(),
            body_failures: HashSet::new(),
            delays: HashMap::new(),
            fetches: AtomicUsize::new(0),
            loads: Arc::new(AtomicUsize::new(0)),
            fetched: Mutex::new(Vec::new()),
        }
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    /// Make fetching `path` fail with a network error.
    pub fn with_failure(mut self, path: impl AsRef<str>) -> Self {
        self.failures.insert(Self::path(path));
        self
    }

    /// Make loading the body of the file at `path` fail.
    pub fn with_body_failure(mut self, path: impl AsRef<str>) -> Self {
        self.body_failures.insert(Self::path(path));
        self
    }

    /// Sleep before answering a fetch of `path`.
    pub fn with_delay(mut self, path: impl AsRef<str>, delay: Duration) -> Self {
        self.delays.insert(Self::path(path), delay);
        self
    }

    /// Add an entry that is neither a file nor a directory (like a symlink).
    pub fn with_empty(mut self, path: impl AsRef<str>) -> Self {
        self.empty.insert(Self::path(path));
        self
    }

    /// Number of [`fetch()`](ContentSource::fetch) calls so far.
    pub fn fetch_count(&self) -> usize {
        self.fetches.load(Ordering::SeqCst)
    }

    /// Number of file bodies materialized so far.
    pub fn load_count(&self) -> usize {
        self.loads.load(Ordering::SeqCst)
    }

    /// Every fetched path, in the order the fetches started.
    pub fn fetched(&self) -> Vec<RemotePath> {
        self.fetched.lock().map(|guard| guard.clone()).unwrap_or_default()
    }

    fn path(path: impl AsRef<str>) -> RemotePath {
        let Ok(validated) = RemotePath::new(path.as_ref()) else {
            // The panic here is DELIBERATE. MockSource is intended to be used
            // in tests; panics are expected. There is no error result.
            panic!("MockSource: invalid path {:?}", path.as_ref());
        };
        validated
    }

    fn children(&self, dir: &RemotePath) -> Vec<RemotePath> {
        let mut children = BTreeSet::new();
        for path in self.files.keys().chain(self.empty.iter()) {
            let Some(rest) = path.as_str().strip_prefix(dir.as_str()).and_then(|rest| rest.strip_prefix('/')) else {
                continue;
            };
            let first = rest.split('/').next().unwrap_or(rest);
            if let Ok(child) = dir.join(first) {
                children.insert(child);
            }
        }
        children.into_iter().collect()
    }
}
impl Default for MockSource {
    fn default() -> Self {
        let files: [(&str, &str); 0] = [];
        Self::with_files(files)
    }
}

#[async_trait]
impl ContentSource for MockSource {
    fn name(&self) -> &str {
        &self.name
    }

    async fn fetch(&self, path: &RemotePath) -> Result<TreeNode> {
        self.fetches.fetch_add(1, Ordering::SeqCst);
        if let Ok(mut fetched) = self.fetched.lock() {
            fetched.push(path.clone());
        }
        if let Some(delay) = self.delays.get(path) {
            tokio::time::sleep(*delay).await;
        }
        if self.failures.contains(path) {
            exn::bail!(ErrorKind::Network(format!("injected failure for {path}")));
        }
        if self.empty.contains(path) {
            return Ok(TreeNode::Empty);
        }
        if let Some(data) = self.files.get(path) {
            let body = MockBody {
                data: data.clone(),
                fail: self.body_failures.contains(path),
                loads: Arc::clone(&self.loads),
            };
            return Ok(TreeNode::File(RemoteFile::new(path.clone(), body)));
        }
        let children = self.children(path);
        if children.is_empty() {
            exn::bail!(ErrorKind::NotFound(path.to_string()));
        }
        Ok(TreeNode::Directory(children))
    }
}

struct MockBody {
    data: Vec<u8>,
    fail: bool,
    loads: Arc<AtomicUsize>,
}

#[async_trait]
impl FileBody for MockBody {
    async fn load(&self) -> Result<Vec<u8>> {
        self.loads.fetch_add(1, Ordering::SeqCst);
        if self.fail {
            exn::bail!(ErrorKind::Network("injected body failure".to_string()));
        }
        Ok(self.data.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn path(s: &str) -> RemotePath {
        RemotePath::new(s).unwrap()
    }

    fn tree() -> MockSource {
        MockSource::with_files([
            ("data/b.txt", "text"),
            ("data/a.geojson", "{}"),
            ("data/sub/c.geojson", "{}"),
            ("database/d.geojson", "{}"),
        ])
    }

    #[tokio::test]
    async fn test_directory_listing_is_lexical() {
        let TreeNode::Directory(children) = tree().fetch(&path("data")).await.unwrap() else {
            panic!("expected a directory");
        };
        assert_eq!(children, vec![path("data/a.geojson"), path("data/b.txt"), path("data/sub")]);
    }

    #[tokio::test]
    async fn test_file_body_is_lazy() {
        let source = tree();
        let TreeNode::File(file) = source.fetch(&path("data/a.geojson")).await.unwrap() else {
            panic!("expected a file");
        };
        assert_eq!(source.load_count(), 0);
        assert_eq!(file.load().await.unwrap(), b"{}");
        assert_eq!(source.load_count(), 1);
    }

    #[tokio::test]
    async fn test_missing_path() {
        let err = tree().fetch(&path("nope")).await.unwrap_err();
        assert!(matches!(&*err, ErrorKind::NotFound(_)));
    }

    #[tokio::test]
    async fn test_injected_failures() {
        let source = tree().with_failure("data/sub").with_body_failure("data/a.geojson");
        let err = source.fetch(&path("data/sub")).await.unwrap_err();
        assert!(matches!(&*err, ErrorKind::Network(_)));
        let TreeNode::File(file) = source.fetch(&path("data/a.geojson")).await.unwrap() else {
            panic!("expected a file");
        };
        assert!(file.load().await.is_err());
        assert_eq!(source.fetch_count(), 2);
        assert_eq!(source.fetched(), vec![path("data/sub"), path("data/a.geojson")]);
    }

    #[tokio::test]
    async fn test_empty_entries() {
        let source = tree().with_empty("data/link");
        assert!(matches!(source.fetch(&path("data/link")).await.unwrap(), TreeNode::Empty));
        let TreeNode::Directory(children) = source.fetch(&path("data")).await.unwrap() else {
            panic!("expected a directory");
        };
        assert!(children.contains(&path("data/link")));
    }

    #[test]
    #[should_panic(expected = "invalid path")]
    fn test_with_files_panics_on_bad_path() {
        MockSource::with_files([("../escape", "bad")]);
    }
}
