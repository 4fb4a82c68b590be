//! Remote path validation.
//!
//! Remote paths are slash-separated and always relative to the source root
//! (for GitHub, the repository at a given branch). They are plain strings
//! rather than [`std::path::Path`] because the separator is fixed regardless
//! of the platform we happen to be running on.

use crate::error::{ErrorKind, Result};
use derive_more::Display;
use std::str::FromStr;

/// A validated, normalized path into a remote tree.
///
/// Never empty and never starting with a slash.
#[derive(Debug, Display, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct RemotePath(String);

impl RemotePath {
    /// Validates and normalizes a remote path.
    ///
    /// > **Note:** leading slashes are tolerated and stripped, since callers
    /// >           commonly hand over the path component of a URI.
    ///
    /// # Examples
    ///
    /// ```
    /// use canopy_source::RemotePath;
    /// // Valid paths
    /// assert!(RemotePath::new("data/a.geojson").is_ok());
    /// assert!(RemotePath::new("a/../b.geojson").is_ok()); // (never leaves the root)
    /// // Invalid paths
    /// assert!(RemotePath::new("../etc/passwd").is_err());
    /// assert!(RemotePath::new("").is_err());
    /// assert!(RemotePath::new("a\0b").is_err());
    /// // Paths get resolved
    /// assert_eq!(RemotePath::new("/data//./sub/").unwrap().as_str(), "data/sub");
    /// ```
    pub fn new(path: impl AsRef<str>) -> Result<Self> {
        let raw = path.as_ref();
        if raw.contains('\0') {
            exn::bail!(ErrorKind::InvalidPath(raw.to_string()));
        }
        let mut segments: Vec<&str> = Vec::new();
        for segment in raw.split('/') {
            match segment {
                "" | "." => {},
                ".." => {
                    if segments.pop().is_none() {
                        exn::bail!(ErrorKind::InvalidPath(raw.to_string()));
                    }
                },
                normal => segments.push(normal),
            }
        }
        if segments.is_empty() {
            exn::bail!(ErrorKind::InvalidPath(raw.to_string()));
        }
        Ok(Self(segments.join("/")))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Final segment of the path.
    pub fn name(&self) -> &str {
        self.0.rsplit('/').next().unwrap_or(&self.0)
    }

    /// Append a child segment (or relative sub-path) to this path.
    pub fn join(&self, child: impl AsRef<str>) -> Result<Self> {
        Self::new(format!("{}/{}", self.0, child.as_ref()))
    }

    /// Path of the enclosing directory, or `None` for a top-level entry.
    pub fn parent(&self) -> Option<Self> {
        self.0.rsplit_once('/').map(|(parent, _)| Self(parent.to_string()))
    }

    /// Component-wise prefix check; `data` contains `data/a` but not `database`.
    pub fn starts_with(&self, other: &RemotePath) -> bool {
        self.0 == other.0 || self.0.strip_prefix(&other.0).is_some_and(|rest| rest.starts_with('/'))
    }
}
impl FromStr for RemotePath {
    type Err = crate::error::Error;
    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        Self::new(s)
    }
}
impl AsRef<str> for RemotePath {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("data/a.geojson", "data/a.geojson")]
    #[case("simple.geojson", "simple.geojson")]
    #[case("a//b//c", "a/b/c")]
    #[case("a/./b/./c", "a/b/c")]
    #[case("/data/", "data")]
    #[case("data///", "data")]
    #[case("a/b/..", "a")]
    fn test_normalization(#[case] input: &str, #[case] expected: &str) {
        assert_eq!(RemotePath::new(input).unwrap().as_str(), expected);
    }

    #[rstest]
    #[case("")]
    #[case("/")]
    #[case(".")]
    #[case("./.")]
    #[case("..")]
    #[case("../etc/passwd")]
    #[case("a/../../b")]
    #[case("a\0b")]
    fn test_invalid(#[case] input: &str) {
        let err = RemotePath::new(input).unwrap_err();
        assert!(matches!(&*err, ErrorKind::InvalidPath(_)));
    }

    #[test]
    fn test_name_and_parent() {
        let path = RemotePath::new("data/sub/c.geojson").unwrap();
        assert_eq!(path.name(), "c.geojson");
        assert_eq!(path.parent().unwrap().as_str(), "data/sub");
        assert_eq!(RemotePath::new("top").unwrap().parent(), None);
        assert_eq!(RemotePath::new("top").unwrap().name(), "top");
    }

    #[test]
    fn test_join() {
        let path = RemotePath::new("data").unwrap();
        assert_eq!(path.join("sub/c.geojson").unwrap().as_str(), "data/sub/c.geojson");
        assert!(path.join("../../escape").is_err());
    }

    #[test]
    fn test_starts_with_is_component_based() {
        let data = RemotePath::new("data").unwrap();
        assert!(RemotePath::new("data/a").unwrap().starts_with(&data));
        assert!(data.starts_with(&data));
        assert!(!RemotePath::new("database").unwrap().starts_with(&data));
    }
}
