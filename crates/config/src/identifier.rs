use crate::error::{ErrorKind, Result};
use exn::ResultExt;
use percent_encoding::percent_decode_str;
use std::fmt;
use std::str::FromStr;
use url::Url;

/// A parsed emitter identifier: `scheme://host/path?query`.
///
/// For `githubapi` the host is the repository owner and the path is the
/// repository name; for `directory` the path is the root directory. Query
/// pairs are kept in order, duplicates included.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Identifier {
    scheme: String,
    host: Option<String>,
    path: String,
    query: Vec<(String, String)>,
}
impl Identifier {
    pub fn parse(uri: &str) -> Result<Self> {
        let url = Url::parse(uri).or_raise(|| ErrorKind::InvalidIdentifier(uri.to_string()))?;
        let path = url
            .path_segments()
            .map(|segments| {
                segments
                    .map(|segment| percent_decode_str(segment).decode_utf8())
                    .collect::<std::result::Result<Vec<_>, _>>()
                    .map(|decoded| decoded.join("/"))
            })
            .transpose()
            .or_raise(|| ErrorKind::InvalidIdentifier(uri.to_string()))?
            .unwrap_or_default();
        Ok(Self {
            scheme: url.scheme().to_string(),
            host: url.host_str().filter(|host| !host.is_empty()).map(String::from),
            path,
            query: url.query_pairs().map(|(k, v)| (k.into_owned(), v.into_owned())).collect(),
        })
    }

    pub fn scheme(&self) -> &str {
        &self.scheme
    }

    pub fn host(&self) -> Option<&str> {
        self.host.as_deref()
    }

    /// The decoded path, without its leading slash.
    pub fn path(&self) -> &str {
        &self.path
    }

    pub fn query(&self) -> &[(String, String)] {
        &self.query
    }

    /// The last value given for `key`, if any.
    pub fn get(&self, key: &str) -> Option<&str> {
        self.query.iter().rev().find(|(k, _)| k == key).map(|(_, v)| v.as_str())
    }

    /// Owner and repository for a repository-scoped scheme.
    ///
    /// The path must be exactly one non-empty segment.
    pub fn repository(&self) -> Result<(&str, &str)> {
        let Some(owner) = self.host() else {
            exn::bail!(ErrorKind::InvalidIdentifier(self.to_string()));
        };
        let segments: Vec<&str> = self.path.split('/').collect();
        match segments.as_slice() {
            [repo] if !repo.is_empty() => Ok((owner, repo)),
            _ => exn::bail!(ErrorKind::InvalidPath(self.path.clone())),
        }
    }
}
impl FromStr for Identifier {
    type Err = crate::error::Error;
    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        Self::parse(s)
    }
}
impl fmt::Display for Identifier {
    /// Renders without the query, which may carry credentials.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}://{}/{}", self.scheme, self.host.as_deref().unwrap_or_default(), self.path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[test]
    fn test_parse_githubapi() {
        let id = Identifier::parse(
            "githubapi://whosonfirst-data/whosonfirst-data-admin-us?access_token=abc&branch=main&concurrent=true",
        )
        .unwrap();
        assert_eq!(id.scheme(), "githubapi");
        assert_eq!(id.host(), Some("whosonfirst-data"));
        assert_eq!(id.repository().unwrap(), ("whosonfirst-data", "whosonfirst-data-admin-us"));
        assert_eq!(id.get("access_token"), Some("abc"));
        assert_eq!(id.get("branch"), Some("main"));
        assert_eq!(id.get("missing"), None);
    }

    #[test]
    fn test_repeated_query_keys_are_kept() {
        let id = Identifier::parse("githubapi://o/r?include=a%3D1&include=b%3D2&branch=x&branch=y").unwrap();
        let includes: Vec<_> = id.query().iter().filter(|(k, _)| k == "include").map(|(_, v)| v.as_str()).collect();
        assert_eq!(includes, ["a=1", "b=2"]);
        assert_eq!(id.get("branch"), Some("y"));
    }

    #[rstest]
    #[case("githubapi://owner")]
    #[case("githubapi://owner/")]
    #[case("githubapi://owner/a/b")]
    #[case("githubapi://owner/repo/")]
    fn test_repository_needs_one_segment(#[case] uri: &str) {
        let err = Identifier::parse(uri).unwrap().repository().unwrap_err();
        assert!(matches!(&*err, ErrorKind::InvalidPath(_)));
    }

    #[test]
    fn test_repository_needs_owner() {
        let err = Identifier::parse("directory:///tmp/data").unwrap().repository().unwrap_err();
        assert!(matches!(&*err, ErrorKind::InvalidIdentifier(_)));
    }

    #[rstest]
    #[case("directory:///srv/my%20data", "srv/my data")]
    #[case("directory:///srv/100%25", "srv/100%")]
    #[case("directory:///srv/%zz", "srv/%zz")]
    #[case("directory:///srv/caf%C3%A9", "srv/caf\u{e9}")]
    fn test_directory_path_is_decoded(#[case] uri: &str, #[case] expected: &str) {
        let id = Identifier::parse(uri).unwrap();
        assert_eq!(id.host(), None);
        assert_eq!(id.path(), expected);
    }

    #[rstest]
    #[case("not a uri")]
    #[case("")]
    #[case("directory:///srv/%FF")]
    fn test_invalid_identifier(#[case] uri: &str) {
        let err = Identifier::parse(uri).unwrap_err();
        assert!(matches!(&*err, ErrorKind::InvalidIdentifier(_)));
    }

    #[test]
    fn test_display_hides_query() {
        let id = Identifier::parse("githubapi://o/r?access_token=secret").unwrap();
        assert_eq!(id.to_string(), "githubapi://o/r");
    }
}
