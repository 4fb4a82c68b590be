use crate::error::{ErrorKind, Result};
use crate::flag::parse_bool;
use canopy_filter::{DEFAULT_EXTENSION, QueryMode};
use derive_more::Display;
use serde::{Deserialize, Serialize};
use std::str::FromStr;
use std::time::Duration;

/// Milliseconds between two outbound requests, unless configured otherwise.
pub const DEFAULT_RATE_MS: u64 = 100;

/// What a worker does when its traversal is cancelled after it has already
/// fetched and accepted a file.
#[derive(Debug, Display, Default, Clone, Copy, PartialEq, Eq)]
pub enum InFlight {
    /// Emit it anyway. Cancellation only stops work that has not started.
    #[default]
    #[display("complete")]
    Complete,
    /// Check for cancellation again right before emitting, and skip if set.
    #[display("suppress")]
    Suppress,
}
impl FromStr for InFlight {
    type Err = crate::error::Error;
    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "complete" => Ok(Self::Complete),
            "suppress" => Ok(Self::Suppress),
            _ => exn::bail!(ErrorKind::InvalidOption(format!("in_flight={s}"))),
        }
    }
}

/// Every option a walker can be configured with.
///
/// Values are layered by [`Loader`](crate::Loader); identifier query options
/// are applied last with [`Options::apply_query`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Options {
    pub access_token: Option<String>,
    pub branch: Option<String>,
    #[serde(deserialize_with = "crate::flag::deserialize")]
    pub concurrent: bool,
    pub include: Vec<String>,
    pub exclude: Vec<String>,
    #[serde(with = "text")]
    pub include_mode: QueryMode,
    #[serde(with = "text")]
    pub exclude_mode: QueryMode,
    pub extension: Vec<String>,
    /// Milliseconds between requests; `0` disables throttling.
    pub rate: u64,
    /// Live workers per directory fan-out; `None` (or `0`) is unbounded.
    pub max_workers: Option<usize>,
    #[serde(with = "text")]
    pub in_flight: InFlight,
}
impl Default for Options {
    fn default() -> Self {
        Self {
            access_token: None,
            branch: None,
            concurrent: false,
            include: Vec::new(),
            exclude: Vec::new(),
            include_mode: QueryMode::All,
            exclude_mode: QueryMode::All,
            extension: vec![DEFAULT_EXTENSION.to_string()],
            rate: DEFAULT_RATE_MS,
            max_workers: None,
            in_flight: InFlight::Complete,
        }
    }
}
impl Options {
    pub fn rate(&self) -> Duration {
        Duration::from_millis(self.rate)
    }

    pub fn max_workers(&self) -> Option<usize> {
        self.max_workers.filter(|n| *n > 0)
    }

    /// The access token, or [`ErrorKind::MissingToken`].
    pub fn require_token(&self) -> Result<&str> {
        match self.access_token.as_deref() {
            Some(token) if !token.is_empty() => Ok(token),
            _ => exn::bail!(ErrorKind::MissingToken),
        }
    }

    /// Override with identifier query pairs.
    ///
    /// Empty values are ignored. The repeatable options (`include`, `exclude`,
    /// `extension`) replace the lower layers' list on first occurrence and
    /// append afterwards. Unknown keys are ignored.
    pub fn apply_query(&mut self, pairs: &[(String, String)]) -> Result<()> {
        let mut replaced: Vec<&str> = Vec::new();
        for (key, value) in pairs {
            if value.is_empty() {
                continue;
            }
            match key.as_str() {
                "access_token" => self.access_token = Some(value.clone()),
                "branch" => self.branch = Some(value.clone()),
                "concurrent" => {
                    self.concurrent =
                        parse_bool(value).ok_or_else(|| ErrorKind::InvalidOption(format!("concurrent={value}")))?;
                },
                list @ ("include" | "exclude" | "extension") => {
                    let target = match list {
                        "include" => &mut self.include,
                        "exclude" => &mut self.exclude,
                        _ => &mut self.extension,
                    };
                    if !replaced.contains(&list) {
                        target.clear();
                        replaced.push(list);
                    }
                    target.push(value.clone());
                },
                "include_mode" => self.include_mode = parse_mode(key, value)?,
                "exclude_mode" => self.exclude_mode = parse_mode(key, value)?,
                "rate" => {
                    self.rate = value.parse().map_err(|_| ErrorKind::InvalidOption(format!("rate={value}")))?;
                },
                "max_workers" => {
                    let n: usize =
                        value.parse().map_err(|_| ErrorKind::InvalidOption(format!("max_workers={value}")))?;
                    self.max_workers = Some(n).filter(|n| *n > 0);
                },
                "in_flight" => self.in_flight = value.parse()?,
                other => tracing::trace!(key = other, "Ignoring unknown option"),
            }
        }
        Ok(())
    }
}

fn parse_mode(key: &str, value: &str) -> Result<QueryMode> {
    value.parse().map_err(|_| ErrorKind::InvalidOption(format!("{key}={value}")).into())
}

/// Serde through `Display`/`FromStr`, so config files and environment
/// variables spell enums the same way identifiers do.
mod text {
    use serde::{Deserialize, Deserializer, Serializer, de};
    use std::fmt::Display;
    use std::str::FromStr;

    pub fn serialize<T: Display, S: Serializer>(value: &T, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(value)
    }

    pub fn deserialize<'de, T, D>(deserializer: D) -> Result<T, D::Error>
    where
        T: FromStr,
        D: Deserializer<'de>,
    {
        let value = String::deserialize(deserializer)?;
        value.parse().map_err(|_| de::Error::invalid_value(de::Unexpected::Str(&value), &"a known variant"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    fn pairs(query: &[(&str, &str)]) -> Vec<(String, String)> {
        query.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect()
    }

    #[test]
    fn test_defaults() {
        let options = Options::default();
        assert!(!options.concurrent);
        assert_eq!(options.rate(), Duration::from_millis(100));
        assert_eq!(options.extension, [".geojson"]);
        assert_eq!(options.in_flight, InFlight::Complete);
        assert_eq!(options.max_workers(), None);
    }

    #[test]
    fn test_apply_query() {
        let mut options = Options::default();
        options
            .apply_query(&pairs(&[
                ("access_token", "abc"),
                ("branch", "main"),
                ("concurrent", "T"),
                ("include", "properties.wof:placetype=locality"),
                ("include_mode", "ANY"),
                ("extension", "json"),
                ("extension", ".csv"),
                ("rate", "0"),
                ("max_workers", "8"),
                ("in_flight", "suppress"),
                ("unrelated", "ignored"),
            ]))
            .unwrap();
        assert_eq!(options.require_token().unwrap(), "abc");
        assert_eq!(options.branch.as_deref(), Some("main"));
        assert!(options.concurrent);
        assert_eq!(options.include, ["properties.wof:placetype=locality"]);
        assert_eq!(options.include_mode, QueryMode::Any);
        assert_eq!(options.extension, ["json", ".csv"]);
        assert_eq!(options.rate(), Duration::ZERO);
        assert_eq!(options.max_workers(), Some(8));
        assert_eq!(options.in_flight, InFlight::Suppress);
    }

    #[test]
    fn test_query_list_replaces_lower_layer() {
        let mut options = Options { exclude: vec!["from=file".to_string()], ..Options::default() };
        options.apply_query(&pairs(&[("exclude", "a=1"), ("exclude", "b=2")])).unwrap();
        assert_eq!(options.exclude, ["a=1", "b=2"]);
    }

    #[test]
    fn test_empty_values_are_ignored() {
        let mut options = Options { branch: Some("dev".to_string()), ..Options::default() };
        options.apply_query(&pairs(&[("branch", ""), ("concurrent", "")])).unwrap();
        assert_eq!(options.branch.as_deref(), Some("dev"));
        assert!(!options.concurrent);
    }

    #[rstest]
    #[case("concurrent", "yes")]
    #[case("include_mode", "some")]
    #[case("exclude_mode", "none")]
    #[case("rate", "fast")]
    #[case("max_workers", "-1")]
    #[case("in_flight", "drop")]
    fn test_invalid_option(#[case] key: &str, #[case] value: &str) {
        let err = Options::default().apply_query(&pairs(&[(key, value)])).unwrap_err();
        assert!(matches!(&*err, ErrorKind::InvalidOption(_)));
    }

    #[rstest]
    #[case(None)]
    #[case(Some(""))]
    fn test_missing_token(#[case] token: Option<&str>) {
        let options = Options { access_token: token.map(String::from), ..Options::default() };
        let err = options.require_token().unwrap_err();
        assert_eq!(*err, ErrorKind::MissingToken);
    }
}
