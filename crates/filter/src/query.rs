//! Query filters over JSON documents.
//!
//! A query is written `{path}={regex}`, where `path` is a dotted path into
//! the document (`properties.wof:placetype`) and `regex` must match the value
//! found there. Queries are grouped into an *include* set and an *exclude*
//! set, each evaluated in one of two [`QueryMode`]s.
//!
//! Value matching rules:
//! - strings are matched raw, numbers/booleans/null by their JSON text,
//! - arrays match when any element matches,
//! - objects and missing paths never match.
//!
//! # Example
//!
//! ```
//! use canopy_filter::{Filter, QueryFilters, QueryMode};
//! use std::io::Cursor;
//!
//! let filters = QueryFilters::new()
//!     .include("properties.wof:placetype=^(locality|neighbourhood)$").unwrap()
//!     .exclude("properties.mz:is_current=0").unwrap();
//! let mut doc = Cursor::new(br#"{"properties": {"wof:placetype": "locality", "mz:is_current": 1}}"#.to_vec());
//! assert!(filters.apply(&mut doc).unwrap());
//! ```

use crate::ReadSeek;
use crate::error::{ErrorKind, Result};
use crate::filters::Filter;
use derive_more::Display;
use exn::ResultExt;
use regex::Regex;
use serde_json::Value;
use std::str::FromStr;

/// How the queries of one set combine.
#[derive(Debug, Display, Default, Clone, Copy, PartialEq, Eq)]
pub enum QueryMode {
    /// Every query must match.
    #[default]
    #[display("all")]
    All,
    /// At least one query must match.
    #[display("any")]
    Any,
}
impl FromStr for QueryMode {
    type Err = crate::error::Error;
    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "all" => Ok(Self::All),
            "any" => Ok(Self::Any),
            _ => exn::bail!(ErrorKind::InvalidMode(s.to_string())),
        }
    }
}

/// A single `{path}={regex}` query.
#[derive(Debug, Clone)]
pub struct Query {
    path: Vec<String>,
    pattern: Regex,
}
impl Query {
    fn matches(&self, document: &Value) -> bool {
        let Some(value) = self.path.iter().try_fold(document, |current, segment| match current {
            Value::Object(map) => map.get(segment),
            Value::Array(items) => segment.parse::<usize>().ok().and_then(|index| items.get(index)),
            _ => None,
        }) else {
            return false;
        };
        self.matches_value(value)
    }

    fn matches_value(&self, value: &Value) -> bool {
        match value {
            Value::String(s) => self.pattern.is_match(s),
            Value::Number(_) | Value::Bool(_) | Value::Null => self.pattern.is_match(&value.to_string()),
            Value::Array(items) => items.iter().any(|item| !item.is_array() && self.matches_value(item)),
            Value::Object(_) => false,
        }
    }
}
impl FromStr for Query {
    type Err = crate::error::Error;
    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        let Some((path, pattern)) = s.split_once('=') else {
            exn::bail!(ErrorKind::InvalidRule(s.to_string()));
        };
        let path: Vec<String> = path.trim().split('.').map(String::from).collect();
        if path.iter().any(String::is_empty) {
            exn::bail!(ErrorKind::InvalidRule(s.to_string()));
        }
        let pattern = Regex::new(pattern).or_raise(|| ErrorKind::InvalidRule(s.to_string()))?;
        Ok(Self { path, pattern })
    }
}

#[derive(Debug, Clone, Default)]
struct QuerySet {
    queries: Vec<Query>,
    mode: QueryMode,
}
impl QuerySet {
    fn matches(&self, document: &Value) -> bool {
        match self.mode {
            QueryMode::All => self.queries.iter().all(|query| query.matches(document)),
            QueryMode::Any => self.queries.iter().any(|query| query.matches(document)),
        }
    }
}

/// Include/exclude query filtering of JSON (GeoJSON) documents.
///
/// A document passes when the include set is empty or matches, and the
/// exclude set is empty or does not match. Documents that are not valid JSON
/// are an error, not a rejection.
#[derive(Debug, Clone, Default)]
pub struct QueryFilters {
    include: QuerySet,
    exclude: QuerySet,
}
impl QueryFilters {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn include(mut self, query: &str) -> Result<Self> {
        self.include.queries.push(query.parse()?);
        Ok(self)
    }

    pub fn exclude(mut self, query: &str) -> Result<Self> {
        self.exclude.queries.push(query.parse()?);
        Ok(self)
    }

    pub fn include_mode(mut self, mode: QueryMode) -> Self {
        self.include.mode = mode;
        self
    }

    pub fn exclude_mode(mut self, mode: QueryMode) -> Self {
        self.exclude.mode = mode;
        self
    }

    /// Build from query lists, as found in an emitter identifier.
    pub fn from_rules(
        include: &[String],
        include_mode: QueryMode,
        exclude: &[String],
        exclude_mode: QueryMode,
    ) -> Result<Self> {
        let filters = Self::new().include_mode(include_mode).exclude_mode(exclude_mode);
        let filters = include.iter().try_fold(filters, |filters, query| filters.include(query))?;
        exclude.iter().try_fold(filters, |filters, query| filters.exclude(query))
    }

    pub fn is_empty(&self) -> bool {
        self.include.queries.is_empty() && self.exclude.queries.is_empty()
    }

    fn matches(&self, document: &Value) -> bool {
        if !self.include.queries.is_empty() && !self.include.matches(document) {
            return false;
        }
        if !self.exclude.queries.is_empty() && self.exclude.matches(document) {
            return false;
        }
        true
    }
}

impl Filter for QueryFilters {
    fn apply(&self, reader: &mut dyn ReadSeek) -> Result<bool> {
        if self.is_empty() {
            return Ok(true);
        }
        let document: Value = serde_json::from_reader(reader).or_raise(|| ErrorKind::InvalidData)?;
        let accepted = self.matches(&document);
        tracing::trace!(accepted, "Query filters evaluated");
        Ok(accepted)
    }
}
