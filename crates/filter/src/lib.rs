//! Leaf filter pipeline.
//!
//! Decides whether a file found during a walk should be emitted:
//!
//! 1. **Extension gate** ([`Pipeline::is_eligible`]) - only configured file
//!    name suffixes qualify. This check needs nothing but the name, so it runs
//!    before the file body is ever fetched.
//! 2. **Predicate filters** ([`Filters`]) - each filter is handed the whole
//!    stream from offset zero and may reject the file.
//!
//! The stream is always rewound to offset zero before it is handed back, so
//! whatever consumes it next starts at the beginning.

pub mod error;
mod filters;
mod pipeline;
pub mod query;

pub use crate::filters::{Filter, Filters};
pub use crate::pipeline::{DEFAULT_EXTENSION, Pipeline};
pub use crate::query::{QueryFilters, QueryMode};
use std::io::{Read, Seek};

/// A readable, seekable byte stream.
pub trait ReadSeek: Read + Seek + Send {}
impl<T: Read + Seek + Send> ReadSeek for T {}
