//! Walkable content sources.
//!
//! A [`ContentSource`] turns a [`RemotePath`] into a [`TreeNode`]: a file
//! with a lazily materialized body, or a directory listing. Every outbound
//! request can be paced with a shared [`Throttle`] by wrapping a source in a
//! [`ThrottledSource`](backend::ThrottledSource).

pub mod backend;
pub mod error;
mod node;
mod path;
pub mod throttle;

pub use crate::backend::ContentSource;
pub use crate::node::{FileBody, InlineBody, RemoteFile, TreeNode};
pub use crate::path::RemotePath;
pub use crate::throttle::Throttle;
use std::sync::Arc;

pub type SourceHandle = Arc<dyn ContentSource + Send + Sync>;
