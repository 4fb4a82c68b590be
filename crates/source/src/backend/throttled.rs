//! Throttling source decorator.
//!
//! Wraps another source and makes every outbound request (fetches, and body
//! loads that need their own request) wait for a token from a shared
//! [`Throttle`].

use crate::error::Result;
use crate::{ContentSource, FileBody, RemotePath, SourceHandle, Throttle, TreeNode};
use async_trait::async_trait;
use std::sync::Arc;

/// Rate-limited source.
///
/// Clones share the same [`Throttle`], so the aggregate request rate of all
/// clones (and all tasks using them) is capped.
#[derive(Clone)]
pub struct ThrottledSource {
    inner: SourceHandle,
    throttle: Arc<Throttle>,
}
impl ThrottledSource {
    pub fn new(inner: SourceHandle, throttle: Arc<Throttle>) -> Self {
        Self { inner, throttle }
    }

    pub fn throttle(&self) -> &Arc<Throttle> {
        &self.throttle
    }
}

#[async_trait]
impl ContentSource for ThrottledSource {
    fn name(&self) -> &str {
        self.inner.name()
    }

    async fn fetch(&self, path: &RemotePath) -> Result<TreeNode> {
        self.throttle.wait().await;
        tracing::trace!(source = self.inner.name(), %path, "Throttle token acquired");
        Ok(match self.inner.fetch(path).await? {
            TreeNode::File(file) if file.body().is_remote() => {
                let throttle = Arc::clone(&self.throttle);
                TreeNode::File(file.map_body(|inner| Box::new(ThrottledBody { inner, throttle })))
            },
            node => node,
        })
    }
}

struct ThrottledBody {
    inner: Box<dyn FileBody>,
    throttle: Arc<Throttle>,
}

#[async_trait]
impl FileBody for ThrottledBody {
    async fn load(&self) -> Result<Vec<u8>> {
        self.throttle.wait().await;
        self.inner.load().await
    }

    fn is_remote(&self) -> bool {
        true
    }
}
