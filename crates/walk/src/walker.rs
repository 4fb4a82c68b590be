use crate::callback::Callback;
use crate::context::Context;
use crate::error::{ErrorKind, Result};
use crate::fanout::fan_out;
use crate::stats::{Stats, WalkStats};
use canopy_config::{InFlight, Options};
use canopy_filter::{Pipeline, QueryFilters};
use canopy_source::backend::ThrottledSource;
use canopy_source::throttle::{DEFAULT_PERIOD, Throttle};
use canopy_source::{RemoteFile, RemotePath, SourceHandle, TreeNode};
use exn::ResultExt;
use futures::FutureExt;
use futures::future::BoxFuture;
use std::io::Cursor;
use std::sync::Arc;
use std::time::Duration;

/// How the children of a directory are visited.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub enum Strategy {
    /// One child at a time, in listing order.
    #[default]
    Sequential,
    /// One worker per child. `max_workers` bounds the live workers of each
    /// directory; `None` is unbounded.
    Concurrent { max_workers: Option<usize> },
}

/// Recursive walker over a [`ContentSource`](canopy_source::ContentSource).
///
/// Every fetch and every body download that needs its own request waits on
/// the walker's throttle. The throttle lives as long as the walker and is
/// shared by all of its traversals.
///
/// # Examples
///
/// ```
/// use canopy_walk::{Context, Strategy, Walker, callback};
/// use canopy_source::backend::LocalSource;
/// use std::sync::Arc;
///
/// # async fn example(root: &std::path::Path) -> Result<(), Box<dyn std::error::Error>> {
/// let source = Arc::new(LocalSource::new("local", root)?);
/// let walker = Walker::builder(source).strategy(Strategy::Concurrent { max_workers: Some(16) }).build();
/// walker
///     .walk_uri(&Context::new(), callback(|_ctx, path, _stream| async move {
///         println!("{path}");
///         Ok(())
///     }), "data")
///     .await?;
/// # Ok(())
/// # }
/// ```
#[derive(Clone)]
pub struct Walker {
    inner: Arc<Inner>,
}

struct Inner {
    name: String,
    source: SourceHandle,
    throttle: Arc<Throttle>,
    pipeline: Pipeline,
    strategy: Strategy,
    in_flight: InFlight,
    stats: WalkStats,
}

/// Builder for [`Walker`].
pub struct WalkerBuilder {
    source: SourceHandle,
    pipeline: Pipeline,
    strategy: Strategy,
    in_flight: InFlight,
    rate: Duration,
}
impl WalkerBuilder {
    pub fn pipeline(mut self, pipeline: Pipeline) -> Self {
        self.pipeline = pipeline;
        self
    }

    pub fn strategy(mut self, strategy: Strategy) -> Self {
        self.strategy = strategy;
        self
    }

    pub fn in_flight(mut self, in_flight: InFlight) -> Self {
        self.in_flight = in_flight;
        self
    }

    /// Minimum time between two outbound requests. Zero disables throttling.
    pub fn rate(mut self, rate: Duration) -> Self {
        self.rate = rate;
        self
    }

    pub fn build(self) -> Walker {
        let throttle = Arc::new(Throttle::new(self.rate));
        let name = self.source.name().to_string();
        let source = Arc::new(ThrottledSource::new(self.source, Arc::clone(&throttle)));
        Walker {
            inner: Arc::new(Inner {
                name,
                source,
                throttle,
                pipeline: self.pipeline,
                strategy: self.strategy,
                in_flight: self.in_flight,
                stats: WalkStats::default(),
            }),
        }
    }
}

impl Walker {
    pub fn builder(source: SourceHandle) -> WalkerBuilder {
        WalkerBuilder {
            source,
            pipeline: Pipeline::default(),
            strategy: Strategy::default(),
            in_flight: InFlight::default(),
            rate: DEFAULT_PERIOD,
        }
    }

    /// Build a walker over `source` configured by resolved [`Options`].
    pub fn from_options(source: SourceHandle, options: &Options) -> Result<Self> {
        let filters = QueryFilters::from_rules(
            &options.include,
            options.include_mode,
            &options.exclude,
            options.exclude_mode,
        )
        .or_raise(|| ErrorKind::Config)?;
        let mut pipeline = Pipeline::new().with_extensions(&options.extension);
        if !filters.is_empty() {
            pipeline = pipeline.with_filter(filters);
        }
        let strategy = if options.concurrent {
            Strategy::Concurrent { max_workers: options.max_workers() }
        } else {
            Strategy::Sequential
        };
        Ok(Self::builder(source)
            .pipeline(pipeline)
            .strategy(strategy)
            .in_flight(options.in_flight)
            .rate(options.rate())
            .build())
    }

    /// Name of the underlying source.
    pub fn name(&self) -> &str {
        &self.inner.name
    }

    pub fn strategy(&self) -> Strategy {
        self.inner.strategy
    }

    pub fn throttle(&self) -> &Arc<Throttle> {
        &self.inner.throttle
    }

    pub fn stats(&self) -> Stats {
        self.inner.stats.snapshot()
    }

    /// Walk the tree rooted at `path`, handing every accepted file to
    /// `callback`.
    ///
    /// Returns `Ok(())` without doing anything if `ctx` is already done.
    /// Cancellation part way through is not an error either: branches that
    /// have not started yet simply return.
    #[tracing::instrument(level = "debug", skip(self, ctx, callback), fields(source = %self.inner.name))]
    pub async fn walk_uri(&self, ctx: &Context, callback: Callback, path: &str) -> Result<()> {
        let path = RemotePath::new(path).or_raise(|| ErrorKind::Fetch)?;
        walk_node(Arc::clone(&self.inner), ctx.clone(), callback, path).await
    }

    /// Walk several roots one after another, stopping at the first error.
    pub async fn walk_uris<S: AsRef<str>>(&self, ctx: &Context, callback: Callback, paths: &[S]) -> Result<()> {
        for path in paths {
            if ctx.is_done() {
                break;
            }
            self.walk_uri(ctx, Arc::clone(&callback), path.as_ref()).await?;
        }
        Ok(())
    }
}

impl std::fmt::Debug for Walker {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Walker")
            .field("name", &self.inner.name)
            .field("strategy", &self.inner.strategy)
            .field("in_flight", &self.inner.in_flight)
            .field("pipeline", &self.inner.pipeline)
            .field("rate", &self.inner.throttle.period())
            .finish()
    }
}

fn walk_node(inner: Arc<Inner>, ctx: Context, callback: Callback, path: RemotePath) -> BoxFuture<'static, Result<()>> {
    async move {
        if ctx.is_done() {
            tracing::trace!(%path, "Context done, not starting");
            return Ok(());
        }
        let node = inner.source.fetch(&path).await.or_raise(|| ErrorKind::Fetch)?;
        inner.stats.fetched();
        tracing::trace!(%path, kind = node.kind(), "Fetched");
        match node {
            TreeNode::File(file) => emit(&inner, &ctx, &callback, file).await,
            TreeNode::Directory(children) => match inner.strategy {
                Strategy::Sequential => {
                    for child in children {
                        walk_node(Arc::clone(&inner), ctx.clone(), Arc::clone(&callback), child).await?;
                    }
                    Ok(())
                },
                Strategy::Concurrent { max_workers } => {
                    tracing::debug!(%path, children = children.len(), "Fanning out");
                    let parent = Arc::clone(&inner);
                    fan_out(&ctx, children, max_workers, move |child_ctx, child| {
                        walk_node(Arc::clone(&parent), child_ctx, Arc::clone(&callback), child)
                    })
                    .await
                },
            },
            TreeNode::Empty => Ok(()),
        }
    }
    .boxed()
}

async fn emit(inner: &Inner, ctx: &Context, callback: &Callback, file: RemoteFile) -> Result<()> {
    inner.stats.seen();
    if !inner.pipeline.is_eligible(&file.name) {
        inner.stats.skipped();
        tracing::trace!(path = %file.path, "Skipped by extension");
        return Ok(());
    }
    let body = file.load().await.or_raise(|| ErrorKind::Fetch)?;
    let mut stream = Cursor::new(body);
    if !inner.pipeline.accepts(&file.name, &mut stream).or_raise(|| ErrorKind::Filter)? {
        inner.stats.rejected();
        tracing::trace!(path = %file.path, "Rejected by filters");
        return Ok(());
    }
    if inner.in_flight == InFlight::Suppress && ctx.is_done() {
        tracing::debug!(path = %file.path, "Suppressing emission after cancellation");
        return Ok(());
    }
    callback(ctx.clone(), file.path, Box::new(stream)).await.map_err(|err| ErrorKind::Callback(err.to_string()))?;
    inner.stats.emitted();
    Ok(())
}
