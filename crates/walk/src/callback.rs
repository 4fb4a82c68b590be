use crate::Context;
use canopy_filter::ReadSeek;
use canopy_source::RemotePath;
use futures::FutureExt;
use futures::future::BoxFuture;
use std::sync::Arc;

/// Whatever the callback wants to fail with. The walker only keeps its message.
pub type CallbackError = Box<dyn std::error::Error + Send + Sync>;
pub type CallbackResult = std::result::Result<(), CallbackError>;

/// Receives every accepted file, with its stream at offset zero.
pub type Callback =
    Arc<dyn Fn(Context, RemotePath, Box<dyn ReadSeek>) -> BoxFuture<'static, CallbackResult> + Send + Sync>;

/// Wrap an async closure as a [`Callback`].
///
/// ```
/// use canopy_walk::callback;
/// use std::sync::Arc;
/// use std::sync::atomic::{AtomicU64, Ordering};
///
/// let count = Arc::new(AtomicU64::new(0));
/// let counter = Arc::clone(&count);
/// let cb = callback(move |_ctx, _path, _stream| {
///     let counter = Arc::clone(&counter);
///     async move {
///         counter.fetch_add(1, Ordering::Relaxed);
///         Ok(())
///     }
/// });
/// # drop(cb);
/// ```
pub fn callback<F, Fut>(f: F) -> Callback
where
    F: Fn(Context, RemotePath, Box<dyn ReadSeek>) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = CallbackResult> + Send + 'static,
{
    Arc::new(move |ctx, path, stream| f(ctx, path, stream).boxed())
}
