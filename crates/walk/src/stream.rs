use crate::callback::{CallbackError, callback};
use crate::context::Context;
use crate::error::{ErrorKind, Result};
use crate::stats::Stats;
use crate::walker::Walker;
use async_stream::stream;
use canopy_source::RemotePath;
use exn::ResultExt;
use futures::Stream;
use std::io::Read;
use tokio::sync::mpsc;

/// Emissions buffered between the walker and a slow consumer.
const BUFFER: usize = 64;

/// Events yielded by [`walk`].
///
/// 1. [`Started`](Self::Started) exactly once.
/// 2. [`Emitted`](Self::Emitted) once per accepted file.
/// 3. [`Complete`](Self::Complete) exactly once, with the walker's counters.
///
/// An error ends the stream early, in which case [`Complete`](Self::Complete)
/// is never emitted.
#[derive(Debug)]
pub enum WalkEvent {
    Started,
    Emitted { path: RemotePath, body: Vec<u8> },
    Complete(Stats),
}

/// Walk `paths` in order and stream every accepted file.
///
/// The walk runs on its own task. Dropping the stream cancels it: pending
/// branches stop and the next emission fails.
pub fn walk(walker: Walker, ctx: Context, paths: Vec<String>) -> impl Stream<Item = Result<WalkEvent>> + Send + 'static {
    stream!({
        yield Ok(WalkEvent::Started);

        let (tx, mut rx) = mpsc::channel(BUFFER);
        let cb = callback(move |_ctx, path, mut body| {
            let tx = tx.clone();
            async move {
                let mut buffer = Vec::new();
                body.read_to_end(&mut buffer)?;
                tx.send((path, buffer)).await.map_err(|_| "walk stream closed")?;
                Ok::<_, CallbackError>(())
            }
        });
        let walk_ctx = ctx.child();
        // Cancels the walk if this stream is dropped before it finishes.
        let _guard = walk_ctx.token().clone().drop_guard();
        let task = {
            let walker = walker.clone();
            let walk_ctx = walk_ctx.clone();
            tokio::spawn(async move { walker.walk_uris(&walk_ctx, cb, &paths).await })
        };

        while let Some((path, body)) = rx.recv().await {
            yield Ok(WalkEvent::Emitted { path, body });
        }

        let result = task.await.or_raise(|| ErrorKind::Worker).and_then(|result| result);
        yield result.map(|()| WalkEvent::Complete(walker.stats()));
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Strategy;
    use canopy_source::backend::MockSource;
    use futures::StreamExt;
    use std::sync::Arc;
    use std::time::Duration;

    fn walker(source: MockSource) -> Walker {
        Walker::builder(Arc::new(source)).rate(Duration::ZERO).strategy(Strategy::Concurrent { max_workers: None }).build()
    }

    #[tokio::test]
    async fn test_event_order() {
        let source = MockSource::with_files([("d/a.geojson", "A"), ("d/b.geojson", "B"), ("d/c.txt", "C")]);
        let events: Vec<_> = walk(walker(source), Context::new(), vec!["d".to_string()]).collect().await;
        assert!(matches!(events.first(), Some(Ok(WalkEvent::Started))));
        let mut bodies: Vec<_> = events
            .iter()
            .filter_map(|event| match event {
                Ok(WalkEvent::Emitted { body, .. }) => Some(body.clone()),
                _ => None,
            })
            .collect();
        bodies.sort();
        assert_eq!(bodies, [b"A".to_vec(), b"B".to_vec()]);
        let Some(Ok(WalkEvent::Complete(stats))) = events.last() else {
            panic!("expected Complete last");
        };
        assert_eq!(stats.emitted, 2);
        assert_eq!(stats.skipped, 1);
    }

    #[tokio::test]
    async fn test_error_ends_stream() {
        let source = MockSource::with_files([("d/a.geojson", "A")]).with_body_failure("d/a.geojson");
        let events: Vec<_> = walk(walker(source), Context::new(), vec!["d".to_string()]).collect().await;
        assert_eq!(events.len(), 2);
        let Some(Err(err)) = events.last() else {
            panic!("expected an error last");
        };
        assert!(matches!(&**err, ErrorKind::Fetch));
    }

    #[tokio::test]
    async fn test_dropping_stream_cancels_walk() {
        let ctx = Context::new();
        let files: Vec<_> = (0..200).map(|i| (format!("d/{i:03}.geojson"), "{}")).collect();
        let source = MockSource::with_files(files);
        let mut events = Box::pin(walk(walker(source), ctx.clone(), vec!["d".to_string()]));
        assert!(matches!(events.next().await, Some(Ok(WalkEvent::Started))));
        assert!(matches!(events.next().await, Some(Ok(WalkEvent::Emitted { .. }))));
        drop(events);
        // The parent context is untouched.
        assert!(!ctx.is_done());
    }
}
