use crate::Context;
use crate::error::{Error, ErrorKind, Result};
use exn::ResultExt;
use futures::future::BoxFuture;
use std::collections::VecDeque;
use tokio::task::JoinSet;

/// Run one worker per item under a child of `ctx`, and wait for all of them.
///
/// The first worker to fail cancels the child context, so siblings that have
/// not started yet return early, and its error is the result. Errors that
/// arrive after that are logged and dropped. Nothing is aborted: this only
/// returns once every spawned worker has finished.
///
/// With `max_workers`, at most that many workers are alive at once and the
/// rest are spawned in order as slots free up. Nothing new is spawned once
/// the child context is done.
pub(crate) async fn fan_out<T, F>(ctx: &Context, items: Vec<T>, max_workers: Option<usize>, worker: F) -> Result<()>
where
    T: Send + 'static,
    F: Fn(Context, T) -> BoxFuture<'static, Result<()>>,
{
    let child = ctx.child();
    let limit = max_workers.unwrap_or(usize::MAX).max(1);
    let mut pending: VecDeque<T> = items.into();
    let mut workers = JoinSet::new();
    while workers.len() < limit {
        let Some(item) = pending.pop_front() else { break };
        workers.spawn(worker(child.clone(), item));
    }

    let mut first: Option<Error> = None;
    while let Some(joined) = workers.join_next().await {
        let result = joined.or_raise(|| ErrorKind::Worker).and_then(|result| result);
        if let Err(err) = result {
            match first {
                None => {
                    child.cancel();
                    first = Some(err);
                },
                Some(_) => tracing::debug!(error = ?err, "Discarding error after the first failure"),
            }
        }
        // Pop-n-push, FIFO.
        if !child.is_done()
            && let Some(item) = pending.pop_front()
        {
            workers.spawn(worker(child.clone(), item));
        }
    }
    if !pending.is_empty() {
        tracing::trace!(unspawned = pending.len(), "Fan-out stopped early");
    }
    first.map_or(Ok(()), Err)
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures::FutureExt;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    fn failing(label: &'static str) -> Error {
        exn::Exn::from(ErrorKind::Callback(label.to_string()))
    }

    #[tokio::test]
    async fn test_all_items_run() {
        let ran = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&ran);
        let result = fan_out(&Context::new(), (0..20).collect(), None, move |_ctx, _item: usize| {
            let counter = Arc::clone(&counter);
            async move {
                counter.fetch_add(1, Ordering::SeqCst);
                Ok(())
            }
            .boxed()
        })
        .await;
        assert!(result.is_ok());
        assert_eq!(ran.load(Ordering::SeqCst), 20);
    }

    #[tokio::test]
    async fn test_first_error_wins_and_everything_is_joined() {
        let finished = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&finished);
        let result = fan_out(&Context::new(), vec!["a", "b", "c"], None, move |_ctx, item| {
            let counter = Arc::clone(&counter);
            async move {
                match item {
                    "b" => Err(failing("b")),
                    "c" => {
                        tokio::time::sleep(Duration::from_millis(50)).await;
                        counter.fetch_add(1, Ordering::SeqCst);
                        Err(failing("c"))
                    },
                    _ => {
                        counter.fetch_add(1, Ordering::SeqCst);
                        Ok(())
                    },
                }
            }
            .boxed()
        })
        .await;
        let err = result.unwrap_err();
        assert!(matches!(&*err, ErrorKind::Callback(label) if label == "b"));
        // The slow sibling was not interrupted.
        assert_eq!(finished.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_failure_cancels_child_not_parent() {
        let parent = Context::new();
        let result = fan_out(&parent, vec![1], None, |ctx, _item: i32| {
            async move {
                assert!(!ctx.is_done());
                Err(failing("x"))
            }
            .boxed()
        })
        .await;
        assert!(result.is_err());
        assert!(!parent.is_done());
    }

    #[tokio::test]
    async fn test_panic_is_a_worker_error() {
        let result = fan_out(&Context::new(), vec![()], None, |_ctx, ()| {
            async move {
                let explode = true;
                if explode {
                    panic!("worker exploded");
                }
                Ok(())
            }
            .boxed()
        })
        .await;
        let err = result.unwrap_err();
        assert!(matches!(&*err, ErrorKind::Worker));
    }

    #[tokio::test]
    async fn test_bounded_never_exceeds_limit() {
        let live = Arc::new(AtomicUsize::new(0));
        let peak = Arc::new(AtomicUsize::new(0));
        let (live_w, peak_w) = (Arc::clone(&live), Arc::clone(&peak));
        let result = fan_out(&Context::new(), (0..10).collect(), Some(3), move |_ctx, _item: usize| {
            let (live, peak) = (Arc::clone(&live_w), Arc::clone(&peak_w));
            async move {
                let now = live.fetch_add(1, Ordering::SeqCst) + 1;
                peak.fetch_max(now, Ordering::SeqCst);
                tokio::time::sleep(Duration::from_millis(5)).await;
                live.fetch_sub(1, Ordering::SeqCst);
                Ok(())
            }
            .boxed()
        })
        .await;
        assert!(result.is_ok());
        assert!(peak.load(Ordering::SeqCst) <= 3);
    }

    #[tokio::test]
    async fn test_bounded_stops_spawning_after_failure() {
        let started = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&started);
        let result = fan_out(&Context::new(), (0..10).collect(), Some(1), move |_ctx, item: usize| {
            let counter = Arc::clone(&counter);
            async move {
                counter.fetch_add(1, Ordering::SeqCst);
                if item == 2 { Err(failing("2")) } else { Ok(()) }
            }
            .boxed()
        })
        .await;
        assert!(result.is_err());
        assert_eq!(started.load(Ordering::SeqCst), 3);
    }
}
