//! `canopy-count`: walk the given paths of an emitter and count what it
//! emits.

mod args;

use crate::args::Args;
use canopy_walk::{Context, Registry, callback};
use clap::Parser;
use miette::miette;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Instant;
use tracing_subscriber::EnvFilter;

fn init_logging(verbose: u8) {
    let level = match verbose {
        0 => tracing::Level::INFO,
        1 => tracing::Level::DEBUG,
        _ => tracing::Level::TRACE,
    };
    let filter = EnvFilter::builder().with_default_directive(level.into()).from_env_lossy();
    tracing_subscriber::fmt().with_env_filter(filter).with_target(false).with_writer(std::io::stderr).init();
}

#[tokio::main]
async fn main() -> miette::Result<()> {
    let args = Args::parse();
    init_logging(args.verbose);

    let registry = Registry::default();
    let walker = registry
        .build(&args.emitter_uri)
        .map_err(|err| miette!(help = format!("supported schemes: {}", registry.schemes().join(", ")), "{err:?}"))?;

    let mut ctx = Context::new();
    if let Some(timeout) = args.timeout {
        ctx = ctx.with_timeout(timeout);
    }
    let interrupt = ctx.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::warn!("Interrupted, finishing in-flight work");
            interrupt.cancel();
        }
    });

    let count = Arc::new(AtomicU64::new(0));
    let counter = Arc::clone(&count);
    let cb = callback(move |_ctx, _path, _stream| {
        let counter = Arc::clone(&counter);
        async move {
            counter.fetch_add(1, Ordering::Relaxed);
            Ok(())
        }
    });

    let started = Instant::now();
    walker.walk_uris(&ctx, cb, &args.paths).await.map_err(|err| miette!("{err:?}"))?;

    let stats = walker.stats();
    tracing::info!(
        "Counted {} records ({} seen) in {:?}",
        count.load(Ordering::Relaxed),
        stats.seen,
        started.elapsed()
    );
    tracing::debug!(%stats, "Walk statistics");
    if ctx.is_done() {
        return Err(miette!("walk stopped before completion, the count is partial"));
    }
    Ok(())
}
