use derive_more::Display;
use std::sync::atomic::{AtomicU64, Ordering};

/// Counters shared by every worker of one walker.
#[derive(Debug, Default)]
pub(crate) struct WalkStats {
    fetched: AtomicU64,
    seen: AtomicU64,
    skipped: AtomicU64,
    rejected: AtomicU64,
    emitted: AtomicU64,
}
impl WalkStats {
    pub(crate) fn fetched(&self) {
        self.fetched.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn seen(&self) {
        self.seen.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn skipped(&self) {
        self.skipped.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn rejected(&self) {
        self.rejected.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn emitted(&self) {
        self.emitted.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn snapshot(&self) -> Stats {
        Stats {
            fetched: self.fetched.load(Ordering::Relaxed),
            seen: self.seen.load(Ordering::Relaxed),
            skipped: self.skipped.load(Ordering::Relaxed),
            rejected: self.rejected.load(Ordering::Relaxed),
            emitted: self.emitted.load(Ordering::Relaxed),
        }
    }
}

/// Point-in-time walk counters. Totals accumulate over every traversal of
/// the same walker.
#[derive(Debug, Display, Default, Clone, Copy, PartialEq, Eq)]
#[display("{fetched} fetched, {seen} seen, {skipped} skipped, {rejected} rejected, {emitted} emitted")]
pub struct Stats {
    /// Successful fetches (files and directories).
    pub fetched: u64,
    /// Files encountered.
    pub seen: u64,
    /// Files skipped by the extension gate.
    pub skipped: u64,
    /// Files rejected by a filter.
    pub rejected: u64,
    /// Files handed to the callback.
    pub emitted: u64,
}
