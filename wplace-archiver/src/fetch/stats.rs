//! Lock-free fetch counters.

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};

/// Counters updated by the fetch queue.
#[derive(Debug, Default)]
pub struct FetchStats {
    attempts: AtomicU64,
    succeeded: AtomicU64,
    retries: AtomicU64,
    absent: AtomicU64,
    rejected: AtomicU64,
    rate_limit_pauses: AtomicU64,
}

impl FetchStats {
    pub(crate) fn attempt_started(&self) {
        self.attempts.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn succeeded(&self) {
        self.succeeded.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn retried(&self) {
        self.retries.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn absent(&self) {
        self.absent.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn rejected(&self) {
        self.rejected.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn rate_limit_paused(&self) {
        self.rate_limit_pauses.fetch_add(1, Ordering::Relaxed);
    }

    /// Takes a point-in-time copy of the counters.
    pub fn snapshot(&self) -> FetchStatsSnapshot {
        FetchStatsSnapshot {
            attempts: self.attempts.load(Ordering::Relaxed),
            succeeded: self.succeeded.load(Ordering::Relaxed),
            retries: self.retries.load(Ordering::Relaxed),
            absent: self.absent.load(Ordering::Relaxed),
            rejected: self.rejected.load(Ordering::Relaxed),
            rate_limit_pauses: self.rate_limit_pauses.load(Ordering::Relaxed),
        }
    }
}

/// Point-in-time copy of [`FetchStats`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FetchStatsSnapshot {
    /// HTTP requests issued.
    pub attempts: u64,
    /// Tasks that settled with tile bytes.
    pub succeeded: u64,
    /// Failed attempts that were retried.
    pub retries: u64,
    /// Tasks that settled as 404.
    pub absent: u64,
    /// Tasks that settled with another client error.
    pub rejected: u64,
    /// Times a 429 with `Retry-After` paused the queue.
    pub rate_limit_pauses: u64,
}

impl FetchStatsSnapshot {
    /// Tasks that reached a final outcome.
    pub fn settled(&self) -> u64 {
        self.succeeded + self.absent + self.rejected
    }
}

impl fmt::Display for FetchStatsSnapshot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} requests, {} ok, {} absent, {} rejected, {} retries, {} rate-limit pauses",
            self.attempts,
            self.succeeded,
            self.absent,
            self.rejected,
            self.retries,
            self.rate_limit_pauses
        )
    }
}
