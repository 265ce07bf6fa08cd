//! Rate-limited retry queue for tile downloads.
//!
//! [`FetchQueue`] turns "fetch this tile" into a task that resolves only with
//! tile bytes or an [`Unrecoverable`] failure. Transient failures are retried
//! with exponential backoff, a 429 carrying `Retry-After` pauses dispatch for
//! the whole queue, and every failed attempt except a 404 is delivered to an
//! [`ErrorSink`].
//!
//! # Example
//!
//! ```ignore
//! use wplace_archiver::fetch::{FetchQueue, FetchQueueConfig, IgnoreErrors};
//!
//! let queue = FetchQueue::new(client, FetchQueueConfig::default());
//! let bytes = queue.fetch_one(position, &IgnoreErrors).await?;
//! ```

mod classify;
mod limiter;
mod pause;
mod policy;
mod queue;
mod report;
mod stats;

pub use classify::{classify, AttemptFailure, AttemptOutcome, FailureKind, MAX_REPORTED_BODY_BYTES};
pub use limiter::{ConcurrencyLimiter, RateLimiter, RequestPermit, RATE_WINDOW};
pub use pause::PauseGate;
pub use policy::{
    BackoffPolicy, DEFAULT_BACKOFF_FACTOR, DEFAULT_MAX_DELAY_MS, DEFAULT_STARTING_DELAY_MS,
    REQUEST_TIMEOUT_GRACE_MS,
};
pub use queue::{
    FetchQueue, FetchQueueConfig, FetchResult, Unrecoverable, DEFAULT_BACKPRESSURE_TARGET,
    DEFAULT_REQUESTS_PER_SECOND, DEFAULT_REQUEST_CONCURRENCY,
};
pub use report::{ErrorSink, FetchErrorReport, IgnoreErrors};
pub use stats::{FetchStats, FetchStatsSnapshot};
