//! The rate-limited retry queue.
//!
//! Every attempt (first try or retry) goes through the same dispatch path:
//!
//! ```text
//!  enqueue ─► wait: server pause ─► wait: interrupt pause ─► concurrency permit
//!                                                              │
//!          ┌───────────────────────────────────────────────────┘
//!          ▼
//!     rate window slot ─► GET ─► classify ─┬─► Success ──────────► Ok(bytes)
//!                                          ├─► Absent / Rejected ─► Err(..)
//!                                          ├─► RateLimited ─► pause queue, retry now
//!                                          └─► Transient ───► backoff, retry
//! ```
//!
//! The caller of [`FetchQueue::fetch_one`] only sees the final outcome;
//! intermediate failures surface through the [`ErrorSink`].

use std::pin::pin;
use std::sync::Arc;
use std::time::Duration;

use bytes::Bytes;
use futures::stream::{FuturesUnordered, Stream, StreamExt};
use thiserror::Error;
use tokio::sync::watch;
use tracing::{debug, info, warn};

use super::classify::{classify, AttemptOutcome, FailureKind};
use super::limiter::{ConcurrencyLimiter, RateLimiter, RequestPermit};
use super::pause::PauseGate;
use super::policy::BackoffPolicy;
use super::report::{ErrorSink, FetchErrorReport};
use super::stats::{FetchStats, FetchStatsSnapshot};
use crate::coord::TilePosition;
use crate::provider::{AsyncHttpClient, TileUrlTemplate};

/// Default request starts per second.
pub const DEFAULT_REQUESTS_PER_SECOND: usize = 10;

/// Default concurrent in-flight requests.
pub const DEFAULT_REQUEST_CONCURRENCY: usize = 10;

/// Default number of waiting tasks at which `fetch_many` stops pulling.
pub const DEFAULT_BACKPRESSURE_TARGET: usize = 5;

/// Final failure of a fetch task. Carries no tile content.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum Unrecoverable {
    /// HTTP 404: nothing has been painted on this tile.
    #[error("tile not found")]
    Absent,

    /// Any other client error.
    #[error("request rejected with HTTP {status}")]
    Rejected {
        /// The HTTP status received.
        status: u16,
    },
}

/// Result of a settled fetch task.
pub type FetchResult = Result<Bytes, Unrecoverable>;

/// Fetch queue configuration.
#[derive(Debug, Clone)]
pub struct FetchQueueConfig {
    /// Maximum request starts per rolling second.
    pub requests_per_second: usize,
    /// Maximum in-flight requests.
    pub request_concurrency: usize,
    /// Retry backoff.
    pub backoff: BackoffPolicy,
    /// `fetch_many` pulls new positions only while fewer tasks than this are
    /// waiting for dispatch.
    pub backpressure_target: usize,
    /// Tile URL scheme.
    pub urls: TileUrlTemplate,
}

impl Default for FetchQueueConfig {
    fn default() -> Self {
        Self {
            requests_per_second: DEFAULT_REQUESTS_PER_SECOND,
            request_concurrency: DEFAULT_REQUEST_CONCURRENCY,
            backoff: BackoffPolicy::default(),
            backpressure_target: DEFAULT_BACKPRESSURE_TARGET,
            urls: TileUrlTemplate::default(),
        }
    }
}

impl FetchQueueConfig {
    /// Sets the request rate limit.
    pub fn with_requests_per_second(mut self, rps: usize) -> Self {
        self.requests_per_second = rps;
        self
    }

    /// Sets the concurrency limit.
    pub fn with_request_concurrency(mut self, concurrency: usize) -> Self {
        self.request_concurrency = concurrency;
        self
    }

    /// Sets the backoff policy.
    pub fn with_backoff(mut self, backoff: BackoffPolicy) -> Self {
        self.backoff = backoff;
        self
    }

    /// Sets the backpressure target.
    pub fn with_backpressure_target(mut self, target: usize) -> Self {
        self.backpressure_target = target;
        self
    }

    /// Sets the tile URL scheme.
    pub fn with_urls(mut self, urls: TileUrlTemplate) -> Self {
        self.urls = urls;
        self
    }
}

/// Counts one attempt waiting for dispatch; decrements on drop.
struct WaitingTicket<'a> {
    waiting: &'a watch::Sender<usize>,
}

impl Drop for WaitingTicket<'_> {
    fn drop(&mut self) {
        self.waiting.send_modify(|n| *n -= 1);
    }
}

/// Rate-limited, retrying tile fetcher.
///
/// # Type Parameters
///
/// * `C` - HTTP client used for requests
pub struct FetchQueue<C: AsyncHttpClient> {
    client: C,
    config: FetchQueueConfig,
    concurrency: ConcurrencyLimiter,
    rate: RateLimiter,
    /// Paused while the server asked us to back off.
    server_pause: PauseGate,
    /// Shared with the interrupt controller and the discovery scheduler.
    interrupt: Arc<PauseGate>,
    /// Attempts enqueued but not yet dispatched.
    waiting: watch::Sender<usize>,
    stats: FetchStats,
}

impl<C: AsyncHttpClient> FetchQueue<C> {
    /// Creates a queue.
    ///
    /// # Panics
    ///
    /// Panics if `requests_per_second` or `request_concurrency` is 0.
    pub fn new(client: C, config: FetchQueueConfig) -> Self {
        let (waiting, _) = watch::channel(0);
        Self {
            client,
            concurrency: ConcurrencyLimiter::new(config.request_concurrency),
            rate: RateLimiter::new(config.requests_per_second),
            config,
            server_pause: PauseGate::new(),
            interrupt: Arc::new(PauseGate::new()),
            waiting,
            stats: FetchStats::default(),
        }
    }

    /// Makes dispatch also wait on an external pause gate.
    pub fn with_interrupt_gate(mut self, gate: Arc<PauseGate>) -> Self {
        self.interrupt = gate;
        self
    }

    /// The underlying HTTP client.
    pub fn client(&self) -> &C {
        &self.client
    }

    /// The queue configuration.
    pub fn config(&self) -> &FetchQueueConfig {
        &self.config
    }

    /// Number of attempts waiting for dispatch.
    pub fn waiting(&self) -> usize {
        *self.waiting.borrow()
    }

    /// Number of requests currently in flight.
    pub fn in_flight(&self) -> usize {
        self.concurrency.in_flight()
    }

    /// Returns true while dispatch is paused by the server or an interrupt.
    pub fn is_paused(&self) -> bool {
        self.server_pause.is_paused() || self.interrupt.is_paused()
    }

    /// Snapshot of the queue counters.
    pub fn stats(&self) -> FetchStatsSnapshot {
        self.stats.snapshot()
    }

    /// Pauses new dispatch until `resume` is called. Idempotent.
    pub fn pause(&self) -> bool {
        self.server_pause.pause()
    }

    /// Resumes dispatch. Idempotent.
    pub fn resume(&self) -> bool {
        self.server_pause.resume()
    }

    /// Fetches one tile, retrying transient failures.
    ///
    /// Resolves only with tile bytes or an unrecoverable failure. `errors`
    /// receives one report per failed attempt, except for 404s.
    pub async fn fetch_one<E>(&self, position: TilePosition, errors: &E) -> FetchResult
    where
        E: ErrorSink + ?Sized,
    {
        let ticket = self.enqueue();
        self.run(position, errors, ticket).await
    }

    /// Fetches every position produced by `positions`.
    ///
    /// The next position is pulled only while fewer than
    /// `backpressure_target` attempts are waiting for dispatch, so an
    /// unbounded producer cannot flood the queue. `on_result` is called once
    /// per settled task, in completion order. `progress` maps the number of
    /// settled tasks to a fraction in `0..=1` and is only used for logging.
    ///
    /// Returns the number of settled tasks.
    pub async fn fetch_many<S, E, R, P>(
        &self,
        positions: S,
        errors: &E,
        mut on_result: R,
        progress: P,
    ) -> usize
    where
        S: Stream<Item = TilePosition>,
        E: ErrorSink + ?Sized,
        R: FnMut(TilePosition, FetchResult),
        P: Fn(usize) -> f64,
    {
        let target = self.config.backpressure_target.max(1);
        let mut positions = pin!(positions);
        let mut waiting = self.waiting.subscribe();
        let mut in_flight = FuturesUnordered::new();
        let mut exhausted = false;
        let mut completed = 0usize;
        let mut logged_percent = 0u32;

        loop {
            tokio::select! {
                biased;

                Some((position, result)) = in_flight.next(), if !in_flight.is_empty() => {
                    completed += 1;
                    on_result(position, result);

                    let percent = (progress(completed).clamp(0.0, 1.0) * 100.0) as u32;
                    if percent > logged_percent {
                        logged_percent = percent;
                        info!(completed, percent, "Fetch progress");
                    }
                }

                next = async {
                    let _ = waiting.wait_for(|n| *n < target).await;
                    positions.next().await
                }, if !exhausted => {
                    match next {
                        Some(position) => {
                            let ticket = self.enqueue();
                            in_flight.push(async move {
                                (position, self.run(position, errors, ticket).await)
                            });
                        }
                        None => {
                            debug!(completed, remaining = in_flight.len(), "Producer exhausted");
                            exhausted = true;
                        }
                    }
                }

                else => break,
            }
        }

        completed
    }

    fn enqueue(&self) -> WaitingTicket<'_> {
        self.waiting.send_modify(|n| *n += 1);
        WaitingTicket {
            waiting: &self.waiting,
        }
    }

    /// Waits until a request may start and returns its concurrency permit.
    async fn dispatch(&self, ticket: WaitingTicket<'_>) -> RequestPermit {
        loop {
            self.server_pause.wait_resumed().await;
            self.interrupt.wait_resumed().await;

            let permit = self.concurrency.acquire().await;
            // A pause may have started while we waited for a permit.
            if self.is_paused() {
                continue;
            }

            let start = self.rate.acquire().await;
            if self.is_paused() {
                // Unsent attempts must not hold a slot in the window.
                self.rate.release(start);
                continue;
            }

            drop(ticket);
            return permit;
        }
    }

    async fn run<E>(
        &self,
        position: TilePosition,
        errors: &E,
        ticket: WaitingTicket<'_>,
    ) -> FetchResult
    where
        E: ErrorSink + ?Sized,
    {
        let url = self.config.urls.url_for(&position);
        let mut ticket = Some(ticket);
        let mut attempt: u32 = 0;

        loop {
            let ticket = ticket.take().unwrap_or_else(|| self.enqueue());
            let permit = self.dispatch(ticket).await;

            self.stats.attempt_started();
            let result = self.client.get(&url).await;
            drop(permit);

            let failure = match classify(result) {
                AttemptOutcome::Success(bytes) => {
                    self.stats.succeeded();
                    debug!(tile = %position, attempt, bytes = bytes.len(), "Tile fetched");
                    return Ok(bytes);
                }
                AttemptOutcome::Failed(failure) => failure,
            };

            // Pause before reporting so the sink observes the queue paused.
            let paused_here = failure.kind == FailureKind::RateLimited && self.server_pause.pause();

            if failure.kind.is_reported() {
                errors.report(&FetchErrorReport::from_failure(
                    position, attempt, &url, &failure,
                ));
            }

            match failure.kind {
                FailureKind::Absent => {
                    self.stats.absent();
                    debug!(tile = %position, "Tile absent");
                    return Err(Unrecoverable::Absent);
                }
                FailureKind::Rejected => {
                    self.stats.rejected();
                    let status = failure.status.unwrap_or_default();
                    warn!(tile = %position, status, message = %failure.message, "Tile request rejected");
                    return Err(Unrecoverable::Rejected { status });
                }
                FailureKind::RateLimited => {
                    self.stats.retried();
                    if paused_here {
                        let pause = failure.retry_after.unwrap_or(Duration::ZERO);
                        self.stats.rate_limit_paused();
                        warn!(tile = %position, pause_ms = pause.as_millis() as u64, "Rate limited, pausing queue");
                        self.hold_pause(pause).await;
                    }
                }
                FailureKind::Transient => {
                    self.stats.retried();
                    let delay = self.config.backoff.delay_for_attempt(attempt);
                    debug!(
                        tile = %position,
                        attempt,
                        delay_ms = delay.as_millis() as u64,
                        error = %failure.message,
                        "Transient failure, backing off"
                    );
                    tokio::time::sleep(delay).await;
                }
            }

            attempt = attempt.saturating_add(1);
        }
    }

    /// Keeps the server pause in place for `duration`, then lifts it.
    async fn hold_pause(&self, duration: Duration) {
        tokio::time::sleep(duration).await;
        if self.server_pause.resume() {
            info!("Resuming queue after rate limit pause");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fetch::IgnoreErrors;
    use crate::provider::{HttpError, HttpResponse, MockAsyncHttpClient};
    use parking_lot::Mutex;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use tokio::time::Instant;

    fn url(x: i64, y: i64) -> String {
        TileUrlTemplate::default().url_for(&TilePosition::wrap(x, y))
    }

    fn queue(mock: MockAsyncHttpClient) -> FetchQueue<MockAsyncHttpClient> {
        FetchQueue::new(
            mock,
            FetchQueueConfig::default()
                .with_requests_per_second(1000)
                .with_request_concurrency(8),
        )
    }

    #[derive(Default)]
    struct Collect(Mutex<Vec<FetchErrorReport>>);

    impl ErrorSink for Collect {
        fn report(&self, report: &FetchErrorReport) {
            self.0.lock().push(report.clone());
        }
    }

    impl Collect {
        fn kinds(&self) -> Vec<(u32, FailureKind)> {
            self.0.lock().iter().map(|r| (r.attempt, r.kind)).collect()
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_success_first_try() {
        let q = queue(MockAsyncHttpClient::new(Ok(HttpResponse::new(200, "tile"))));
        let errors = Collect::default();

        let result = q.fetch_one(TilePosition::wrap(1, 2), &errors).await;

        assert_eq!(result, Ok(Bytes::from_static(b"tile")));
        assert!(errors.kinds().is_empty());
        assert_eq!(q.stats().attempts, 1);
        assert_eq!(q.waiting(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_transient_failures_retry_with_backoff() {
        let mock = MockAsyncHttpClient::new(Ok(HttpResponse::new(200, "tile")));
        mock.script(
            &url(1, 1),
            [
                Ok(HttpResponse::new(500, "")),
                Err(HttpError::Transport("reset".into())),
                Ok(HttpResponse::new(200, "").with_body_error("eof")),
            ],
        );
        let q = queue(mock);
        let errors = Collect::default();
        let start = Instant::now();

        let result = q.fetch_one(TilePosition::wrap(1, 1), &errors).await;

        assert!(result.is_ok());
        // 100ms + 200ms + 400ms
        assert_eq!(Instant::now() - start, Duration::from_millis(700));
        assert_eq!(
            errors.kinds(),
            vec![
                (0, FailureKind::Transient),
                (1, FailureKind::Transient),
                (2, FailureKind::Transient)
            ]
        );
        let stats = q.stats();
        assert_eq!(stats.attempts, 4);
        assert_eq!(stats.retries, 3);
        assert_eq!(stats.succeeded, 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_not_found_is_silent_and_final() {
        let mock = MockAsyncHttpClient::new(Ok(HttpResponse::new(404, "")));
        let q = queue(mock);
        let errors = Collect::default();

        let result = q.fetch_one(TilePosition::wrap(9, 9), &errors).await;

        assert_eq!(result, Err(Unrecoverable::Absent));
        assert!(errors.kinds().is_empty());
        assert_eq!(q.stats().attempts, 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_client_error_is_reported_and_final() {
        let mock = MockAsyncHttpClient::new(Ok(HttpResponse::new(403, "nope")));
        let q = queue(mock);
        let errors = Collect::default();

        let result = q.fetch_one(TilePosition::wrap(9, 9), &errors).await;

        assert_eq!(result, Err(Unrecoverable::Rejected { status: 403 }));
        assert_eq!(errors.kinds(), vec![(0, FailureKind::Rejected)]);
        assert_eq!(errors.0.lock()[0].body.as_deref(), Some("nope"));
    }

    #[tokio::test(start_paused = true)]
    async fn test_retry_after_pauses_queue_then_retries_immediately() {
        let mock = MockAsyncHttpClient::new(Ok(HttpResponse::new(200, "tile")));
        mock.script(
            &url(3, 3),
            [Ok(HttpResponse::new(429, "").with_retry_after(Duration::from_secs(2)))],
        );
        let q = queue(mock);
        let errors = Collect::default();
        let start = Instant::now();

        let result = q.fetch_one(TilePosition::wrap(3, 3), &errors).await;

        assert!(result.is_ok());
        // Exactly the server pause, no backoff on top.
        assert_eq!(Instant::now() - start, Duration::from_secs(2));
        assert_eq!(errors.kinds(), vec![(0, FailureKind::RateLimited)]);
        assert_eq!(errors.0.lock()[0].retry_after_ms, Some(2000));
        assert_eq!(q.stats().rate_limit_pauses, 1);
        assert!(!q.is_paused());
    }

    #[tokio::test(start_paused = true)]
    async fn test_rate_limit_without_header_uses_backoff() {
        let mock = MockAsyncHttpClient::new(Ok(HttpResponse::new(200, "tile")));
        mock.script(&url(4, 4), [Ok(HttpResponse::new(429, ""))]);
        let q = queue(mock);
        let start = Instant::now();

        let result = q.fetch_one(TilePosition::wrap(4, 4), &IgnoreErrors).await;

        assert!(result.is_ok());
        assert_eq!(Instant::now() - start, Duration::from_millis(100));
        assert_eq!(q.stats().rate_limit_pauses, 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_rate_limit_pause_holds_other_dispatch() {
        let mock = MockAsyncHttpClient::new(Ok(HttpResponse::new(200, "tile")))
            .with_latency(Duration::from_millis(10));
        mock.script(
            &url(0, 0),
            [Ok(HttpResponse::new(429, "").with_retry_after(Duration::from_secs(5)))],
        );
        let q = Arc::new(queue(mock));

        let limited = {
            let q = q.clone();
            tokio::spawn(async move { q.fetch_one(TilePosition::wrap(0, 0), &IgnoreErrors).await })
        };

        // Let the first request hit the 429.
        tokio::time::sleep(Duration::from_millis(50)).await;
        assert!(q.is_paused());

        let start = Instant::now();
        let other = q.fetch_one(TilePosition::wrap(1, 0), &IgnoreErrors).await;
        assert!(other.is_ok());
        // Dispatch of the second tile waited for the remaining pause.
        assert!(Instant::now() - start >= Duration::from_millis(4900));

        assert!(limited.await.unwrap().is_ok());
    }

    #[tokio::test(start_paused = true)]
    async fn test_manual_pause_is_idempotent_and_blocks_new_dispatch() {
        let q = Arc::new(queue(MockAsyncHttpClient::new(Ok(HttpResponse::new(200, "tile")))));
        assert!(q.pause());
        assert!(!q.pause());

        let task = {
            let q = q.clone();
            tokio::spawn(async move { q.fetch_one(TilePosition::wrap(5, 5), &IgnoreErrors).await })
        };

        tokio::time::sleep(Duration::from_secs(3)).await;
        assert_eq!(q.stats().attempts, 0);
        assert_eq!(q.waiting(), 1);

        assert!(q.resume());
        assert!(!q.resume());
        assert!(task.await.unwrap().is_ok());
        assert_eq!(q.waiting(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_pause_during_rate_wait_does_not_spend_slot() {
        let q = Arc::new(FetchQueue::new(
            MockAsyncHttpClient::new(Ok(HttpResponse::new(200, "tile"))),
            FetchQueueConfig::default()
                .with_requests_per_second(1)
                .with_request_concurrency(8),
        ));
        let start = Instant::now();

        let tasks: Vec<_> = (0..2)
            .map(|x| {
                let q = q.clone();
                tokio::spawn(async move { q.fetch_one(TilePosition::wrap(x, 0), &IgnoreErrors).await })
            })
            .collect();

        // One request went out; the other waits for the window until t=1s.
        tokio::time::sleep(Duration::from_millis(500)).await;
        assert_eq!(q.stats().attempts, 1);
        q.pause();

        // The waiting attempt gets its slot while paused and must give it back.
        tokio::time::sleep(Duration::from_millis(700)).await;
        assert_eq!(q.stats().attempts, 1);
        q.resume();

        for task in tasks {
            assert!(task.await.unwrap().is_ok());
        }
        assert_eq!(q.stats().attempts, 2);
        // Sent right after resuming, not a full window later.
        assert!(Instant::now() - start < Duration::from_millis(1500));
    }

    #[tokio::test(start_paused = true)]
    async fn test_interrupt_gate_blocks_dispatch() {
        let gate = Arc::new(PauseGate::new());
        let q = Arc::new(
            queue(MockAsyncHttpClient::new(Ok(HttpResponse::new(200, "tile"))))
                .with_interrupt_gate(gate.clone()),
        );
        gate.pause();
        assert!(q.is_paused());

        let task = {
            let q = q.clone();
            tokio::spawn(async move { q.fetch_one(TilePosition::wrap(5, 5), &IgnoreErrors).await })
        };
        tokio::time::sleep(Duration::from_secs(1)).await;
        assert_eq!(q.stats().attempts, 0);

        gate.resume();
        assert!(task.await.unwrap().is_ok());
    }

    #[tokio::test(start_paused = true)]
    async fn test_concurrency_is_bounded() {
        let mock = MockAsyncHttpClient::new(Ok(HttpResponse::new(200, "tile")))
            .with_latency(Duration::from_millis(100));
        let q = FetchQueue::new(
            mock,
            FetchQueueConfig::default()
                .with_requests_per_second(1000)
                .with_request_concurrency(3)
                .with_backpressure_target(20),
        );

        let positions = futures::stream::iter((0..12).map(|x| TilePosition::wrap(x, 0)));
        let settled = q.fetch_many(positions, &IgnoreErrors, |_, _| {}, |n| n as f64 / 12.0).await;

        assert_eq!(settled, 12);
        assert_eq!(q.client().peak_in_flight(), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn test_rate_is_bounded() {
        let mock = MockAsyncHttpClient::new(Ok(HttpResponse::new(200, "tile")));
        let q = FetchQueue::new(
            mock,
            FetchQueueConfig::default()
                .with_requests_per_second(2)
                .with_request_concurrency(10),
        );
        let start = Instant::now();

        let positions = futures::stream::iter((0..6).map(|x| TilePosition::wrap(x, 0)));
        q.fetch_many(positions, &IgnoreErrors, |_, _| {}, |_| 0.0).await;

        // 6 starts at 2 per second need at least two full windows.
        assert!(Instant::now() - start >= Duration::from_secs(2));
    }

    #[tokio::test(start_paused = true)]
    async fn test_fetch_many_applies_backpressure() {
        let mock = MockAsyncHttpClient::new(Ok(HttpResponse::new(200, "tile")))
            .with_latency(Duration::from_millis(50));
        let q = FetchQueue::new(
            mock,
            FetchQueueConfig::default()
                .with_requests_per_second(1000)
                .with_request_concurrency(1)
                .with_backpressure_target(2),
        );
        let max_waiting_at_pull = AtomicUsize::new(0);

        let positions = futures::stream::iter((0..20).map(|x| TilePosition::wrap(x, 0))).map(|p| {
            max_waiting_at_pull.fetch_max(q.waiting(), Ordering::SeqCst);
            p
        });
        let settled = q.fetch_many(positions, &IgnoreErrors, |_, _| {}, |_| 0.0).await;

        assert_eq!(settled, 20);
        assert!(max_waiting_at_pull.load(Ordering::SeqCst) < 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_fetch_many_settles_every_position_once() {
        let mock = MockAsyncHttpClient::new(Ok(HttpResponse::new(200, "tile")));
        mock.script(&url(1, 0), [Ok(HttpResponse::new(404, ""))]);
        mock.script(&url(2, 0), [Ok(HttpResponse::new(400, ""))]);
        mock.script(&url(3, 0), [Ok(HttpResponse::new(503, "")), Ok(HttpResponse::new(200, "late"))]);
        let q = queue(mock);
        let errors = Collect::default();
        let mut results = Vec::new();

        let positions = futures::stream::iter((0..5).map(|x| TilePosition::wrap(x, 0)));
        let settled = q
            .fetch_many(positions, &errors, |p, r| results.push((p, r)), |n| n as f64 / 5.0)
            .await;

        assert_eq!(settled, 5);
        results.sort_by_key(|(p, _)| *p);
        let outcomes: Vec<_> = results.iter().map(|(p, r)| (p.x(), r.clone())).collect();
        assert_eq!(
            outcomes,
            vec![
                (0, Ok(Bytes::from_static(b"tile"))),
                (1, Err(Unrecoverable::Absent)),
                (2, Err(Unrecoverable::Rejected { status: 400 })),
                (3, Ok(Bytes::from_static(b"late"))),
                (4, Ok(Bytes::from_static(b"tile"))),
            ]
        );
        // 400 on tile 2 and 503 on tile 3; the 404 is not reported.
        assert_eq!(errors.0.lock().len(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_fetch_many_with_empty_producer() {
        let q = queue(MockAsyncHttpClient::new(Ok(HttpResponse::new(200, ""))));
        let settled = q
            .fetch_many(futures::stream::empty(), &IgnoreErrors, |_, _| {}, |_| 1.0)
            .await;
        assert_eq!(settled, 0);
    }
}
