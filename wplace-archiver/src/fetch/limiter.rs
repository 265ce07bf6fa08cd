//! Request concurrency and rate limiting.
//!
//! Two independent limits apply to every request the fetch queue issues:
//!
//! - **Concurrency**: at most `max_concurrent` requests in flight, enforced
//!   with a Tokio semaphore. The permit is held for the duration of the HTTP
//!   exchange and released on drop.
//! - **Rate**: at most `requests_per_second` request starts within any
//!   rolling one-second window, enforced by remembering recent start times.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use tokio::sync::{OwnedSemaphorePermit, Semaphore};
use tokio::time::Instant;

/// Length of the rolling rate window.
pub const RATE_WINDOW: Duration = Duration::from_secs(1);

/// Limits concurrent in-flight requests.
#[derive(Debug)]
pub struct ConcurrencyLimiter {
    /// Semaphore controlling concurrent requests
    semaphore: Arc<Semaphore>,

    /// Current number of in-flight requests (for metrics)
    in_flight: Arc<AtomicUsize>,

    /// Peak concurrent requests observed (for tuning)
    peak_in_flight: AtomicUsize,
}

impl ConcurrencyLimiter {
    /// Creates a new limiter with the specified maximum concurrent requests.
    ///
    /// # Panics
    ///
    /// Panics if `max_concurrent` is 0.
    pub fn new(max_concurrent: usize) -> Self {
        assert!(max_concurrent > 0, "max_concurrent must be > 0");

        Self {
            semaphore: Arc::new(Semaphore::new(max_concurrent)),
            in_flight: Arc::new(AtomicUsize::new(0)),
            peak_in_flight: AtomicUsize::new(0),
        }
    }

    /// Acquires a permit, waiting while the limit is reached.
    pub async fn acquire(&self) -> RequestPermit {
        let permit = self
            .semaphore
            .clone()
            .acquire_owned()
            .await
            .expect("semaphore closed unexpectedly");

        let current = self.in_flight.fetch_add(1, Ordering::Relaxed) + 1;
        self.peak_in_flight.fetch_max(current, Ordering::Relaxed);

        RequestPermit {
            _permit: permit,
            in_flight: self.in_flight.clone(),
        }
    }

    /// Returns the current number of in-flight requests.
    pub fn in_flight(&self) -> usize {
        self.in_flight.load(Ordering::Relaxed)
    }

    /// Returns the peak number of concurrent requests observed.
    pub fn peak_in_flight(&self) -> usize {
        self.peak_in_flight.load(Ordering::Relaxed)
    }

    /// Returns the number of available permits.
    #[cfg(test)]
    pub fn available_permits(&self) -> usize {
        self.semaphore.available_permits()
    }
}

/// A permit for one in-flight request.
///
/// Counts against the concurrency limit until dropped.
#[derive(Debug)]
pub struct RequestPermit {
    _permit: OwnedSemaphorePermit,
    in_flight: Arc<AtomicUsize>,
}

impl Drop for RequestPermit {
    fn drop(&mut self) {
        self.in_flight.fetch_sub(1, Ordering::Relaxed);
    }
}

/// Limits request starts per rolling one-second window.
#[derive(Debug)]
pub struct RateLimiter {
    max_per_window: usize,
    starts: Mutex<VecDeque<Instant>>,
}

impl RateLimiter {
    /// Creates a limiter allowing `requests_per_second` starts per window.
    ///
    /// # Panics
    ///
    /// Panics if `requests_per_second` is 0.
    pub fn new(requests_per_second: usize) -> Self {
        assert!(requests_per_second > 0, "requests_per_second must be > 0");

        Self {
            max_per_window: requests_per_second,
            starts: Mutex::new(VecDeque::with_capacity(requests_per_second)),
        }
    }

    /// Waits for a free slot in the window and records a start.
    ///
    /// Returns the recorded start so an unused slot can be handed back with
    /// [`RateLimiter::release`].
    pub async fn acquire(&self) -> Instant {
        loop {
            let wait_until = {
                let mut starts = self.starts.lock();
                let now = Instant::now();
                while starts
                    .front()
                    .is_some_and(|start| now.duration_since(*start) >= RATE_WINDOW)
                {
                    starts.pop_front();
                }

                if starts.len() < self.max_per_window {
                    starts.push_back(now);
                    return now;
                }

                // Oldest start leaves the window first.
                starts.front().map(|oldest| *oldest + RATE_WINDOW)
            };

            if let Some(deadline) = wait_until {
                tokio::time::sleep_until(deadline).await;
            }
        }
    }

    /// Forgets a start recorded by `acquire` whose request was never sent.
    pub fn release(&self, start: Instant) {
        let mut starts = self.starts.lock();
        if let Some(index) = starts.iter().rposition(|recorded| *recorded == start) {
            starts.remove(index);
        }
    }

    /// Starts recorded within the current window.
    #[cfg(test)]
    pub fn recent_starts(&self) -> usize {
        let now = Instant::now();
        self.starts
            .lock()
            .iter()
            .filter(|start| now.duration_since(**start) < RATE_WINDOW)
            .count()
    }
}
