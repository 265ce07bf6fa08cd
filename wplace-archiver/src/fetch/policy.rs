//! Backoff policy for tile fetch retries.
//!
//! Tile fetches are retried until they succeed or fail unrecoverably, so
//! there is no attempt cap here; the policy only decides how long to wait.
//!
//! ```ignore
//! use wplace_archiver::fetch::BackoffPolicy;
//!
//! let policy = BackoffPolicy::default();
//! assert_eq!(policy.delay_for_attempt(0).as_millis(), 100);
//! assert_eq!(policy.delay_for_attempt(3).as_millis(), 800);
//! ```

use std::time::Duration;

// =============================================================================
// Backoff Constants
// =============================================================================

/// Default delay before the first retry (100ms).
pub const DEFAULT_STARTING_DELAY_MS: u64 = 100;

/// Default multiplier applied per attempt.
pub const DEFAULT_BACKOFF_FACTOR: f64 = 2.0;

/// Default maximum delay between attempts (2 minutes).
pub const DEFAULT_MAX_DELAY_MS: u64 = 120_000;

/// Extra time a request may take beyond the maximum backoff delay before it
/// is aborted.
pub const REQUEST_TIMEOUT_GRACE_MS: u64 = 5_000;

/// Exponential backoff with a ceiling.
///
/// `delay(attempt) = min(starting_delay × factor^attempt, max_delay)`, with
/// `attempt` counted from zero.
#[derive(Clone, Debug, PartialEq)]
pub struct BackoffPolicy {
    /// Delay after the first failed attempt.
    pub starting_delay: Duration,
    /// Multiplier applied per attempt (typically 2.0).
    pub factor: f64,
    /// Maximum delay cap (delay won't exceed this).
    pub max_delay: Duration,
}

impl Default for BackoffPolicy {
    fn default() -> Self {
        Self {
            starting_delay: Duration::from_millis(DEFAULT_STARTING_DELAY_MS),
            factor: DEFAULT_BACKOFF_FACTOR,
            max_delay: Duration::from_millis(DEFAULT_MAX_DELAY_MS),
        }
    }
}

impl BackoffPolicy {
    /// Creates a policy with explicit parameters.
    pub fn new(starting_delay: Duration, factor: f64, max_delay: Duration) -> Self {
        Self {
            starting_delay,
            factor,
            max_delay,
        }
    }

    /// Calculates the delay to wait after the given attempt failed.
    ///
    /// # Arguments
    ///
    /// * `attempt` - The attempt index (0-based, 0 is the first request)
    pub fn delay_for_attempt(&self, attempt: u32) -> Duration {
        let factor = self.factor.max(1.0).powi(attempt.min(i32::MAX as u32) as i32);
        let delay_ms = self.starting_delay.as_millis() as f64 * factor;
        let max_ms = self.max_delay.as_millis() as f64;

        // Saturates to the cap on overflow (factor^attempt may reach infinity).
        if !delay_ms.is_finite() || delay_ms >= max_ms {
            self.max_delay
        } else {
            Duration::from_millis(delay_ms as u64)
        }
    }

    /// Time after which a single request is aborted.
    pub fn request_timeout(&self) -> Duration {
        self.max_delay + Duration::from_millis(REQUEST_TIMEOUT_GRACE_MS)
    }
}
