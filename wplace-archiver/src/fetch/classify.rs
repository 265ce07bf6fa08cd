//! Classification of fetch attempt outcomes.
//!
//! | Outcome                          | Kind          | Retried          | Reported |
//! |----------------------------------|---------------|------------------|----------|
//! | transport error / timeout        | `Transient`   | after backoff    | yes      |
//! | 2xx with unreadable body         | `Transient`   | after backoff    | yes      |
//! | 5xx                              | `Transient`   | after backoff    | yes      |
//! | 429 without `Retry-After`        | `Transient`   | after backoff    | yes      |
//! | 429 with `Retry-After`           | `RateLimited` | after queue pause| yes      |
//! | 404                              | `Absent`      | no               | no       |
//! | other 4xx (and anything else)    | `Rejected`    | no               | yes      |

use std::fmt;
use std::time::Duration;

use bytes::Bytes;
use serde::Serialize;

use crate::provider::{HttpError, HttpResponse};

/// Maximum number of body bytes kept in an error report.
pub const MAX_REPORTED_BODY_BYTES: usize = 4096;

/// Kind of a failed attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureKind {
    /// Network failure, timeout, 5xx or 429 without a directive.
    Transient,
    /// 429 carrying a `Retry-After` directive.
    RateLimited,
    /// 404: the tile has no content.
    Absent,
    /// Any other client error.
    Rejected,
}

impl FailureKind {
    /// Returns true if the attempt should be retried.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Transient | Self::RateLimited)
    }

    /// Returns true if the failure is passed to the error sink.
    pub fn is_reported(&self) -> bool {
        !matches!(self, Self::Absent)
    }

    /// Short name for logging.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Transient => "transient",
            Self::RateLimited => "rate_limited",
            Self::Absent => "absent",
            Self::Rejected => "rejected",
        }
    }
}

impl fmt::Display for FailureKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Details of a failed attempt.
#[derive(Debug, Clone, PartialEq)]
pub struct AttemptFailure {
    /// Classification of the failure.
    pub kind: FailureKind,
    /// HTTP status, when one was received.
    pub status: Option<u16>,
    /// Human-readable description.
    pub message: String,
    /// Response body (lossy UTF-8, truncated), when retrievable.
    pub body: Option<String>,
    /// Server-requested pause, for `RateLimited` failures.
    pub retry_after: Option<Duration>,
}

impl AttemptFailure {
    fn new(kind: FailureKind, status: Option<u16>, message: impl Into<String>) -> Self {
        Self {
            kind,
            status,
            message: message.into(),
            body: None,
            retry_after: None,
        }
    }
}

/// Outcome of a single attempt after classification.
#[derive(Debug, Clone, PartialEq)]
pub enum AttemptOutcome {
    /// Tile bytes were received.
    Success(Bytes),
    /// The attempt failed.
    Failed(AttemptFailure),
}

/// Classifies the raw result of one HTTP exchange.
pub fn classify(result: Result<HttpResponse, HttpError>) -> AttemptOutcome {
    let response = match result {
        Ok(response) => response,
        Err(e) => {
            return AttemptOutcome::Failed(AttemptFailure::new(
                FailureKind::Transient,
                None,
                e.to_string(),
            ))
        }
    };

    let status = response.status;
    match status {
        200..=299 => match response.body {
            Ok(bytes) => AttemptOutcome::Success(bytes),
            Err(reason) => AttemptOutcome::Failed(AttemptFailure::new(
                FailureKind::Transient,
                Some(status),
                format!("Failed to read response body: {}", reason),
            )),
        },
        404 => AttemptOutcome::Failed(AttemptFailure::new(
            FailureKind::Absent,
            Some(status),
            "Tile not found",
        )),
        429 => {
            let mut failure = match response.retry_after {
                Some(retry_after) => {
                    let mut failure = AttemptFailure::new(
                        FailureKind::RateLimited,
                        Some(status),
                        format!("Rate limited, retry after {:?}", retry_after),
                    );
                    failure.retry_after = Some(retry_after);
                    failure
                }
                None => AttemptFailure::new(
                    FailureKind::Transient,
                    Some(status),
                    "Rate limited without Retry-After",
                ),
            };
            failure.body = body_text(&response.body);
            AttemptOutcome::Failed(failure)
        }
        500..=599 => {
            let mut failure =
                AttemptFailure::new(FailureKind::Transient, Some(status), format!("HTTP {}", status));
            failure.body = body_text(&response.body);
            AttemptOutcome::Failed(failure)
        }
        _ => {
            let mut failure =
                AttemptFailure::new(FailureKind::Rejected, Some(status), format!("HTTP {}", status));
            failure.body = body_text(&response.body);
            AttemptOutcome::Failed(failure)
        }
    }
}

fn body_text(body: &Result<Bytes, String>) -> Option<String> {
    let bytes = body.as_ref().ok().filter(|b| !b.is_empty())?;
    let end = bytes.len().min(MAX_REPORTED_BODY_BYTES);
    Some(String::from_utf8_lossy(&bytes[..end]).into_owned())
}
