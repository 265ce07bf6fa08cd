//! Per-attempt error reports and the sink they are delivered to.

use chrono::{DateTime, Utc};
use serde::Serialize;

use super::classify::{AttemptFailure, FailureKind};
use crate::coord::TilePosition;

/// Serializable record of one failed fetch attempt.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FetchErrorReport {
    /// Tile that was being fetched.
    pub position: TilePosition,
    /// Attempt index (0-based).
    pub attempt: u32,
    /// Failure classification.
    pub kind: FailureKind,
    /// HTTP status, if a response was received.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<u16>,
    /// Human-readable description.
    pub message: String,
    /// Response body, if retrievable.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub body: Option<String>,
    /// Server-requested pause in milliseconds.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub retry_after_ms: Option<u64>,
    /// Requested URL.
    pub url: String,
    /// When the attempt failed.
    pub timestamp: DateTime<Utc>,
}

impl FetchErrorReport {
    /// Builds a report from a classified failure.
    pub fn from_failure(
        position: TilePosition,
        attempt: u32,
        url: &str,
        failure: &AttemptFailure,
    ) -> Self {
        Self {
            position,
            attempt,
            kind: failure.kind,
            status: failure.status,
            message: failure.message.clone(),
            body: failure.body.clone(),
            retry_after_ms: failure.retry_after.map(|d| d.as_millis() as u64),
            url: url.to_string(),
            timestamp: Utc::now(),
        }
    }
}

/// Receives a report for every failed attempt except 404s.
///
/// Implemented for closures, so callers can pass `|report| ...` directly.
pub trait ErrorSink: Send + Sync {
    /// Called once per failed attempt.
    fn report(&self, report: &FetchErrorReport);
}

impl<F> ErrorSink for F
where
    F: Fn(&FetchErrorReport) + Send + Sync,
{
    fn report(&self, report: &FetchErrorReport) {
        self(report)
    }
}

/// Sink that discards every report.
#[derive(Debug, Default, Clone, Copy)]
pub struct IgnoreErrors;

impl ErrorSink for IgnoreErrors {
    fn report(&self, _report: &FetchErrorReport) {}
}
