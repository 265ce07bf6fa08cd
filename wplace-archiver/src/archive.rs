//! Fixed-region archiving.
//!
//! Fetches every tile of a [`TileRegion`] through [`FetchQueue::fetch_many`],
//! so the region is pulled lazily under the queue's backpressure instead of
//! being submitted all at once.

use std::fmt;
use std::time::Duration;

use futures::stream;
use thiserror::Error;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::{error, info};

use crate::coord::TileRegion;
use crate::fetch::{ErrorSink, FetchQueue, Unrecoverable};
use crate::provider::AsyncHttpClient;
use crate::writer::{TileWriter, WriteError};

/// Errors that end a region archive run.
#[derive(Debug, Error)]
pub enum ArchiveError {
    /// The run was cancelled by a repeated interrupt.
    #[error("Archive interrupted")]
    Interrupted,

    /// A fetched tile could not be persisted.
    #[error(transparent)]
    Write(#[from] WriteError),
}

/// Outcome counters of a region archive run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RegionSummary {
    /// Tiles in the region.
    pub total: u64,
    /// Tiles fetched and written.
    pub fetched: u64,
    /// Tiles that returned 404.
    pub absent: u64,
    /// Tiles rejected with another client error.
    pub rejected: u64,
    /// Wall time of the run.
    pub elapsed: Duration,
}

impl fmt::Display for RegionSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}/{} tiles fetched, {} absent, {} rejected in {:.1}s",
            self.fetched,
            self.total,
            self.absent,
            self.rejected,
            self.elapsed.as_secs_f64()
        )
    }
}

/// Archives every tile in `region`.
///
/// A tile write failure stops the run; so does cancelling `shutdown`.
pub async fn archive_region<C, T, E>(
    queue: &FetchQueue<C>,
    region: &TileRegion,
    tiles: &T,
    errors: &E,
    shutdown: &CancellationToken,
) -> Result<RegionSummary, ArchiveError>
where
    C: AsyncHttpClient,
    T: TileWriter + ?Sized,
    E: ErrorSink + ?Sized,
{
    let started = Instant::now();
    let total = region.len();
    let mut summary = RegionSummary {
        total,
        ..RegionSummary::default()
    };
    let mut write_failure = None;
    let abort = CancellationToken::new();

    info!(
        min = %region.min(),
        max = %region.max(),
        tiles = total,
        "Archiving region"
    );

    let fetch = queue.fetch_many(
        stream::iter(region.positions()),
        errors,
        |position, result| match result {
            Ok(bytes) => {
                if write_failure.is_some() {
                    return;
                }
                match tiles.write_tile(position, &bytes) {
                    Ok(()) => summary.fetched += 1,
                    Err(e) => {
                        error!(tile = %position, error = %e, "Failed to write tile");
                        write_failure = Some(e);
                        abort.cancel();
                    }
                }
            }
            Err(Unrecoverable::Absent) => summary.absent += 1,
            Err(Unrecoverable::Rejected { .. }) => summary.rejected += 1,
        },
        |settled| settled as f64 / total as f64,
    );

    let interrupted = tokio::select! {
        _ = fetch => false,
        _ = abort.cancelled() => false,
        _ = shutdown.cancelled() => true,
    };

    if let Some(e) = write_failure {
        return Err(ArchiveError::Write(e));
    }
    if interrupted {
        return Err(ArchiveError::Interrupted);
    }

    summary.elapsed = started.elapsed();
    info!(%summary, "Region archived");
    Ok(summary)
}
