//! Flood discovery scheduler.
//!
//! A single task owns the [`Frontier`] and drives up to `concurrency` fetch
//! tasks with `FuturesUnordered`. Each loop iteration:
//!
//! 1. Returns `Interrupted` if the run was cancelled.
//! 2. Unless the interrupt gate is paused, moves pending positions into
//!    flight until the scheduler is full.
//! 3. Stops once nothing is pending or in flight.
//! 4. Waits for the next settled fetch, cancellation, or resume.
//!
//! While paused, fetches already in flight keep being driven; only new
//! dispatch stops.

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use futures::stream::{FuturesUnordered, StreamExt};
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, trace, warn};

use super::config::DiscoveryConfig;
use super::error::DiscoveryError;
use super::frontier::Frontier;
use super::pixels::count_opaque_pixels_in_image;
use crate::coord::{DiscoveryKernel, TilePosition};
use crate::fetch::{ErrorSink, FetchQueue, FetchResult, PauseGate, Unrecoverable};
use crate::provider::AsyncHttpClient;
use crate::writer::TileWriter;

/// Settled tiles between progress log lines.
const PROGRESS_LOG_INTERVAL: u64 = 100;

/// Outcome counters of a completed discovery run.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct DiscoverySummary {
    /// Tiles fetched and written.
    pub fetched: u64,
    /// Tiles that returned 404.
    pub absent: u64,
    /// Tiles rejected with another client error.
    pub rejected: u64,
    /// Fetched tiles that met the pixel threshold.
    pub expanded: u64,
    /// Fetched tiles that could not be decoded.
    pub undecodable: u64,
    /// Positions admitted over the whole run, seed included.
    pub admitted: usize,
    /// Wall time of the run.
    pub elapsed: Duration,
}

impl DiscoverySummary {
    /// Tiles that reached a final outcome.
    pub fn settled(&self) -> u64 {
        self.fetched + self.absent + self.rejected
    }
}

impl fmt::Display for DiscoverySummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} tiles fetched ({} expanded), {} absent, {} rejected, {} admitted in {:.1}s",
            self.fetched,
            self.expanded,
            self.absent,
            self.rejected,
            self.admitted,
            self.elapsed.as_secs_f64()
        )
    }
}

/// Grows the archived area outward from a seed tile.
pub struct DiscoveryEngine {
    config: DiscoveryConfig,
    kernel: DiscoveryKernel,
    interrupt: Arc<PauseGate>,
    shutdown: CancellationToken,
}

impl DiscoveryEngine {
    /// Validates the configuration and precomputes the neighbor kernel.
    pub fn new(config: DiscoveryConfig) -> Result<Self, DiscoveryError> {
        config.validate()?;
        let kernel = DiscoveryKernel::new(config.tolerance_radius);
        Ok(Self {
            config,
            kernel,
            interrupt: Arc::new(PauseGate::new()),
            shutdown: CancellationToken::new(),
        })
    }

    /// Observes an interrupt gate and cancellation token.
    ///
    /// The same gate should be given to the fetch queue so that attempts
    /// already scheduled also hold while paused.
    pub fn with_interrupt(mut self, gate: Arc<PauseGate>, shutdown: CancellationToken) -> Self {
        self.interrupt = gate;
        self.shutdown = shutdown;
        self
    }

    /// The run configuration.
    pub fn config(&self) -> &DiscoveryConfig {
        &self.config
    }

    /// The precomputed neighbor kernel.
    pub fn kernel(&self) -> &DiscoveryKernel {
        &self.kernel
    }

    /// Runs discovery to exhaustion.
    ///
    /// Individual tile failures never fail the run. A tile write failure
    /// aborts it, as does cancellation of the shutdown token.
    pub async fn run<C, T, E>(
        &self,
        queue: &FetchQueue<C>,
        tiles: &T,
        errors: &E,
    ) -> Result<DiscoverySummary, DiscoveryError>
    where
        C: AsyncHttpClient,
        T: TileWriter + ?Sized,
        E: ErrorSink + ?Sized,
    {
        let started = Instant::now();
        let seed = self.config.starting_tile;
        let mut frontier = Frontier::seeded(seed);
        let mut in_flight = FuturesUnordered::new();
        let mut summary = DiscoverySummary::default();
        let mut paused_logged = false;

        info!(
            seed = %seed,
            search_radius = self.config.search_radius,
            tolerance_radius = self.config.tolerance_radius,
            kernel = self.kernel.len(),
            pixel_threshold = self.config.pixel_threshold,
            concurrency = self.config.concurrency,
            "Starting discovery"
        );

        loop {
            if self.shutdown.is_cancelled() {
                warn!(settled = summary.settled(), "Discovery cancelled");
                return Err(DiscoveryError::Interrupted);
            }

            if self.interrupt.is_paused() {
                if !paused_logged {
                    info!(in_flight = in_flight.len(), "Discovery paused");
                    paused_logged = true;
                }
            } else {
                if paused_logged {
                    info!("Discovery resumed");
                    paused_logged = false;
                }
                while in_flight.len() < self.config.concurrency {
                    let Some(position) = frontier.take_pending() else {
                        break;
                    };
                    in_flight.push(async move { (position, queue.fetch_one(position, errors).await) });
                }
            }

            if frontier.is_exhausted() {
                break;
            }

            tokio::select! {
                biased;

                _ = self.shutdown.cancelled() => {}

                Some((position, result)) = in_flight.next(), if !in_flight.is_empty() => {
                    self.settle(position, result, &mut frontier, tiles, &mut summary)?;

                    if summary.settled() % PROGRESS_LOG_INTERVAL == 0 {
                        let counts = frontier.counts();
                        info!(
                            settled = summary.settled(),
                            fetched = summary.fetched,
                            pending = counts.pending,
                            in_progress = counts.in_progress,
                            "Discovery progress"
                        );
                    }
                }

                _ = self.interrupt.wait_resumed(), if self.interrupt.is_paused() => {}
            }
        }

        summary.admitted = frontier.counts().admitted();
        summary.elapsed = started.elapsed();
        info!(%summary, "Discovery complete");
        Ok(summary)
    }

    fn settle<T>(
        &self,
        position: TilePosition,
        result: FetchResult,
        frontier: &mut Frontier,
        tiles: &T,
        summary: &mut DiscoverySummary,
    ) -> Result<(), DiscoveryError>
    where
        T: TileWriter + ?Sized,
    {
        frontier.complete(position);

        let bytes = match result {
            Ok(bytes) => bytes,
            Err(Unrecoverable::Absent) => {
                summary.absent += 1;
                return Ok(());
            }
            Err(Unrecoverable::Rejected { status }) => {
                summary.rejected += 1;
                debug!(tile = %position, status, "Tile rejected, not expanding");
                return Ok(());
            }
        };

        tiles.write_tile(position, &bytes)?;
        summary.fetched += 1;

        let opaque = match count_opaque_pixels_in_image(&bytes) {
            Ok(count) => count,
            Err(e) => {
                summary.undecodable += 1;
                warn!(tile = %position, error = %e, "Tile could not be decoded, not expanding");
                return Ok(());
            }
        };

        if opaque >= self.config.pixel_threshold {
            let admitted = frontier.admit_neighbors(
                position,
                &self.kernel,
                self.config.starting_tile,
                self.config.search_radius,
            );
            summary.expanded += 1;
            debug!(tile = %position, opaque, admitted, "Tile expanded");
        } else {
            trace!(tile = %position, opaque, "Tile below pixel threshold");
        }
        Ok(())
    }
}
