//! Common types and utilities shared across CLI commands.

use std::future::Future;
use std::path::{Path, PathBuf};
use std::time::Duration;

use chrono::{DateTime, Utc};
use clap::Args;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::info;
use wplace_archiver::config::ConfigFile;
use wplace_archiver::fetch::FetchQueueConfig;
use wplace_archiver::provider::AsyncReqwestClient;

use crate::error::CliError;

/// Format of the per-cycle output directory name.
pub const CYCLE_DIR_FORMAT: &str = "%Y-%m-%dT%H-%M-%SZ";

/// Network overrides shared by the archiving commands.
#[derive(Debug, Clone, Default, Args)]
pub struct NetworkArgs {
    /// Maximum requests started per second [default: from config]
    #[arg(long)]
    pub requests_per_second: Option<usize>,

    /// Maximum requests in flight [default: from config]
    #[arg(long)]
    pub request_concurrency: Option<usize>,
}

/// Output and repetition overrides shared by the archiving commands.
#[derive(Debug, Clone, Default, Args)]
pub struct CycleArgs {
    /// Root directory for archive cycles [default: from config]
    #[arg(long, short)]
    pub output: Option<PathBuf>,

    /// Number of cycles to run, 0 runs until interrupted [default: from config]
    #[arg(long)]
    pub cycles: Option<u32>,

    /// Seconds between cycle starts [default: from config]
    #[arg(long)]
    pub interval: Option<u64>,
}

/// Resolved repetition settings.
#[derive(Debug, Clone, PartialEq)]
pub struct CyclePlan {
    pub output: PathBuf,
    /// 0 means unbounded.
    pub cycles: u32,
    pub interval: Duration,
}

impl CyclePlan {
    /// Resolve cycle settings from CLI args and config.
    pub fn resolve(args: &CycleArgs, config: &ConfigFile) -> Self {
        // CLI takes precedence, then config
        Self {
            output: args
                .output
                .clone()
                .unwrap_or_else(|| config.output.directory.clone()),
            cycles: args.cycles.unwrap_or(config.output.cycles),
            interval: Duration::from_secs(args.interval.unwrap_or(config.output.interval_secs)),
        }
    }

    fn is_last(&self, cycle: u32) -> bool {
        self.cycles != 0 && cycle >= self.cycles
    }
}

/// Resolve fetch queue settings from CLI args and config.
pub fn resolve_fetch_config(
    args: &NetworkArgs,
    config: &ConfigFile,
) -> Result<FetchQueueConfig, CliError> {
    let mut queue = config.network.fetch_queue_config();
    if let Some(rps) = args.requests_per_second {
        queue = queue.with_requests_per_second(rps);
    }
    if let Some(concurrency) = args.request_concurrency {
        queue = queue.with_request_concurrency(concurrency);
    }

    if queue.requests_per_second == 0 {
        return Err(CliError::Config(
            "requests per second must be at least 1".to_string(),
        ));
    }
    if queue.request_concurrency == 0 {
        return Err(CliError::Config(
            "request concurrency must be at least 1".to_string(),
        ));
    }
    Ok(queue)
}

/// Creates the HTTP client with a timeout matching the backoff ceiling.
pub fn create_http_client(queue: &FetchQueueConfig) -> Result<AsyncReqwestClient, CliError> {
    AsyncReqwestClient::with_timeout(queue.backoff.request_timeout()).map_err(CliError::HttpClient)
}

/// Output directory for a cycle started at `started`.
pub fn cycle_directory(root: &Path, started: DateTime<Utc>) -> PathBuf {
    root.join(started.format(CYCLE_DIR_FORMAT).to_string())
}

/// Runs `cycle` according to `plan`.
///
/// Each cycle gets a fresh timestamped directory under `plan.output`. The
/// next cycle starts `plan.interval` after the previous one started, or
/// immediately when the previous cycle overran. Cancelling `shutdown`
/// during the wait ends the loop with [`CliError::Interrupted`].
pub async fn run_cycles<F, Fut>(
    plan: &CyclePlan,
    shutdown: &CancellationToken,
    mut cycle: F,
) -> Result<(), CliError>
where
    F: FnMut(u32, PathBuf) -> Fut,
    Fut: Future<Output = Result<(), CliError>>,
{
    let mut number = 1;
    loop {
        let started = Instant::now();
        let directory = cycle_directory(&plan.output, Utc::now());
        info!(cycle = number, directory = %directory.display(), "Starting cycle");

        cycle(number, directory).await?;

        if plan.is_last(number) {
            return Ok(());
        }

        let next = started + plan.interval;
        if next > Instant::now() {
            info!(
                wait_secs = (next - Instant::now()).as_secs(),
                "Waiting for next cycle"
            );
        }
        tokio::select! {
            _ = shutdown.cancelled() => return Err(CliError::Interrupted),
            _ = tokio::time::sleep_until(next) => {}
        }
        number += 1;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use std::sync::{Arc, Mutex};

    #[test]
    fn test_cycle_directory_format() {
        let started = Utc.with_ymd_and_hms(2025, 8, 9, 14, 3, 7).unwrap();
        assert_eq!(
            cycle_directory(Path::new("archives"), started),
            PathBuf::from("archives/2025-08-09T14-03-07Z")
        );
    }

    #[test]
    fn test_cycle_plan_prefers_cli() {
        let config = ConfigFile::default();
        let plan = CyclePlan::resolve(
            &CycleArgs {
                output: Some(PathBuf::from("/tmp/out")),
                cycles: None,
                interval: Some(60),
            },
            &config,
        );
        assert_eq!(plan.output, PathBuf::from("/tmp/out"));
        assert_eq!(plan.cycles, config.output.cycles);
        assert_eq!(plan.interval, Duration::from_secs(60));
    }

    #[test]
    fn test_fetch_config_overrides() {
        let config = ConfigFile::default();
        let queue = resolve_fetch_config(
            &NetworkArgs {
                requests_per_second: Some(3),
                request_concurrency: None,
            },
            &config,
        )
        .unwrap();
        assert_eq!(queue.requests_per_second, 3);
        assert_eq!(
            queue.request_concurrency,
            config.network.request_concurrency
        );
    }

    #[test]
    fn test_fetch_config_rejects_zero() {
        let config = ConfigFile::default();
        let result = resolve_fetch_config(
            &NetworkArgs {
                requests_per_second: Some(0),
                request_concurrency: None,
            },
            &config,
        );
        assert!(matches!(result, Err(CliError::Config(_))));
    }

    fn plan(cycles: u32, interval_secs: u64) -> CyclePlan {
        CyclePlan {
            output: PathBuf::from("archives"),
            cycles,
            interval: Duration::from_secs(interval_secs),
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_cycles_are_spaced_by_interval() {
        let starts = Arc::new(Mutex::new(Vec::new()));
        let origin = Instant::now();

        let recorded = starts.clone();
        run_cycles(&plan(3, 10), &CancellationToken::new(), |number, _| {
            let recorded = recorded.clone();
            async move {
                recorded.lock().unwrap().push((number, origin.elapsed()));
                tokio::time::sleep(Duration::from_secs(4)).await;
                Ok(())
            }
        })
        .await
        .unwrap();

        let starts = starts.lock().unwrap();
        assert_eq!(
            *starts,
            vec![
                (1, Duration::ZERO),
                (2, Duration::from_secs(10)),
                (3, Duration::from_secs(20)),
            ]
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_overrunning_cycle_starts_next_immediately() {
        let starts = Arc::new(Mutex::new(Vec::new()));
        let origin = Instant::now();

        let recorded = starts.clone();
        run_cycles(&plan(2, 5), &CancellationToken::new(), |_, _| {
            let recorded = recorded.clone();
            async move {
                recorded.lock().unwrap().push(origin.elapsed());
                tokio::time::sleep(Duration::from_secs(8)).await;
                Ok(())
            }
        })
        .await
        .unwrap();

        assert_eq!(
            *starts.lock().unwrap(),
            vec![Duration::ZERO, Duration::from_secs(8)]
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_shutdown_during_wait() {
        let shutdown = CancellationToken::new();
        let canceller = shutdown.clone();
        let mut runs = 0;

        let result = run_cycles(&plan(0, 3600), &shutdown, |_, _| {
            runs += 1;
            canceller.cancel();
            async { Ok(()) }
        })
        .await;

        assert!(matches!(result, Err(CliError::Interrupted)));
        assert_eq!(runs, 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_cycle_error_stops_loop() {
        let mut runs = 0;
        let result = run_cycles(&plan(0, 1), &CancellationToken::new(), |_, _| {
            runs += 1;
            async { Err(CliError::Config("boom".to_string())) }
        })
        .await;

        assert!(matches!(result, Err(CliError::Config(_))));
        assert_eq!(runs, 1);
    }
}
