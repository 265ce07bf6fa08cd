//! Flood command - grow the archive outward from a seed tile.

use std::path::PathBuf;

use clap::Args;
use tracing::info;
use wplace_archiver::config::ConfigFile;
use wplace_archiver::coord::TilePosition;
use wplace_archiver::discovery::{DiscoveryConfig, DiscoveryEngine};
use wplace_archiver::fetch::FetchQueue;
use wplace_archiver::interrupt::InterruptController;
use wplace_archiver::provider::AsyncReqwestClient;
use wplace_archiver::writer::{DirectoryErrorWriter, DirectoryTileWriter, ErrorLog};

use super::common::{
    create_http_client, resolve_fetch_config, run_cycles, CycleArgs, CyclePlan, NetworkArgs,
};
use crate::error::CliError;
use crate::runner::CliRunner;

/// Arguments for the flood command.
#[derive(Debug, Clone, Default, Args)]
pub struct FloodArgs {
    /// Seed tile as "x,y" [default: from config]
    #[arg(long)]
    pub start: Option<TilePosition>,

    /// Radius around the seed within which tiles are admitted [default: from config]
    #[arg(long)]
    pub search_radius: Option<f64>,

    /// Radius of the neighbor kernel around each tile with content [default: from config]
    #[arg(long)]
    pub tolerance_radius: Option<f64>,

    /// Opaque pixels a tile needs before its neighbors are explored [default: from config]
    #[arg(long)]
    pub pixel_threshold: Option<u32>,

    /// Tiles in flight at once [default: from config]
    #[arg(long)]
    pub concurrency: Option<usize>,

    #[command(flatten)]
    pub network: NetworkArgs,

    #[command(flatten)]
    pub cycle: CycleArgs,
}

impl FloodArgs {
    /// Resolve discovery settings from CLI args and config.
    pub fn discovery_config(&self, config: &ConfigFile) -> DiscoveryConfig {
        let mut discovery = config.flood.discovery_config();
        if let Some(start) = self.start {
            discovery.starting_tile = start;
        }
        if let Some(radius) = self.search_radius {
            discovery = discovery.with_search_radius(radius);
        }
        if let Some(radius) = self.tolerance_radius {
            discovery = discovery.with_tolerance_radius(radius);
        }
        if let Some(threshold) = self.pixel_threshold {
            discovery = discovery.with_pixel_threshold(threshold);
        }
        if let Some(concurrency) = self.concurrency {
            discovery = discovery.with_concurrency(concurrency);
        }
        discovery
    }
}

/// Run the flood command.
pub fn run(runner: &CliRunner, args: FloodArgs) -> Result<(), CliError> {
    runner.log_startup("flood");

    let config = runner.config();
    let queue_config = resolve_fetch_config(&args.network, config)?;
    // Validates before any network activity.
    let discovery = DiscoveryEngine::new(args.discovery_config(config))?;
    let plan = CyclePlan::resolve(&args.cycle, config);
    let client = create_http_client(&queue_config)?;

    let discovery_config = discovery.config();
    println!("Flood archive");
    println!("  Seed:             {}", discovery_config.starting_tile);
    println!("  Search radius:    {}", discovery_config.search_radius);
    println!("  Tolerance radius: {}", discovery_config.tolerance_radius);
    println!("  Pixel threshold:  {}", discovery_config.pixel_threshold);
    println!("  Output:           {}", plan.output.display());
    println!();

    runner.block_on(async {
        let interrupts =
            InterruptController::new().with_stdin_resume(atty::is(atty::Stream::Stdin));
        interrupts.start();
        println!("Press Ctrl+C to pause, Enter to resume, Ctrl+C again to stop.");

        let discovery = discovery.with_interrupt(interrupts.gate(), interrupts.shutdown_token());
        let shutdown = interrupts.shutdown_token();

        let result = run_cycles(&plan, &shutdown, |number, directory| {
            let queue = FetchQueue::new(client.clone(), queue_config.clone())
                .with_interrupt_gate(interrupts.gate());
            let discovery = &discovery;
            async move { run_cycle(discovery, &queue, number, directory).await }
        })
        .await;

        interrupts.stop();
        result
    })
}

async fn run_cycle(
    discovery: &DiscoveryEngine,
    queue: &FetchQueue<AsyncReqwestClient>,
    number: u32,
    directory: PathBuf,
) -> Result<(), CliError> {
    let tiles = DirectoryTileWriter::new(&directory);
    let errors = ErrorLog::new(DirectoryErrorWriter::new(&directory));

    let summary = discovery.run(queue, &tiles, &errors).await?;
    if let Some(e) = errors.take_failure() {
        return Err(CliError::Write(e));
    }

    let stats = queue.stats();
    info!(cycle = number, %summary, attempts = stats.attempts, "Cycle complete");
    println!("Cycle {}: {}", number, summary);
    println!("  Directory: {}", directory.display());
    Ok(())
}
