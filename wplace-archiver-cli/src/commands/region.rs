//! Region command - archive a fixed rectangle of tiles.

use std::path::PathBuf;

use clap::Args;
use tokio_util::sync::CancellationToken;
use tracing::info;
use wplace_archiver::archive::archive_region;
use wplace_archiver::coord::TileRegion;
use wplace_archiver::fetch::FetchQueue;
use wplace_archiver::interrupt::InterruptController;
use wplace_archiver::provider::AsyncReqwestClient;
use wplace_archiver::writer::{DirectoryErrorWriter, DirectoryTileWriter, ErrorLog};

use super::common::{
    create_http_client, resolve_fetch_config, run_cycles, CycleArgs, CyclePlan, NetworkArgs,
};
use crate::error::CliError;
use crate::runner::CliRunner;

/// Arguments for the region command.
#[derive(Debug, Clone, Args)]
pub struct RegionArgs {
    /// Corners as "x1,y1:x2,y2", both inclusive
    pub region: TileRegion,

    #[command(flatten)]
    pub network: NetworkArgs,

    #[command(flatten)]
    pub cycle: CycleArgs,
}

/// Run the region command.
pub fn run(runner: &CliRunner, args: RegionArgs) -> Result<(), CliError> {
    runner.log_startup("region");

    let config = runner.config();
    let queue_config = resolve_fetch_config(&args.network, config)?;
    let plan = CyclePlan::resolve(&args.cycle, config);
    let client = create_http_client(&queue_config)?;
    let region = args.region;

    println!("Region archive");
    println!("  From:   {}", region.min());
    println!("  To:     {}", region.max());
    println!("  Tiles:  {}", region.len());
    println!("  Output: {}", plan.output.display());
    println!();

    runner.block_on(async {
        let interrupts =
            InterruptController::new().with_stdin_resume(atty::is(atty::Stream::Stdin));
        interrupts.start();
        println!("Press Ctrl+C to pause, Enter to resume, Ctrl+C again to stop.");

        let shutdown = interrupts.shutdown_token();
        let result = run_cycles(&plan, &shutdown, |number, directory| {
            let queue = FetchQueue::new(client.clone(), queue_config.clone())
                .with_interrupt_gate(interrupts.gate());
            let region = &region;
            let shutdown = &shutdown;
            async move { run_cycle(&queue, region, shutdown, number, directory).await }
        })
        .await;

        interrupts.stop();
        result
    })
}

async fn run_cycle(
    queue: &FetchQueue<AsyncReqwestClient>,
    region: &TileRegion,
    shutdown: &CancellationToken,
    number: u32,
    directory: PathBuf,
) -> Result<(), CliError> {
    let tiles = DirectoryTileWriter::new(&directory);
    let errors = ErrorLog::new(DirectoryErrorWriter::new(&directory));

    let summary = archive_region(queue, region, &tiles, &errors, shutdown).await?;
    if let Some(e) = errors.take_failure() {
        return Err(CliError::Write(e));
    }

    info!(cycle = number, %summary, "Cycle complete");
    println!("Cycle {}: {}", number, summary);
    println!("  Directory: {}", directory.display());
    Ok(())
}
