//! wplace-archiver CLI - Command-line interface
//!
//! Archives tiles from the wplace canvas, either by flooding outward from a
//! seed tile or by fetching a fixed region, optionally repeating on an
//! interval.

mod commands;
mod error;
mod runner;

use std::path::PathBuf;

use clap::{Parser, Subcommand};

use commands::flood::FloodArgs;
use commands::init::InitArgs;
use commands::region::RegionArgs;
use error::CliError;
use runner::CliRunner;

#[derive(Parser)]
#[command(name = "wplace-archiver")]
#[command(version, about = "Archive tiles from the wplace canvas", long_about = None)]
struct Cli {
    /// Enable debug-level logging
    #[arg(long, global = true)]
    debug: bool,

    /// Configuration file [default: ~/.wplace-archiver/config.ini]
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Archive outward from a seed tile wherever content is found
    Flood(FloodArgs),

    /// Archive a fixed rectangle of tiles
    Region(RegionArgs),

    /// Write a configuration file with default settings
    InitConfig(InitArgs),
}

fn main() {
    let cli = Cli::parse();

    if let Err(e) = run(cli) {
        e.exit();
    }
}

fn run(cli: Cli) -> Result<(), CliError> {
    match cli.command {
        Commands::InitConfig(args) => commands::init::run(cli.config, args),
        Commands::Flood(args) => {
            let runner = CliRunner::new(cli.config.as_deref(), cli.debug)?;
            commands::flood::run(&runner, args)
        }
        Commands::Region(args) => {
            let runner = CliRunner::new(cli.config.as_deref(), cli.debug)?;
            commands::region::run(&runner, args)
        }
    }
}
