//! Init command - write a configuration file with defaults.

use std::path::{Path, PathBuf};

use clap::Args;
use wplace_archiver::config::{config_file_path, ConfigFile};

use crate::error::CliError;

/// Arguments for the init-config command.
#[derive(Debug, Clone, Default, Args)]
pub struct InitArgs {
    /// Overwrite an existing configuration file
    #[arg(long)]
    pub force: bool,
}

/// Run the init-config command.
///
/// Runs before logging is set up so that a broken existing file can be
/// replaced with `--force`.
pub fn run(config_path: Option<PathBuf>, args: InitArgs) -> Result<(), CliError> {
    let path = config_path.unwrap_or_else(config_file_path);
    write_defaults(&path, args.force)?;

    println!("Configuration file: {}", path.display());
    println!();
    println!("Edit this file to customize wplace-archiver settings.");
    println!("CLI arguments override config file values when specified.");
    Ok(())
}

fn write_defaults(path: &Path, force: bool) -> Result<(), CliError> {
    if path.exists() && !force {
        return Err(CliError::Config(format!(
            "{} already exists; pass --force to overwrite it",
            path.display()
        )));
    }
    ConfigFile::default().save_to(path)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_writes_loadable_defaults() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("nested").join("config.ini");

        write_defaults(&path, false).unwrap();

        assert_eq!(ConfigFile::load_from(&path).unwrap(), ConfigFile::default());
    }

    #[test]
    fn test_refuses_to_overwrite() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("config.ini");
        std::fs::write(&path, "[output]\ncycles = 7\n").unwrap();

        assert!(matches!(write_defaults(&path, false), Err(CliError::Config(_))));
        assert_eq!(
            std::fs::read_to_string(&path).unwrap(),
            "[output]\ncycles = 7\n"
        );

        write_defaults(&path, true).unwrap();
        assert_eq!(ConfigFile::load_from(&path).unwrap(), ConfigFile::default());
    }
}
