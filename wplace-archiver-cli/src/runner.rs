//! CLI runner for common setup.
//!
//! Encapsulates config loading, logging initialization and runtime creation
//! so command handlers share one lifecycle.

use std::future::Future;
use std::path::Path;

use tokio::runtime::Runtime;
use tracing::info;
use wplace_archiver::config::ConfigFile;
use wplace_archiver::logging::{init_logging, LoggingGuard, LoggingOptions};

use crate::error::CliError;

/// Runner that manages CLI lifecycle and common operations.
pub struct CliRunner {
    /// Logging guard - keeps logging active while runner exists
    #[allow(dead_code)]
    logging_guard: LoggingGuard,
    /// Loaded configuration file
    config: ConfigFile,
    runtime: Runtime,
}

impl CliRunner {
    /// Loads the config file, initializes logging and builds the runtime.
    ///
    /// # Arguments
    ///
    /// * `config_path` - Config file to load instead of the default
    /// * `debug_mode` - When true, enables debug-level logging unless RUST_LOG is set
    pub fn new(config_path: Option<&Path>, debug_mode: bool) -> Result<Self, CliError> {
        let config = match config_path {
            Some(path) => ConfigFile::load_from(path)?,
            None => ConfigFile::load()?,
        };

        let logging_guard = init_logging(&LoggingOptions {
            log_dir: &config.logging.directory,
            log_file: &config.logging.file,
            stdout: config.logging.stdout,
            debug: debug_mode,
        })
        .map_err(|e| CliError::LoggingInit(e.to_string()))?;

        let runtime = tokio::runtime::Builder::new_multi_thread()
            .enable_all()
            .thread_name("wplace-archiver")
            .build()
            .map_err(|e| CliError::Runtime(e.to_string()))?;

        Ok(Self {
            logging_guard,
            config,
            runtime,
        })
    }

    /// Get the loaded configuration.
    pub fn config(&self) -> &ConfigFile {
        &self.config
    }

    /// Log startup information for a command.
    pub fn log_startup(&self, command: &str) {
        info!("wplace-archiver v{}", wplace_archiver::VERSION);
        info!("wplace-archiver CLI: {} command", command);
    }

    /// Runs a future to completion on the runtime.
    pub fn block_on<F: Future>(&self, future: F) -> F::Output {
        self.runtime.block_on(future)
    }
}
