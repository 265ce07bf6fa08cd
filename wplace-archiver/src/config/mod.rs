//! User configuration
//!
//! Settings are read from `~/.wplace-archiver/config.ini`. A missing file
//! means defaults; present keys overlay them. Command-line flags override
//! both.

mod file;
mod parser;
mod settings;
mod writer;

pub use file::{config_directory, config_file_path, ConfigFileError};
pub use settings::{
    ConfigFile, FloodSettings, LoggingSettings, NetworkSettings, OutputSettings, DEFAULT_CYCLES,
    DEFAULT_INTERVAL_SECS, DEFAULT_LOG_FILE, DEFAULT_OUTPUT_DIR,
};
