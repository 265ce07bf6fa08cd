//! CLI error handling with user-friendly messages.
//!
//! Centralizes error handling for the CLI, providing consistent formatting
//! and appropriate exit codes.

use std::fmt;
use std::process;

use wplace_archiver::archive::ArchiveError;
use wplace_archiver::config::ConfigFileError;
use wplace_archiver::discovery::DiscoveryError;
use wplace_archiver::provider::HttpError;
use wplace_archiver::writer::WriteError;

/// Exit code for a run ended by a repeated Ctrl+C (128 + SIGINT).
pub const EXIT_INTERRUPTED: i32 = 130;

/// CLI-specific errors with user-friendly messages.
#[derive(Debug)]
pub enum CliError {
    /// Failed to initialize logging
    LoggingInit(String),
    /// Configuration error
    Config(String),
    /// Configuration file could not be read or written
    ConfigFile(ConfigFileError),
    /// Failed to create the Tokio runtime
    Runtime(String),
    /// Failed to create the HTTP client
    HttpClient(HttpError),
    /// Discovery run failed
    Discovery(DiscoveryError),
    /// Region run failed
    Archive(ArchiveError),
    /// Error report could not be written
    Write(WriteError),
    /// Stopped by a repeated Ctrl+C
    Interrupted,
}

impl CliError {
    /// Exit the process with an appropriate error message and code.
    pub fn exit(&self) -> ! {
        if self.is_interrupted() {
            eprintln!("Interrupted.");
            process::exit(EXIT_INTERRUPTED)
        }

        eprintln!("Error: {}", self);

        if let CliError::ConfigFile(ConfigFileError::InvalidValue { .. }) = self {
            eprintln!();
            eprintln!("Fix the value in the config file or run 'wplace-archiver init-config --force'");
            eprintln!("to write a fresh file with defaults.");
        }

        process::exit(1)
    }

    fn is_interrupted(&self) -> bool {
        matches!(
            self,
            CliError::Interrupted
                | CliError::Discovery(DiscoveryError::Interrupted)
                | CliError::Archive(ArchiveError::Interrupted)
        )
    }
}

impl fmt::Display for CliError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CliError::LoggingInit(msg) => write!(f, "Failed to initialize logging: {}", msg),
            CliError::Config(msg) => write!(f, "Configuration error: {}", msg),
            CliError::ConfigFile(e) => write!(f, "{}", e),
            CliError::Runtime(msg) => write!(f, "Failed to create Tokio runtime: {}", msg),
            CliError::HttpClient(e) => write!(f, "{}", e),
            CliError::Discovery(e) => write!(f, "Flood run failed: {}", e),
            CliError::Archive(e) => write!(f, "Region run failed: {}", e),
            CliError::Write(e) => write!(f, "{}", e),
            CliError::Interrupted => write!(f, "Interrupted"),
        }
    }
}

impl std::error::Error for CliError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            CliError::ConfigFile(e) => Some(e),
            CliError::HttpClient(e) => Some(e),
            CliError::Discovery(e) => Some(e),
            CliError::Archive(e) => Some(e),
            CliError::Write(e) => Some(e),
            _ => None,
        }
    }
}

impl From<ConfigFileError> for CliError {
    fn from(e: ConfigFileError) -> Self {
        CliError::ConfigFile(e)
    }
}

impl From<DiscoveryError> for CliError {
    fn from(e: DiscoveryError) -> Self {
        CliError::Discovery(e)
    }
}

impl From<ArchiveError> for CliError {
    fn from(e: ArchiveError) -> Self {
        CliError::Archive(e)
    }
}

impl From<WriteError> for CliError {
    fn from(e: WriteError) -> Self {
        CliError::Write(e)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_interrupted_variants() {
        assert!(CliError::Interrupted.is_interrupted());
        assert!(CliError::Discovery(DiscoveryError::Interrupted).is_interrupted());
        assert!(CliError::Archive(ArchiveError::Interrupted).is_interrupted());
        assert!(!CliError::Config("bad".into()).is_interrupted());
    }

    #[test]
    fn test_display() {
        let e = CliError::Discovery(DiscoveryError::InvalidConfig("radius".into()));
        assert_eq!(
            e.to_string(),
            "Flood run failed: Invalid discovery configuration: radius"
        );
    }
}
