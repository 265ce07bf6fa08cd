//! Logging infrastructure.
//!
//! Provides structured logging with file output and optional console output:
//! - Writes to `<log_dir>/<log_file>` (cleared on session start)
//! - Also prints to stdout unless disabled
//! - Configurable via the RUST_LOG environment variable

use std::fs;
use std::io;
use std::path::Path;

use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::EnvFilter;

/// Guard that must be kept alive for the duration of logging.
///
/// Dropping this guard will flush and close the log file writer.
pub struct LoggingGuard {
    _file_guard: WorkerGuard,
}

/// Logging options.
#[derive(Debug, Clone)]
pub struct LoggingOptions<'a> {
    /// Directory for log files.
    pub log_dir: &'a Path,
    /// Log file name.
    pub log_file: &'a str,
    /// Also log to stdout.
    pub stdout: bool,
    /// Default to debug level instead of info.
    pub debug: bool,
}

/// Default filter directive when RUST_LOG is unset.
fn default_directive(debug: bool) -> &'static str {
    if debug {
        "wplace_archiver=debug,info"
    } else {
        "info"
    }
}

/// Initialize logging system.
///
/// Creates the log directory if needed, clears the previous log file, and
/// sets up output to the file and optionally stdout.
///
/// # Returns
///
/// LoggingGuard that must be kept alive for logging to work
///
/// # Errors
///
/// Returns error if log directory cannot be created or log file cannot be cleared
pub fn init_logging(options: &LoggingOptions<'_>) -> Result<LoggingGuard, io::Error> {
    fs::create_dir_all(options.log_dir)?;

    // Start each session with an empty file.
    fs::write(options.log_dir.join(options.log_file), "")?;

    let file_appender = tracing_appender::rolling::never(options.log_dir, options.log_file);
    let (non_blocking_file, file_guard) = tracing_appender::non_blocking(file_appender);

    let file_layer = tracing_subscriber::fmt::layer()
        .with_writer(non_blocking_file)
        .with_ansi(false)
        .with_target(true);

    let stdout_layer = options.stdout.then(|| {
        tracing_subscriber::fmt::layer()
            .with_writer(io::stdout)
            .with_ansi(true)
            .with_target(false)
    });

    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_directive(options.debug)));

    tracing_subscriber::registry()
        .with(env_filter)
        .with(file_layer)
        .with(stdout_layer)
        .init();

    Ok(LoggingGuard {
        _file_guard: file_guard,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_directive() {
        assert_eq!(default_directive(false), "info");
        assert!(default_directive(true).contains("wplace_archiver=debug"));
        // Both must be valid filters.
        EnvFilter::try_new(default_directive(true)).unwrap();
        EnvFilter::try_new(default_directive(false)).unwrap();
    }

    #[test]
    fn test_guard_structure() {
        use tracing_appender::non_blocking::NonBlocking;

        let (non_blocking, guard) = NonBlocking::new(std::io::sink());
        drop(non_blocking);

        let _logging_guard = LoggingGuard { _file_guard: guard };
    }

    #[test]
    fn test_invalid_directory_error() {
        let temp_dir = tempfile::TempDir::new().unwrap();
        let blocker = temp_dir.path().join("file");
        fs::write(&blocker, "").unwrap();

        // A regular file in the way of the log directory.
        let options = LoggingOptions {
            log_dir: &blocker.join("logs"),
            log_file: "test.log",
            stdout: false,
            debug: false,
        };
        assert!(init_logging(&options).is_err());
    }

    // Installing a subscriber is global, so actual log output is not tested here.
}
