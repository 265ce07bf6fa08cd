//! On-disk sinks for fetched tiles and failed-attempt reports.
//!
//! # Layout
//!
//! ```text
//! {root}/
//! ├── {x}/{y}.png                          fetched tiles
//! └── errors/{x}/{y}/attempt-{n}.json      one report per failed attempt
//! ```

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use parking_lot::Mutex;
use thiserror::Error;
use tracing::{error, trace};

use crate::coord::TilePosition;
use crate::fetch::{ErrorSink, FetchErrorReport};

/// Errors raised while persisting tiles or reports.
#[derive(Debug, Error)]
pub enum WriteError {
    /// Filesystem failure.
    #[error("Failed to write {path}: {source}")]
    Io {
        /// Path being written.
        path: PathBuf,
        /// Underlying error.
        #[source]
        source: io::Error,
    },

    /// Report could not be serialized.
    #[error("Failed to serialize error report: {0}")]
    Serialize(#[from] serde_json::Error),
}

/// Persists fetched tile images.
pub trait TileWriter: Send + Sync {
    /// Called once per successfully fetched tile.
    fn write_tile(&self, position: TilePosition, bytes: &[u8]) -> Result<(), WriteError>;
}

/// Persists failed-attempt reports.
pub trait ErrorWriter: Send + Sync {
    /// Called once per failed attempt (404s excluded).
    fn write_error(&self, report: &FetchErrorReport) -> Result<(), WriteError>;
}

fn write_file(path: &Path, bytes: &[u8]) -> Result<(), WriteError> {
    let io_err = |source| WriteError::Io {
        path: path.to_path_buf(),
        source,
    };
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).map_err(io_err)?;
    }
    fs::write(path, bytes).map_err(io_err)?;
    trace!(path = %path.display(), bytes = bytes.len(), "File written");
    Ok(())
}

/// Writes tiles to `{root}/{x}/{y}.png`.
#[derive(Debug, Clone)]
pub struct DirectoryTileWriter {
    root: PathBuf,
}

impl DirectoryTileWriter {
    /// Creates a writer rooted at `root`. Directories are created on demand.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Output root.
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Path a tile is written to.
    pub fn tile_path(&self, position: TilePosition) -> PathBuf {
        self.root
            .join(position.x().to_string())
            .join(format!("{}.png", position.y()))
    }
}

impl TileWriter for DirectoryTileWriter {
    fn write_tile(&self, position: TilePosition, bytes: &[u8]) -> Result<(), WriteError> {
        write_file(&self.tile_path(position), bytes)
    }
}

/// Writes reports as pretty JSON to `{root}/errors/{x}/{y}/attempt-{n}.json`.
#[derive(Debug, Clone)]
pub struct DirectoryErrorWriter {
    root: PathBuf,
}

impl DirectoryErrorWriter {
    /// Creates a writer rooted at `root`.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Path a report is written to.
    pub fn report_path(&self, position: TilePosition, attempt: u32) -> PathBuf {
        self.root
            .join("errors")
            .join(position.x().to_string())
            .join(position.y().to_string())
            .join(format!("attempt-{}.json", attempt))
    }
}

impl ErrorWriter for DirectoryErrorWriter {
    fn write_error(&self, report: &FetchErrorReport) -> Result<(), WriteError> {
        let json = serde_json::to_vec_pretty(report)?;
        write_file(&self.report_path(report.position, report.attempt), &json)
    }
}

/// Adapts an [`ErrorWriter`] to the fetch queue's [`ErrorSink`].
///
/// Sinks cannot fail, so the first write failure is kept and can be
/// collected with [`ErrorLog::take_failure`] once the run is over. Later
/// failures are only logged.
pub struct ErrorLog<W: ErrorWriter> {
    writer: W,
    failure: Mutex<Option<WriteError>>,
}

impl<W: ErrorWriter> ErrorLog<W> {
    /// Wraps a writer.
    pub fn new(writer: W) -> Self {
        Self {
            writer,
            failure: Mutex::new(None),
        }
    }

    /// Returns the first write failure, if any, and clears it.
    pub fn take_failure(&self) -> Option<WriteError> {
        self.failure.lock().take()
    }
}

impl<W: ErrorWriter> ErrorSink for ErrorLog<W> {
    fn report(&self, report: &FetchErrorReport) {
        if let Err(e) = self.writer.write_error(report) {
            error!(tile = %report.position, attempt = report.attempt, error = %e, "Failed to write error report");
            self.failure.lock().get_or_insert(e);
        }
    }
}
