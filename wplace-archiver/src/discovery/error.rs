//! Discovery error types.

use thiserror::Error;

use crate::writer::WriteError;

/// Errors that end a discovery run.
///
/// Individual tile failures are never errors; they only stop expansion at
/// that tile.
#[derive(Debug, Error)]
pub enum DiscoveryError {
    /// The configuration failed validation.
    #[error("Invalid discovery configuration: {0}")]
    InvalidConfig(String),

    /// The run was cancelled by a repeated interrupt.
    #[error("Discovery interrupted")]
    Interrupted,

    /// A fetched tile could not be persisted.
    #[error(transparent)]
    Write(#[from] WriteError),
}
