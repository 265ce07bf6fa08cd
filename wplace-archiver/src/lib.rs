//! wplace-archiver - Tile archiving for the wplace canvas
//!
//! This library provides the tile acquisition engine behind the
//! `wplace-archiver` command: a rate-limited, retrying fetch queue and a
//! flood discovery engine that grows the archived area outward from a seed
//! tile wherever content is found.
//!
//! # Modules
//!
//! - [`coord`]: tile positions, wraparound, neighbor kernel and regions
//! - [`provider`]: HTTP client abstraction and the tile URL scheme
//! - [`fetch`]: the rate-limited retry queue
//! - [`discovery`]: flood discovery over the fetch queue
//! - [`archive`]: fixed-region archiving over the fetch queue
//! - [`writer`]: on-disk tile and error report sinks
//! - [`interrupt`]: Ctrl+C pause, resume and shutdown
//! - [`config`]: `~/.wplace-archiver/config.ini`
//! - [`logging`]: tracing subscriber setup

pub mod archive;
pub mod config;
pub mod coord;
pub mod discovery;
pub mod fetch;
pub mod interrupt;
pub mod logging;
pub mod provider;
pub mod writer;

/// Library version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
