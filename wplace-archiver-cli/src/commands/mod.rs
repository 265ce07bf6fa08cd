//! CLI command implementations.

pub mod common;
pub mod flood;
pub mod init;
pub mod region;
