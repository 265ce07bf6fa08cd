//! Tile provider abstraction
//!
//! This module provides the HTTP client trait used by the fetch queue and the
//! URL scheme of the wplace tile backend.
//!
//! ```ignore
//! use std::time::Duration;
//! use wplace_archiver::provider::{AsyncReqwestClient, TileUrlTemplate};
//!
//! let client = AsyncReqwestClient::with_timeout(Duration::from_secs(125))?;
//! let urls = TileUrlTemplate::default();
//! ```

mod http;
mod wplace;

pub use http::{
    parse_retry_after, AsyncHttpClient, AsyncReqwestClient, HttpError, HttpResponse, TILE_ACCEPT,
    TILE_ACCEPT_LANGUAGE,
};
pub use wplace::{TileUrlTemplate, WPLACE_TILE_URL};

#[cfg(test)]
pub use http::tests::MockAsyncHttpClient;
