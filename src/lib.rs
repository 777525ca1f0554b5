//! # Tile Streamer
//!
//! A map tile server for PMTiles archives stored on local disk or behind an
//! HTTP server that supports range requests.
//!
//! This library provides the core functionality for serving slippy-map tiles
//! out of single-file tile archives. Remote archives are never downloaded
//! whole: the header, directories and tiles are fetched with range requests.
//!
//! ## Features
//!
//! - **Two storage modes**: a directory of local archives, or a remote base URL
//! - **Bounded archive cache**: byte budget plus idle TTL, singleflight opens
//! - **Lenient decoding**: gzip and brotli tiles are inflated; corrupt
//!   payloads are served raw instead of failing the request
//! - **Sparse-aware responses**: coordinates without data answer 204
//!
//! ## Architecture
//!
//! The library is organized into several modules:
//!
//! - [`io`] - Byte range readers (in-memory buffer, HTTP)
//! - [`archive`] - PMTiles parsing, archive handles and the archive cache
//! - [`compression`] - Decompression dispatch for tiles and directories
//! - [`tile`] - Request parsing and the tile service
//! - [`server`] - Axum-based HTTP server and routes
//! - [`config`] - CLI and configuration types
//!
//! ## Example
//!
//! ```rust,no_run
//! use tile_streamer::{create_router, ArchiveCache, LocalArchiveSource, RouterConfig, TileService};
//!
//! #[tokio::main]
//! async fn main() {
//!     let source = LocalArchiveSource::new("./tiles");
//!     let cache = ArchiveCache::with_defaults(source);
//!     let router = create_router(TileService::new(cache), RouterConfig::new());
//!
//!     let listener = tokio::net::TcpListener::bind("0.0.0.0:3000").await.unwrap();
//!     axum::serve(listener, router).await.unwrap();
//! }
//! ```

pub mod archive;
pub mod compression;
pub mod config;
pub mod error;
pub mod io;
pub mod server;
pub mod tile;

// Re-export commonly used types
pub use archive::{
    ArchiveCache, ArchiveHandle, ArchiveHeader, ArchiveSource, CacheConfig, CacheStats,
    Compression, LocalArchiveSource, RemoteArchiveSource, TileCoord, TileType,
};
pub use compression::{decode_tile, decompress, DecodeStrategy};
pub use config::{Config, StorageMode};
pub use error::{ArchiveError, IoError, TileError};
pub use io::{create_http_client, BufferRangeReader, HttpRangeReader, RangeReader};
pub use server::{create_router, AppState, ErrorResponse, RouterConfig};
pub use tile::{ArchiveSummary, TileRequest, TileResponse, TileService};
