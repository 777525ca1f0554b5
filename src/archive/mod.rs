//! PMTiles archive access and caching.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────┐
//! │              Tile Service               │
//! └────────────────────┬────────────────────┘
//!                      │
//!                      ▼
//! ┌─────────────────────────────────────────┐
//! │             ArchiveCache                │
//! │   (size budget, TTL, singleflight)      │
//! └────────────────────┬────────────────────┘
//!                      │
//!                      ▼
//! ┌─────────────────────────────────────────┐
//! │            ArchiveHandle                │
//! │  (header, root dir, leaf dir LRU)       │
//! └────────────────────┬────────────────────┘
//!                      │
//!          ┌───────────┴───────────┐
//!          ▼                       ▼
//! ┌───────────────────┐  ┌─────────────────────┐
//! │ BufferRangeReader │  │  HttpRangeReader    │
//! │   (local file)    │  │  (remote, ranged)   │
//! └───────────────────┘  └─────────────────────┘
//! ```

mod cache;
mod directory;
mod handle;
mod header;
mod source;
mod tile_id;


pub use cache::{
    ArchiveCache, CacheConfig, CacheStats, DEFAULT_CACHE_MAX_BYTES, DEFAULT_CACHE_TTL,
    DEFAULT_REMOTE_SIZE_ESTIMATE,
};
pub use directory::{Directory, Entry};
pub use handle::{ArchiveHandle, DEFAULT_LEAF_CACHE_CAPACITY, MAX_DIRECTORY_DEPTH};
pub use header::{ArchiveHeader, Compression, TileType, HEADER_SIZE};
pub use source::{
    ArchiveSource, LocalArchiveSource, RemoteArchiveSource, DEFAULT_ARCHIVE_EXTENSION,
};
pub use tile_id::{zoom_base, TileCoord, MAX_ZOOM};
