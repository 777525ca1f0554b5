//! Tile Service for resolving tile requests against cached archives.
//!
//! The TileService is the main entry point for tile requests. It orchestrates:
//! - Archive resolution through the shared [`ArchiveCache`]
//! - Directory lookup of the requested coordinate
//! - Lenient decoding of the stored tile payload
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                        TileService                          │
//! │  ┌───────────────────────────────────────────────────────┐  │
//! │  │                     get_tile()                        │  │
//! │  │  1. Resolve archive    3. Decode payload              │  │
//! │  │  2. Look up tile       4. Tile or Empty               │  │
//! │  └───────────────────────────────────────────────────────┘  │
//! │               │                              │              │
//! │               ▼                              ▼              │
//! │      ┌────────────────┐            ┌───────────────────┐    │
//! │      │  ArchiveCache  │            │  decode_tile()    │    │
//! │      └────────────────┘            └───────────────────┘    │
//! └─────────────────────────────────────────────────────────────┘
//! ```
//!
//! Only two failures cross this boundary: an archive that cannot be opened
//! ([`TileError::ArchiveNotFound`]) and coordinates outside the tile grid
//! ([`TileError::InvalidCoordinates`]). Everything else degrades to an empty
//! tile.

use std::sync::Arc;

use bytes::Bytes;
use serde::Serialize;
use tracing::{debug, error, warn};

use crate::archive::{ArchiveCache, ArchiveHandle, ArchiveSource, Compression, TileType};
use crate::compression::decode_tile;
use crate::error::{ArchiveError, IoError, TileError};

use super::request::TileRequest;

// =============================================================================
// Tile Response
// =============================================================================

/// Outcome of a tile request that did not fail.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TileResponse {
    /// Decoded tile bytes with their content type
    Tile {
        data: Bytes,
        content_type: &'static str,
    },

    /// Valid coordinate with no data (sparse archive)
    Empty,
}

impl TileResponse {
    pub fn is_empty(&self) -> bool {
        matches!(self, TileResponse::Empty)
    }

    /// Tile bytes, if any.
    pub fn data(&self) -> Option<&Bytes> {
        match self {
            TileResponse::Tile { data, .. } => Some(data),
            TileResponse::Empty => None,
        }
    }
}

/// Descriptive summary of an archive.
#[derive(Debug, Clone, Serialize)]
pub struct ArchiveSummary {
    pub name: String,
    pub tile_type: TileType,
    pub tile_compression: Compression,
    pub min_zoom: u8,
    pub max_zoom: u8,
    pub bounds: [f64; 4],
    pub center: [f64; 3],
    pub metadata: serde_json::Value,
}

// =============================================================================
// Tile Service
// =============================================================================

/// Service answering tile requests from cached archives.
///
/// # Type Parameters
///
/// * `S` - The archive source (local directory or remote base URL)
///
/// # Example
///
/// ```ignore
/// use tile_streamer::archive::{ArchiveCache, LocalArchiveSource};
/// use tile_streamer::tile::{TileRequest, TileService};
///
/// let cache = ArchiveCache::with_defaults(LocalArchiveSource::new("/data/tiles"));
/// let service = TileService::new(cache);
///
/// let request = TileRequest::parse("parcels/14/3421/1567.pbf")?;
/// match service.get_tile(&request).await? {
///     TileResponse::Tile { data, content_type } => { /* 200 */ }
///     TileResponse::Empty => { /* 204 */ }
/// }
/// ```
pub struct TileService<S: ArchiveSource> {
    cache: Arc<ArchiveCache<S>>,
}

impl<S: ArchiveSource + 'static> TileService<S> {
    /// Create a new tile service owning its cache.
    pub fn new(cache: ArchiveCache<S>) -> Self {
        Self {
            cache: Arc::new(cache),
        }
    }

    /// Create a new tile service over a shared cache.
    pub fn with_shared_cache(cache: Arc<ArchiveCache<S>>) -> Self {
        Self { cache }
    }

    /// The archive cache backing this service.
    pub fn cache(&self) -> &Arc<ArchiveCache<S>> {
        &self.cache
    }

    /// Resolve, look up and decode one tile.
    pub async fn get_tile(&self, request: &TileRequest) -> Result<TileResponse, TileError> {
        let archive = self.resolve(&request.name).await?;

        let raw = match archive.lookup_tile(request.coord).await {
            Ok(Some(raw)) if !raw.is_empty() => raw,
            Ok(_) => {
                debug!(tile = %request, "No tile data");
                return Ok(TileResponse::Empty);
            }
            Err(ArchiveError::TileOutOfBounds { .. }) => {
                return Err(TileError::InvalidCoordinates);
            }
            Err(e) => {
                warn!(tile = %request, error = %e, "Tile lookup failed, serving empty tile");
                return Ok(TileResponse::Empty);
            }
        };

        let header = archive.header();
        let data = decode_tile(header.tile_compression, raw);

        Ok(TileResponse::Tile {
            data,
            content_type: header.tile_type.content_type(),
        })
    }

    /// Summarize an archive's header and metadata.
    pub async fn archive_summary(&self, name: &str) -> Result<ArchiveSummary, TileError> {
        let archive = self.resolve(name).await?;
        let header = archive.header();

        let metadata = archive.metadata().await.unwrap_or_else(|e| {
            warn!(archive = name, error = %e, "Failed to read archive metadata");
            serde_json::Value::Object(Default::default())
        });

        Ok(ArchiveSummary {
            name: name.to_string(),
            tile_type: header.tile_type,
            tile_compression: header.tile_compression,
            min_zoom: header.min_zoom,
            max_zoom: header.max_zoom,
            bounds: header.bounds(),
            center: header.center(),
            metadata,
        })
    }

    /// Get an archive from the cache.
    ///
    /// The open runs on its own task so it completes and populates the cache
    /// even if the requesting client goes away.
    async fn resolve(&self, name: &str) -> Result<Arc<ArchiveHandle<S::Reader>>, TileError> {
        let cache = Arc::clone(&self.cache);
        let owned = name.to_string();

        let result = match tokio::spawn(async move { cache.get(&owned).await }).await {
            Ok(result) => result,
            Err(join_err) => Err(ArchiveError::Io(IoError::Local(format!(
                "archive open task failed: {}",
                join_err
            )))),
        };

        result.map_err(|source| {
            error!(archive = name, error = %source, "Archive not found");
            TileError::ArchiveNotFound {
                name: name.to_string(),
                source,
            }
        })
    }
}

impl<S: ArchiveSource> Clone for TileService<S> {
    fn clone(&self) -> Self {
        Self {
            cache: Arc::clone(&self.cache),
        }
    }
}
