//! PMTiles v3 header parsing.
//!
//! The header is a fixed 127-byte little-endian block at the start of every
//! archive. It is read once when an archive is opened and never changes.

use serde::Serialize;

use crate::error::ArchiveError;
use crate::io::{read_i32_le, read_u64_le};

/// Size of the fixed PMTiles v3 header in bytes.
pub const HEADER_SIZE: usize = 127;

/// Magic bytes at the start of every archive.
pub const MAGIC: &[u8; 7] = b"PMTiles";

/// The only archive version this crate reads.
pub const SUPPORTED_VERSION: u8 = 3;

// =============================================================================
// Compression
// =============================================================================

/// Compression scheme applied to tiles or to directories/metadata.
///
/// Every byte maps to a variant: codes outside the known range become
/// `Unknown`, which is treated as passthrough when decoding.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Compression {
    Unknown,
    None,
    Gzip,
    Brotli,
    Zstd,
}

impl Compression {
    /// Map a header byte to a compression scheme.
    pub fn from_code(code: u8) -> Self {
        match code {
            1 => Compression::None,
            2 => Compression::Gzip,
            3 => Compression::Brotli,
            4 => Compression::Zstd,
            _ => Compression::Unknown,
        }
    }

    /// The header byte for this scheme.
    pub fn code(self) -> u8 {
        match self {
            Compression::Unknown => 0,
            Compression::None => 1,
            Compression::Gzip => 2,
            Compression::Brotli => 3,
            Compression::Zstd => 4,
        }
    }

    /// Short name for logs and error messages.
    pub fn name(self) -> &'static str {
        match self {
            Compression::Unknown => "unknown",
            Compression::None => "none",
            Compression::Gzip => "gzip",
            Compression::Brotli => "brotli",
            Compression::Zstd => "zstd",
        }
    }
}

// =============================================================================
// Tile Type
// =============================================================================

/// Format of the tile payloads stored in the archive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum TileType {
    Unknown,
    Mvt,
    Png,
    Jpeg,
    Webp,
    Avif,
}

impl TileType {
    /// Map a header byte to a tile type.
    pub fn from_code(code: u8) -> Self {
        match code {
            1 => TileType::Mvt,
            2 => TileType::Png,
            3 => TileType::Jpeg,
            4 => TileType::Webp,
            5 => TileType::Avif,
            _ => TileType::Unknown,
        }
    }

    /// HTTP content type for tiles of this type.
    pub fn content_type(self) -> &'static str {
        match self {
            TileType::Mvt => "application/x-protobuf",
            TileType::Png => "image/png",
            TileType::Jpeg => "image/jpeg",
            TileType::Webp => "image/webp",
            TileType::Avif => "image/avif",
            TileType::Unknown => "application/octet-stream",
        }
    }
}

// =============================================================================
// Header
// =============================================================================

/// Parsed PMTiles v3 header.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArchiveHeader {
    pub root_dir_offset: u64,
    pub root_dir_length: u64,
    pub metadata_offset: u64,
    pub metadata_length: u64,
    pub leaf_dirs_offset: u64,
    pub leaf_dirs_length: u64,
    pub tile_data_offset: u64,
    pub tile_data_length: u64,
    pub addressed_tiles_count: u64,
    pub tile_entries_count: u64,
    pub tile_contents_count: u64,
    pub clustered: bool,
    /// Compression of directories and metadata
    pub internal_compression: Compression,
    /// Compression of tile payloads
    pub tile_compression: Compression,
    pub tile_type: TileType,
    pub min_zoom: u8,
    pub max_zoom: u8,
    /// Bounds in degrees * 1e7: (min_lon, min_lat, max_lon, max_lat)
    pub bounds_e7: (i32, i32, i32, i32),
    pub center_zoom: u8,
    /// Center in degrees * 1e7: (lon, lat)
    pub center_e7: (i32, i32),
}

impl ArchiveHeader {
    /// Parse a header from the first bytes of an archive.
    pub fn parse(bytes: &[u8]) -> Result<Self, ArchiveError> {
        if bytes.len() < HEADER_SIZE {
            return Err(ArchiveError::HeaderTooSmall {
                required: HEADER_SIZE,
                actual: bytes.len(),
            });
        }

        if &bytes[0..7] != MAGIC {
            return Err(ArchiveError::InvalidMagic);
        }

        let version = bytes[7];
        if version != SUPPORTED_VERSION {
            return Err(ArchiveError::UnsupportedVersion(version));
        }

        let min_zoom = bytes[100];
        let max_zoom = bytes[101];
        if min_zoom > max_zoom {
            return Err(ArchiveError::InvalidZoomRange { min_zoom, max_zoom });
        }

        Ok(Self {
            root_dir_offset: read_u64_le(&bytes[8..]),
            root_dir_length: read_u64_le(&bytes[16..]),
            metadata_offset: read_u64_le(&bytes[24..]),
            metadata_length: read_u64_le(&bytes[32..]),
            leaf_dirs_offset: read_u64_le(&bytes[40..]),
            leaf_dirs_length: read_u64_le(&bytes[48..]),
            tile_data_offset: read_u64_le(&bytes[56..]),
            tile_data_length: read_u64_le(&bytes[64..]),
            addressed_tiles_count: read_u64_le(&bytes[72..]),
            tile_entries_count: read_u64_le(&bytes[80..]),
            tile_contents_count: read_u64_le(&bytes[88..]),
            clustered: bytes[96] == 1,
            internal_compression: Compression::from_code(bytes[97]),
            tile_compression: Compression::from_code(bytes[98]),
            tile_type: TileType::from_code(bytes[99]),
            min_zoom,
            max_zoom,
            bounds_e7: (
                read_i32_le(&bytes[102..]),
                read_i32_le(&bytes[106..]),
                read_i32_le(&bytes[110..]),
                read_i32_le(&bytes[114..]),
            ),
            center_zoom: bytes[118],
            center_e7: (read_i32_le(&bytes[119..]), read_i32_le(&bytes[123..])),
        })
    }

    /// Whether `z` lies inside the declared zoom range.
    pub fn contains_zoom(&self, z: u8) -> bool {
        (self.min_zoom..=self.max_zoom).contains(&z)
    }

    /// Bounds in degrees: [min_lon, min_lat, max_lon, max_lat].
    pub fn bounds(&self) -> [f64; 4] {
        let (a, b, c, d) = self.bounds_e7;
        [e7(a), e7(b), e7(c), e7(d)]
    }

    /// Center in degrees plus zoom: [lon, lat, zoom].
    pub fn center(&self) -> [f64; 3] {
        [
            e7(self.center_e7.0),
            e7(self.center_e7.1),
            self.center_zoom as f64,
        ]
    }
}

#[inline]
fn e7(value: i32) -> f64 {
    value as f64 / 10_000_000.0
}
