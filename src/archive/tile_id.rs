//! Tile coordinates and their mapping to PMTiles tile ids.
//!
//! Tile ids enumerate every tile of every zoom level in order: all tiles of
//! zoom 0, then zoom 1, and so on. Within a zoom level tiles are ordered along
//! a Hilbert curve, which keeps spatially close tiles close in the archive.

use crate::error::ArchiveError;

/// Highest zoom level whose tile ids fit in a u64.
pub const MAX_ZOOM: u8 = 31;

/// A slippy-map tile coordinate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TileCoord {
    pub z: u8,
    pub x: u32,
    pub y: u32,
}

impl TileCoord {
    /// Create a coordinate without validation.
    pub fn new(z: u8, x: u32, y: u32) -> Self {
        Self { z, x, y }
    }

    /// Whether x and y lie inside the 2^z grid.
    pub fn is_valid(&self) -> bool {
        if self.z > MAX_ZOOM {
            return false;
        }
        let n = 1u64 << self.z;
        (self.x as u64) < n && (self.y as u64) < n
    }

    /// Compute the tile id for this coordinate.
    pub fn tile_id(&self) -> Result<u64, ArchiveError> {
        if !self.is_valid() {
            return Err(ArchiveError::TileOutOfBounds {
                z: self.z,
                x: self.x,
                y: self.y,
            });
        }

        let n = 1u64 << self.z;
        let mut x = self.x as u64;
        let mut y = self.y as u64;
        let mut d = 0u64;
        let mut s = n / 2;

        while s > 0 {
            let rx = u64::from(x & s > 0);
            let ry = u64::from(y & s > 0);
            d += s * s * ((3 * rx) ^ ry);

            // Rotate the quadrant so the curve stays continuous
            if ry == 0 {
                if rx == 1 {
                    x = n - 1 - x;
                    y = n - 1 - y;
                }
                std::mem::swap(&mut x, &mut y);
            }
            s /= 2;
        }

        Ok(zoom_base(self.z) + d)
    }
}

impl std::fmt::Display for TileCoord {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}/{}/{}", self.z, self.x, self.y)
    }
}

/// Number of tiles in all zoom levels below `z`: (4^z - 1) / 3.
#[inline]
pub fn zoom_base(z: u8) -> u64 {
    ((1u64 << (2 * z as u32)) - 1) / 3
}
