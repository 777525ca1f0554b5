//! Tile request path parsing.
//!
//! Paths have the shape `{name}/{z}/{x}/{y}.{ext}`. The extension is ignored;
//! the content type of a tile comes from the archive header.

use std::fmt;

use crate::archive::{TileCoord, MAX_ZOOM};
use crate::error::TileError;

/// A parsed tile request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TileRequest {
    /// Archive name (no extension)
    pub name: String,

    /// Tile coordinate within the archive
    pub coord: TileCoord,
}

impl TileRequest {
    pub fn new(name: impl Into<String>, z: u8, x: u32, y: u32) -> Self {
        Self {
            name: name.into(),
            coord: TileCoord::new(z, x, y),
        }
    }

    /// Parse a request path.
    ///
    /// A leading `/` is allowed. Anything other than exactly four segments
    /// with a non-empty name is [`TileError::InvalidPath`]. Segments that are
    /// not decimal integers, or that fall outside the zoom range or the 2^z
    /// grid, are [`TileError::InvalidCoordinates`].
    pub fn parse(path: &str) -> Result<Self, TileError> {
        let path = path.strip_prefix('/').unwrap_or(path);
        let segments: Vec<&str> = path.split('/').collect();

        let [name, z, x, y] = segments.as_slice() else {
            return Err(TileError::InvalidPath);
        };
        if name.is_empty() {
            return Err(TileError::InvalidPath);
        }

        let y = match y.split_once('.') {
            Some((stem, _ext)) => stem,
            None => y,
        };

        let z = parse_component(z)?;
        let x = parse_component(x)?;
        let y = parse_component(y)?;

        if z > MAX_ZOOM as u32 {
            return Err(TileError::InvalidCoordinates);
        }

        let coord = TileCoord::new(z as u8, x, y);
        if !coord.is_valid() {
            return Err(TileError::InvalidCoordinates);
        }

        Ok(Self {
            name: name.to_string(),
            coord,
        })
    }
}

impl fmt::Display for TileRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.name, self.coord)
    }
}

/// Decimal digits only; `u32::from_str` would also accept a leading `+`.
fn parse_component(s: &str) -> Result<u32, TileError> {
    if s.is_empty() || !s.bytes().all(|b| b.is_ascii_digit()) {
        return Err(TileError::InvalidCoordinates);
    }
    s.parse().map_err(|_| TileError::InvalidCoordinates)
}
