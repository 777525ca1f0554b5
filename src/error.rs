use thiserror::Error;

/// I/O errors that can occur when reading archive bytes
#[derive(Debug, Clone, Error)]
pub enum IoError {
    /// Archive does not exist at the local path or remote URL
    #[error("Archive not found: {0}")]
    NotFound(String),

    /// Requested range exceeds the archive bounds (the archive is corrupt or truncated)
    #[error("Range out of bounds: requested {requested} bytes at offset {offset}, size is {size}")]
    RangeOutOfBounds {
        offset: u64,
        requested: u64,
        size: u64,
    },

    /// Network error, timeout, or non-success HTTP status
    #[error("Network error: {0}")]
    Network(String),

    /// Local filesystem error other than a missing file
    #[error("Local I/O error: {0}")]
    Local(String),
}

impl IoError {
    /// Whether this error means the archive itself does not exist.
    pub fn is_not_found(&self) -> bool {
        matches!(self, IoError::NotFound(_))
    }
}

/// Errors raised while opening or reading a PMTiles archive
#[derive(Debug, Clone, Error)]
pub enum ArchiveError {
    /// I/O error while reading the archive
    #[error("I/O error: {0}")]
    Io(#[from] IoError),

    /// Header does not start with the `PMTiles` magic
    #[error("Invalid archive magic bytes")]
    InvalidMagic,

    /// Only version 3 archives are supported
    #[error("Unsupported archive version: {0} (only version 3 is supported)")]
    UnsupportedVersion(u8),

    /// Not enough bytes for a full header
    #[error("Header too small: need {required} bytes, got {actual}")]
    HeaderTooSmall { required: usize, actual: usize },

    /// Header declares min zoom above max zoom
    #[error("Invalid zoom range: min zoom {min_zoom} exceeds max zoom {max_zoom}")]
    InvalidZoomRange { min_zoom: u8, max_zoom: u8 },

    /// Directory bytes could not be decoded
    #[error("Invalid directory: {0}")]
    InvalidDirectory(String),

    /// Directory or metadata payload could not be decompressed
    #[error("Decompression failed ({compression}): {message}")]
    Decompression {
        compression: &'static str,
        message: String,
    },

    /// Leaf directories nest deeper than the format allows
    #[error("Directory nesting exceeds {0} levels")]
    DirectoryTooDeep(usize),

    /// Coordinate lies outside the 2^z grid
    #[error("Tile ({x}, {y}) is outside the grid at zoom {z}")]
    TileOutOfBounds { z: u8, x: u32, y: u32 },
}

impl ArchiveError {
    /// Whether the underlying cause is a missing archive.
    pub fn is_not_found(&self) -> bool {
        matches!(self, ArchiveError::Io(io_err) if io_err.is_not_found())
    }
}

/// Errors surfaced by the tile request path
#[derive(Debug, Clone, Error)]
pub enum TileError {
    /// Request path does not have the `name/z/x/y` shape
    #[error("Invalid path")]
    InvalidPath,

    /// z, x or y is not a valid tile coordinate
    #[error("Invalid tile coordinates")]
    InvalidCoordinates,

    /// Archive is missing or could not be opened
    #[error("{name} not found")]
    ArchiveNotFound {
        name: String,
        #[source]
        source: ArchiveError,
    },
}
