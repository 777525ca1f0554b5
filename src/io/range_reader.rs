use async_trait::async_trait;
use bytes::Bytes;

use crate::error::IoError;

/// Trait for reading byte ranges from an archive's backing bytes.
///
/// This abstraction lets the archive parser work identically against a
/// fully materialized local file and a remote object fetched with HTTP
/// range requests. Implementations must be thread-safe.
#[async_trait]
pub trait RangeReader: Send + Sync {
    /// Read exactly `len` bytes starting at `offset`.
    ///
    /// Returns an error if the range is out of bounds or if the read fails.
    /// A short read is never returned as success.
    async fn read_exact_at(&self, offset: u64, len: usize) -> Result<Bytes, IoError>;

    /// Total size of the resource in bytes, if known without an extra round trip.
    fn size_hint(&self) -> Option<u64>;

    /// Get a stable identifier for this resource (for logging and cache keys).
    ///
    /// For local archives this is the file path, for remote ones the URL.
    fn identifier(&self) -> &str;
}

// =============================================================================
// Little-Endian Helpers
// =============================================================================
//
// PMTiles headers are always little-endian.

/// Read a little-endian u64 from a byte slice.
///
/// # Panics
/// Panics if the slice has fewer than 8 bytes.
#[inline]
pub fn read_u64_le(bytes: &[u8]) -> u64 {
    u64::from_le_bytes([
        bytes[0], bytes[1], bytes[2], bytes[3], bytes[4], bytes[5], bytes[6], bytes[7],
    ])
}

/// Read a little-endian i32 from a byte slice.
///
/// # Panics
/// Panics if the slice has fewer than 4 bytes.
#[inline]
pub fn read_i32_le(bytes: &[u8]) -> i32 {
    i32::from_le_bytes([bytes[0], bytes[1], bytes[2], bytes[3]])
}
