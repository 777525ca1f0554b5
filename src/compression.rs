//! Decompression dispatch for tile payloads and archive internals.
//!
//! Two entry points share one dispatch table:
//!
//! - [`decompress`] is strict and returns an error on corrupt or unsupported
//!   input. Directories and metadata go through it, since a half-decoded
//!   directory would silently send lookups to the wrong offsets.
//! - [`decode_tile`] is lenient: on any failure it logs a warning and hands
//!   back the original bytes, so a client renderer shows one blank tile
//!   instead of failing the whole view.

use std::io::Read;

use bytes::Bytes;
use flate2::read::GzDecoder;
use tracing::{debug, warn};

use crate::archive::Compression;
use crate::error::ArchiveError;

/// Brotli decoder buffer size.
const BROTLI_BUFFER_SIZE: usize = 4096;

/// Largest decoded payload accepted from a single tile, directory or
/// metadata block.
pub const MAX_DECODED_SIZE: u64 = 64 * 1024 * 1024;

/// Decode strategy selected for a compression scheme.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DecodeStrategy {
    Passthrough,
    Gzip,
    Brotli,
    /// Recognized but not decodable by this server
    Unsupported,
}

impl DecodeStrategy {
    /// Total mapping from compression scheme to strategy.
    pub fn for_compression(compression: Compression) -> Self {
        match compression {
            Compression::None | Compression::Unknown => DecodeStrategy::Passthrough,
            Compression::Gzip => DecodeStrategy::Gzip,
            Compression::Brotli => DecodeStrategy::Brotli,
            Compression::Zstd => DecodeStrategy::Unsupported,
        }
    }
}

/// Decompress `data`, failing on corrupt streams or unsupported schemes.
///
/// Output larger than [`MAX_DECODED_SIZE`] is treated as corrupt.
pub fn decompress(compression: Compression, data: Bytes) -> Result<Bytes, ArchiveError> {
    decompress_with_limit(compression, data, MAX_DECODED_SIZE)
}

fn decompress_with_limit(
    compression: Compression,
    data: Bytes,
    limit: u64,
) -> Result<Bytes, ArchiveError> {
    let failed = |message: String| ArchiveError::Decompression {
        compression: compression.name(),
        message,
    };

    let read_bounded = |decoder: &mut dyn Read| -> Result<Bytes, ArchiveError> {
        let capacity = data.len().saturating_mul(4).min(limit as usize);
        let mut out = Vec::with_capacity(capacity);
        // One byte past the limit tells an exact fit from an overflow
        decoder
            .take(limit + 1)
            .read_to_end(&mut out)
            .map_err(|e| failed(e.to_string()))?;
        if out.len() as u64 > limit {
            return Err(failed(format!("decoded size exceeds {} bytes", limit)));
        }
        Ok(Bytes::from(out))
    };

    match DecodeStrategy::for_compression(compression) {
        DecodeStrategy::Passthrough => Ok(data.clone()),
        DecodeStrategy::Gzip => read_bounded(&mut GzDecoder::new(&data[..])),
        DecodeStrategy::Brotli => {
            read_bounded(&mut brotli::Decompressor::new(&data[..], BROTLI_BUFFER_SIZE))
        }
        DecodeStrategy::Unsupported => Err(failed("compression scheme not supported".to_string())),
    }
}

/// Decompress a tile payload, falling back to the raw bytes on any failure.
///
/// Schemes this server cannot decode are passed through without a warning,
/// so a whole archive of them does not drown out real decode failures.
pub fn decode_tile(compression: Compression, data: Bytes) -> Bytes {
    if DecodeStrategy::for_compression(compression) == DecodeStrategy::Unsupported {
        debug!(
            compression = compression.name(),
            len = data.len(),
            "Serving tile with undecodable compression as-is"
        );
        return data;
    }

    match decompress(compression, data.clone()) {
        Ok(decoded) => decoded,
        Err(e) => {
            warn!(
                compression = compression.name(),
                len = data.len(),
                error = %e,
                "Tile decode failed, serving raw bytes"
            );
            data
        }
    }
}
