//! Open archive handles.
//!
//! An [`ArchiveHandle`] pairs a [`RangeReader`] with the parsed header and
//! root directory of one archive. Both are read once on open and are
//! immutable afterwards, so a handle can be shared across requests behind an
//! `Arc` without further synchronization. Leaf directories are fetched on
//! demand and kept in a small LRU.

use std::num::NonZeroUsize;
use std::sync::Arc;

use bytes::Bytes;
use lru::LruCache;
use tokio::sync::Mutex;
use tracing::{debug, trace};

use super::directory::Directory;
use super::header::{ArchiveHeader, HEADER_SIZE};
use super::tile_id::TileCoord;
use crate::compression::decompress;
use crate::error::ArchiveError;
use crate::io::RangeReader;

/// Root directory plus up to three levels of leaves.
pub const MAX_DIRECTORY_DEPTH: usize = 4;

/// Default number of decoded leaf directories kept per archive.
pub const DEFAULT_LEAF_CACHE_CAPACITY: usize = 64;

/// An opened archive that can answer tile lookups.
pub struct ArchiveHandle<R> {
    reader: R,
    header: ArchiveHeader,
    root: Directory,
    leaves: Mutex<LruCache<(u64, u64), Arc<Directory>>>,
}

impl<R: RangeReader> ArchiveHandle<R> {
    /// Open an archive: read and validate the header, then the root directory.
    pub async fn open(reader: R) -> Result<Self, ArchiveError> {
        Self::open_with_leaf_capacity(reader, DEFAULT_LEAF_CACHE_CAPACITY).await
    }

    /// Open an archive with a custom leaf directory cache size.
    pub async fn open_with_leaf_capacity(
        reader: R,
        leaf_capacity: usize,
    ) -> Result<Self, ArchiveError> {
        let header_bytes = reader.read_exact_at(0, HEADER_SIZE).await?;
        let header = ArchiveHeader::parse(&header_bytes)?;

        let root = read_directory(
            &reader,
            &header,
            header.root_dir_offset,
            header.root_dir_length,
        )
        .await?;

        debug!(
            archive = reader.identifier(),
            min_zoom = header.min_zoom,
            max_zoom = header.max_zoom,
            tile_compression = header.tile_compression.name(),
            root_entries = root.len(),
            "Opened archive"
        );

        let capacity = NonZeroUsize::new(leaf_capacity).unwrap_or(NonZeroUsize::MIN);

        Ok(Self {
            reader,
            header,
            root,
            leaves: Mutex::new(LruCache::new(capacity)),
        })
    }

    /// The parsed archive header.
    pub fn header(&self) -> &ArchiveHeader {
        &self.header
    }

    /// The underlying byte source.
    pub fn reader(&self) -> &R {
        &self.reader
    }

    /// Look up the raw (still compressed) bytes for a tile.
    ///
    /// Returns `Ok(None)` for sparse data: a zoom outside the archive's range,
    /// no directory entry, or a zero-length entry. Coordinates outside the
    /// 2^z grid are an error.
    pub async fn lookup_tile(&self, coord: TileCoord) -> Result<Option<Bytes>, ArchiveError> {
        let tile_id = coord.tile_id()?;

        if !self.header.contains_zoom(coord.z) {
            trace!(tile = %coord, "Zoom outside archive range");
            return Ok(None);
        }

        let mut entry = match self.root.find(tile_id) {
            Some(entry) => *entry,
            None => return Ok(None),
        };

        for _ in 1..MAX_DIRECTORY_DEPTH {
            if !entry.is_leaf() {
                break;
            }
            let offset = section_offset(self.header.leaf_dirs_offset, entry.offset)?;
            let leaf = self.leaf_directory(offset, entry.length as u64).await?;
            entry = match leaf.find(tile_id) {
                Some(entry) => *entry,
                None => return Ok(None),
            };
        }

        if entry.is_leaf() {
            return Err(ArchiveError::DirectoryTooDeep(MAX_DIRECTORY_DEPTH));
        }

        if entry.length == 0 {
            return Ok(None);
        }

        let offset = section_offset(self.header.tile_data_offset, entry.offset)?;
        let data = self
            .reader
            .read_exact_at(offset, entry.length as usize)
            .await?;

        Ok(Some(data))
    }

    /// Read and decompress the archive's JSON metadata.
    ///
    /// An archive without a metadata block yields an empty JSON object.
    pub async fn metadata(&self) -> Result<serde_json::Value, ArchiveError> {
        if self.header.metadata_length == 0 {
            return Ok(serde_json::Value::Object(Default::default()));
        }

        let raw = self
            .reader
            .read_exact_at(
                self.header.metadata_offset,
                self.header.metadata_length as usize,
            )
            .await?;
        let bytes = decompress(self.header.internal_compression, raw)?;

        serde_json::from_slice(&bytes)
            .map_err(|e| ArchiveError::InvalidDirectory(format!("invalid metadata JSON: {}", e)))
    }

    /// Number of leaf directories currently cached.
    pub async fn cached_leaf_count(&self) -> usize {
        self.leaves.lock().await.len()
    }

    async fn leaf_directory(&self, offset: u64, length: u64) -> Result<Arc<Directory>, ArchiveError> {
        let key = (offset, length);
        {
            let mut leaves = self.leaves.lock().await;
            if let Some(dir) = leaves.get(&key) {
                return Ok(Arc::clone(dir));
            }
        }

        // Not held across the read: two concurrent misses may both fetch the
        // same leaf, which is harmless since directories are immutable.
        let dir = Arc::new(read_directory(&self.reader, &self.header, offset, length).await?);

        self.leaves.lock().await.put(key, Arc::clone(&dir));
        Ok(dir)
    }
}

/// Absolute position of an entry inside a header-declared section.
fn section_offset(section_start: u64, relative: u64) -> Result<u64, ArchiveError> {
    section_start.checked_add(relative).ok_or_else(|| {
        ArchiveError::InvalidDirectory(format!(
            "entry offset {} overflows section starting at {}",
            relative, section_start
        ))
    })
}

async fn read_directory<R: RangeReader>(
    reader: &R,
    header: &ArchiveHeader,
    offset: u64,
    length: u64,
) -> Result<Directory, ArchiveError> {
    if length == 0 {
        return Ok(Directory::default());
    }
    let raw = reader.read_exact_at(offset, length as usize).await?;
    let bytes = decompress(header.internal_compression, raw)?;
    Directory::parse(&bytes)
}
