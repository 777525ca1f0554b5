//! PMTiles directory decoding and lookup.
//!
//! A directory is a sorted list of entries, stored column-wise as varints
//! after decompression:
//!
//! ```text
//! count | tile_id deltas | run_lengths | lengths | offsets
//! ```
//!
//! An offset of 0 for any entry after the first means "directly after the
//! previous entry"; otherwise the stored value is `offset + 1`.

use crate::error::ArchiveError;

/// A single directory entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Entry {
    pub tile_id: u64,
    /// Byte offset, relative to the tile data or leaf directory section
    pub offset: u64,
    pub length: u32,
    /// Number of consecutive tile ids sharing this payload; 0 marks a leaf directory
    pub run_length: u32,
}

impl Entry {
    /// Whether this entry points at a leaf directory instead of tile data.
    #[inline]
    pub fn is_leaf(&self) -> bool {
        self.run_length == 0
    }
}

/// A decoded directory, sorted by tile id.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Directory {
    entries: Vec<Entry>,
}

impl Directory {
    /// Build a directory from already-sorted entries.
    pub fn from_entries(entries: Vec<Entry>) -> Self {
        Self { entries }
    }

    /// Decode a directory from its uncompressed bytes.
    pub fn parse(bytes: &[u8]) -> Result<Self, ArchiveError> {
        let mut cursor = VarintCursor::new(bytes);

        let count = cursor.next()?;
        // Each entry takes at least four varint bytes; reject absurd counts
        // before allocating.
        if count > (bytes.len() as u64) / 4 + 1 {
            return Err(ArchiveError::InvalidDirectory(format!(
                "entry count {} exceeds directory size {}",
                count,
                bytes.len()
            )));
        }
        let count = count as usize;

        let mut entries = vec![
            Entry {
                tile_id: 0,
                offset: 0,
                length: 0,
                run_length: 0,
            };
            count
        ];

        let mut last_id = 0u64;
        for entry in entries.iter_mut() {
            let delta = cursor.next()?;
            last_id = last_id.checked_add(delta).ok_or_else(|| {
                ArchiveError::InvalidDirectory("tile id overflow".to_string())
            })?;
            entry.tile_id = last_id;
        }

        for entry in entries.iter_mut() {
            entry.run_length = to_u32(cursor.next()?, "run length")?;
        }

        for entry in entries.iter_mut() {
            entry.length = to_u32(cursor.next()?, "length")?;
        }

        for i in 0..count {
            let value = cursor.next()?;
            entries[i].offset = if value == 0 && i > 0 {
                entries[i - 1]
                    .offset
                    .saturating_add(entries[i - 1].length as u64)
            } else {
                value.checked_sub(1).ok_or_else(|| {
                    ArchiveError::InvalidDirectory("first entry has no offset".to_string())
                })?
            };
        }

        Ok(Self { entries })
    }

    /// Find the entry covering `tile_id`.
    ///
    /// Returns either a tile entry whose run contains the id, or the leaf
    /// directory entry that may contain it. `None` means the archive has no
    /// data for this id.
    pub fn find(&self, tile_id: u64) -> Option<&Entry> {
        let idx = self.entries.partition_point(|e| e.tile_id <= tile_id);
        if idx == 0 {
            return None;
        }

        let entry = &self.entries[idx - 1];
        if entry.tile_id == tile_id || entry.is_leaf() {
            return Some(entry);
        }

        if tile_id - entry.tile_id < entry.run_length as u64 {
            Some(entry)
        } else {
            None
        }
    }

    pub fn entries(&self) -> &[Entry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

fn to_u32(value: u64, field: &str) -> Result<u32, ArchiveError> {
    u32::try_from(value)
        .map_err(|_| ArchiveError::InvalidDirectory(format!("{} {} exceeds u32", field, value)))
}

// =============================================================================
// Varint Decoding
// =============================================================================

/// Cursor over LEB128-style unsigned varints.
struct VarintCursor<'a> {
    bytes: &'a [u8],
    pos: usize,
}

impl<'a> VarintCursor<'a> {
    fn new(bytes: &'a [u8]) -> Self {
        Self { bytes, pos: 0 }
    }

    fn next(&mut self) -> Result<u64, ArchiveError> {
        let mut value = 0u64;
        let mut shift = 0u32;

        loop {
            let byte = *self.bytes.get(self.pos).ok_or_else(|| {
                ArchiveError::InvalidDirectory("unexpected end of directory".to_string())
            })?;
            self.pos += 1;

            if shift >= 64 || (shift == 63 && byte > 1) {
                return Err(ArchiveError::InvalidDirectory(
                    "varint exceeds 64 bits".to_string(),
                ));
            }

            value |= ((byte & 0x7F) as u64) << shift;
            if byte & 0x80 == 0 {
                return Ok(value);
            }
            shift += 7;
        }
    }
}

/// Append `value` as a varint. Used to build directories in tests.
#[cfg(test)]
pub(crate) fn write_varint(buf: &mut Vec<u8>, mut value: u64) {
    while value >= 0x80 {
        buf.push((value as u8) | 0x80);
        value >>= 7;
    }
    buf.push(value as u8);
}

/// Serialize entries in directory layout. Used to build archives in tests.
#[cfg(test)]
pub(crate) fn encode_directory(entries: &[Entry]) -> Vec<u8> {
    let mut buf = Vec::new();
    write_varint(&mut buf, entries.len() as u64);

    let mut last_id = 0;
    for e in entries {
        write_varint(&mut buf, e.tile_id - last_id);
        last_id = e.tile_id;
    }
    for e in entries {
        write_varint(&mut buf, e.run_length as u64);
    }
    for e in entries {
        write_varint(&mut buf, e.length as u64);
    }
    for (i, e) in entries.iter().enumerate() {
        if i > 0 && e.offset == entries[i - 1].offset + entries[i - 1].length as u64 {
            write_varint(&mut buf, 0);
        } else {
            write_varint(&mut buf, e.offset + 1);
        }
    }
    buf
}
