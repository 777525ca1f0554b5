use std::path::Path;

use async_trait::async_trait;
use bytes::Bytes;

use super::RangeReader;
use crate::error::IoError;

/// In-memory implementation of RangeReader.
///
/// Holds a local archive fully materialized as a single `Bytes` buffer, so
/// every read is a zero-copy slice. Out-of-range reads are hard errors:
/// silently truncating would corrupt header and directory parsing downstream.
#[derive(Debug, Clone)]
pub struct BufferRangeReader {
    data: Bytes,
    identifier: String,
}

impl BufferRangeReader {
    /// Wrap an existing buffer.
    pub fn new(data: impl Into<Bytes>, identifier: impl Into<String>) -> Self {
        Self {
            data: data.into(),
            identifier: identifier.into(),
        }
    }

    /// Read a whole file from disk into memory.
    ///
    /// A missing file maps to `IoError::NotFound`; anything else to `IoError::Local`.
    pub async fn from_file(path: impl AsRef<Path>) -> Result<Self, IoError> {
        let path = path.as_ref();
        let identifier = path.display().to_string();

        let data = tokio::fs::read(path).await.map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                IoError::NotFound(identifier.clone())
            } else {
                IoError::Local(format!("{}: {}", identifier, e))
            }
        })?;

        Ok(Self::new(data, identifier))
    }

    /// Length of the buffer in bytes.
    pub fn len(&self) -> u64 {
        self.data.len() as u64
    }

    /// Whether the buffer is empty.
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }
}

#[async_trait]
impl RangeReader for BufferRangeReader {
    async fn read_exact_at(&self, offset: u64, len: usize) -> Result<Bytes, IoError> {
        let size = self.len();
        let end = offset.checked_add(len as u64);

        match end {
            Some(end) if end <= size => Ok(self.data.slice(offset as usize..end as usize)),
            _ => Err(IoError::RangeOutOfBounds {
                offset,
                requested: len as u64,
                size,
            }),
        }
    }

    fn size_hint(&self) -> Option<u64> {
        Some(self.len())
    }

    fn identifier(&self) -> &str {
        &self.identifier
    }
}
