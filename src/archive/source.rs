//! Archive storage backends.
//!
//! An [`ArchiveSource`] turns an archive name into a [`RangeReader`]. The
//! backend is chosen once at startup: either a directory of local files, each
//! read fully into memory, or a remote base URL read with HTTP range requests.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use reqwest::Client;

use crate::error::IoError;
use crate::io::{BufferRangeReader, HttpRangeReader, RangeReader};

/// Default archive file extension.
pub const DEFAULT_ARCHIVE_EXTENSION: &str = "pmtiles";

/// Trait for creating range readers from archive names.
///
/// This abstraction allows the cache to work with different storage backends
/// (local files, HTTP) without being tied to a specific implementation.
#[async_trait]
pub trait ArchiveSource: Send + Sync {
    /// The type of range reader this source creates.
    type Reader: RangeReader + 'static;

    /// Create a range reader for the given archive name (no extension).
    async fn create_reader(&self, name: &str) -> Result<Self::Reader, IoError>;
}

// =============================================================================
// Local Files
// =============================================================================

/// Archives stored as `{base_dir}/{name}.{extension}` on local disk.
#[derive(Debug, Clone)]
pub struct LocalArchiveSource {
    base_dir: PathBuf,
    extension: String,
}

impl LocalArchiveSource {
    /// Create a source rooted at `base_dir` using the default extension.
    pub fn new(base_dir: impl Into<PathBuf>) -> Self {
        Self::with_extension(base_dir, DEFAULT_ARCHIVE_EXTENSION)
    }

    /// Create a source with a custom file extension.
    pub fn with_extension(base_dir: impl Into<PathBuf>, extension: impl Into<String>) -> Self {
        Self {
            base_dir: base_dir.into(),
            extension: extension.into(),
        }
    }

    pub fn base_dir(&self) -> &Path {
        &self.base_dir
    }

    /// Path of the archive file for `name`.
    pub fn archive_path(&self, name: &str) -> PathBuf {
        self.base_dir.join(format!("{}.{}", name, self.extension))
    }
}

#[async_trait]
impl ArchiveSource for LocalArchiveSource {
    type Reader = BufferRangeReader;

    async fn create_reader(&self, name: &str) -> Result<Self::Reader, IoError> {
        // Names come from a single path segment; refuse anything that could
        // escape the base directory.
        if name.is_empty() || name.contains(['/', '\\']) || name == ".." {
            return Err(IoError::NotFound(name.to_string()));
        }
        BufferRangeReader::from_file(self.archive_path(name)).await
    }
}

// =============================================================================
// Remote (HTTP)
// =============================================================================

/// Archives served as `{base_url}/{name}.{extension}` by an HTTP server
/// supporting range requests.
#[derive(Clone)]
pub struct RemoteArchiveSource {
    client: Client,
    base_url: String,
    extension: String,
}

impl RemoteArchiveSource {
    /// Create a source for the given base URL using the default extension.
    pub fn new(client: Client, base_url: impl Into<String>) -> Self {
        Self::with_extension(client, base_url, DEFAULT_ARCHIVE_EXTENSION)
    }

    /// Create a source with a custom file extension.
    pub fn with_extension(
        client: Client,
        base_url: impl Into<String>,
        extension: impl Into<String>,
    ) -> Self {
        let base_url: String = base_url.into();
        Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            extension: extension.into(),
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// URL of the archive for `name`. The name is percent-encoded.
    pub fn archive_url(&self, name: &str) -> String {
        format!(
            "{}/{}.{}",
            self.base_url,
            urlencoding::encode(name),
            self.extension
        )
    }
}

#[async_trait]
impl ArchiveSource for RemoteArchiveSource {
    type Reader = HttpRangeReader;

    async fn create_reader(&self, name: &str) -> Result<Self::Reader, IoError> {
        // No request here: the header read is the first round trip.
        Ok(HttpRangeReader::new(self.client.clone(), self.archive_url(name)))
    }
}
