//! Configuration management for the tile streamer.
//!
//! This module provides a flexible configuration system that supports:
//! - Command-line arguments via clap
//! - Environment variables with `TILES_` prefix
//! - Sensible defaults for all optional settings
//!
//! # Storage Mode
//!
//! The archive backend is chosen once at startup. Setting a remote base URL
//! selects remote mode (HTTP range requests); otherwise archives are read from
//! the local archive directory.
//!
//! # Example
//!
//! ```ignore
//! use clap::Parser;
//! use tile_streamer::config::{Config, StorageMode};
//!
//! let config = Config::parse();
//! config.validate()?;
//!
//! match config.storage_mode() {
//!     StorageMode::Local(dir) => println!("Serving from {}", dir.display()),
//!     StorageMode::Remote(url) => println!("Serving from {}", url),
//! }
//! ```
//!
//! # Environment Variables
//!
//! - `TILES_HOST` - Server bind address (default: 0.0.0.0)
//! - `TILES_PORT` - Server port (default: 3000)
//! - `TILES_ARCHIVE_DIR` - Local archive directory (default: ./tiles)
//! - `TILES_REMOTE_BASE_URL` - Remote base URL (enables remote mode)
//! - `TILES_ARCHIVE_EXTENSION` - Archive file extension (default: pmtiles)
//! - `TILES_CACHE_MAX_BYTES` - Archive cache byte budget (default: 512 MiB)
//! - `TILES_CACHE_TTL_SECS` - Archive idle time-to-live (default: 1800)
//! - `TILES_REMOTE_SIZE_ESTIMATE` - Bytes charged per remote archive (default: 16 MiB)
//! - `TILES_CACHE_MAX_AGE` - HTTP cache max-age seconds (default: one year)
//! - `TILES_HTTP_TIMEOUT_SECS` - Remote request timeout (default: 30)

use std::path::PathBuf;
use std::time::Duration;

use clap::Parser;
use url::Url;

use crate::archive::{
    CacheConfig, DEFAULT_ARCHIVE_EXTENSION, DEFAULT_CACHE_MAX_BYTES, DEFAULT_CACHE_TTL,
    DEFAULT_REMOTE_SIZE_ESTIMATE,
};
use crate::io::DEFAULT_HTTP_TIMEOUT;
use crate::server::DEFAULT_CACHE_MAX_AGE;

// =============================================================================
// Default Values
// =============================================================================

/// Default server host.
pub const DEFAULT_HOST: &str = "0.0.0.0";

/// Default server port.
pub const DEFAULT_PORT: u16 = 3000;

/// Default local archive directory.
pub const DEFAULT_ARCHIVE_DIR: &str = "./tiles";

// =============================================================================
// CLI Arguments
// =============================================================================

/// Tile Streamer - serves map tiles out of single-file tile archives.
///
/// Archives are read from a local directory or fetched piecewise from a
/// remote base URL using HTTP range requests.
#[derive(Parser, Debug, Clone)]
#[command(name = "tile-streamer")]
#[command(author, version, about, long_about = None)]
pub struct Config {
    // =========================================================================
    // Server Configuration
    // =========================================================================
    /// Host address to bind the server to.
    #[arg(long, default_value = DEFAULT_HOST, env = "TILES_HOST")]
    pub host: String,

    /// Port to listen on.
    #[arg(short, long, default_value_t = DEFAULT_PORT, env = "TILES_PORT")]
    pub port: u16,

    // =========================================================================
    // Storage Configuration
    // =========================================================================
    /// Directory holding `{name}.{extension}` archives (local mode).
    #[arg(long, default_value = DEFAULT_ARCHIVE_DIR, env = "TILES_ARCHIVE_DIR")]
    pub archive_dir: PathBuf,

    /// Base URL serving `{name}.{extension}` archives (remote mode).
    ///
    /// When set, the archive directory is ignored.
    #[arg(long, env = "TILES_REMOTE_BASE_URL")]
    pub remote_base_url: Option<String>,

    /// Archive file extension, without the dot.
    #[arg(long, default_value = DEFAULT_ARCHIVE_EXTENSION, env = "TILES_ARCHIVE_EXTENSION")]
    pub archive_extension: String,

    /// Timeout in seconds for each remote range request.
    #[arg(long, default_value_t = DEFAULT_HTTP_TIMEOUT.as_secs(), env = "TILES_HTTP_TIMEOUT_SECS")]
    pub http_timeout_secs: u64,

    // =========================================================================
    // Cache Configuration
    // =========================================================================
    /// Byte budget across all cached archives.
    #[arg(long, default_value_t = DEFAULT_CACHE_MAX_BYTES, env = "TILES_CACHE_MAX_BYTES")]
    pub cache_max_bytes: u64,

    /// Seconds an archive may sit idle before it is dropped.
    #[arg(long, default_value_t = DEFAULT_CACHE_TTL.as_secs(), env = "TILES_CACHE_TTL_SECS")]
    pub cache_ttl_secs: u64,

    /// Bytes charged against the budget for each remote archive.
    #[arg(long, default_value_t = DEFAULT_REMOTE_SIZE_ESTIMATE, env = "TILES_REMOTE_SIZE_ESTIMATE")]
    pub remote_size_estimate: u64,

    /// HTTP Cache-Control max-age in seconds for tiles.
    #[arg(long, default_value_t = DEFAULT_CACHE_MAX_AGE, env = "TILES_CACHE_MAX_AGE")]
    pub cache_max_age: u32,

    // =========================================================================
    // Logging Configuration
    // =========================================================================
    /// Enable verbose logging (debug level).
    #[arg(short, long, default_value_t = false)]
    pub verbose: bool,

    /// Disable request tracing.
    #[arg(long, default_value_t = false)]
    pub no_tracing: bool,
}

/// Where archives are read from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StorageMode {
    /// Local directory, each archive read fully into memory
    Local(PathBuf),

    /// Remote base URL, archives read with HTTP range requests
    Remote(String),
}

impl Config {
    /// Validate the configuration and return an error message if invalid.
    pub fn validate(&self) -> Result<(), String> {
        if self.archive_extension.is_empty() {
            return Err("archive_extension must not be empty".to_string());
        }
        if self.archive_extension.contains(['/', '\\', '.']) {
            return Err("archive_extension must be a bare extension like \"pmtiles\"".to_string());
        }

        if self.cache_max_bytes == 0 {
            return Err("cache_max_bytes must be greater than 0".to_string());
        }
        if self.cache_ttl_secs == 0 {
            return Err("cache_ttl_secs must be greater than 0".to_string());
        }
        if self.remote_size_estimate == 0 {
            return Err("remote_size_estimate must be greater than 0".to_string());
        }
        if self.http_timeout_secs == 0 {
            return Err("http_timeout_secs must be greater than 0".to_string());
        }

        if let Some(base_url) = &self.remote_base_url {
            let url = Url::parse(base_url)
                .map_err(|e| format!("Invalid remote base URL '{}': {}", base_url, e))?;
            if !matches!(url.scheme(), "http" | "https") {
                return Err(format!(
                    "Remote base URL must use http or https, got '{}'",
                    url.scheme()
                ));
            }
        }

        Ok(())
    }

    /// Get the server bind address as "host:port".
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    /// The storage backend selected by this configuration.
    pub fn storage_mode(&self) -> StorageMode {
        match &self.remote_base_url {
            Some(url) => StorageMode::Remote(url.clone()),
            None => StorageMode::Local(self.archive_dir.clone()),
        }
    }

    /// Archive cache tuning derived from this configuration.
    pub fn cache_config(&self) -> CacheConfig {
        CacheConfig {
            max_bytes: self.cache_max_bytes,
            ttl: Duration::from_secs(self.cache_ttl_secs),
            remote_size_estimate: self.remote_size_estimate,
        }
    }

    /// Timeout for remote range requests.
    pub fn http_timeout(&self) -> Duration {
        Duration::from_secs(self.http_timeout_secs)
    }
}

// =============================================================================
// Tests
// =============================================================================
