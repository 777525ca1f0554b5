//! Archive cache with size-budget and idle-time eviction.
//!
//! The cache provides:
//! - Reuse of opened archive handles across requests
//! - A byte budget over the estimated size of all cached archives
//! - Expiry of archives left idle longer than a time-to-live
//! - Singleflight opens so concurrent misses for one name share a single open
//!
//! # Eviction
//!
//! Eviction runs synchronously under the cache lock at the start of every
//! [`ArchiveCache::get`] and again right after a new archive is inserted:
//!
//! 1. Entries idle longer than the TTL are dropped unconditionally.
//! 2. While the remaining entries exceed the byte budget, the least recently
//!    accessed entry is dropped, but the last remaining entry is always kept
//!    so a single oversized archive under sustained use is not reopened on
//!    every request.
//!
//! The entry map is an unbounded [`LruCache`], so its recency order is the
//! order of last access and "oldest first" is simply `pop_lru`.
//!
//! # Example
//!
//! ```ignore
//! use tile_streamer::archive::{ArchiveCache, CacheConfig, LocalArchiveSource};
//!
//! let source = LocalArchiveSource::new("/data/tiles");
//! let cache = ArchiveCache::new(source, CacheConfig::default());
//!
//! // Opens and caches on first access
//! let archive = cache.get("parcels").await?;
//! let tile = archive.lookup_tile(TileCoord::new(14, 3421, 1567)).await?;
//! ```

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use lru::LruCache;
use serde::Serialize;
use tokio::sync::{Mutex, OnceCell};
use tokio::time::Instant;
use tracing::{debug, info};

use super::handle::ArchiveHandle;
use super::source::ArchiveSource;
use crate::error::ArchiveError;
use crate::io::RangeReader;

// =============================================================================
// Configuration
// =============================================================================

/// Default byte budget for all cached archives: 512 MiB.
pub const DEFAULT_CACHE_MAX_BYTES: u64 = 512 * 1024 * 1024;

/// Default idle time before an archive is dropped: 30 minutes.
pub const DEFAULT_CACHE_TTL: Duration = Duration::from_secs(30 * 60);

/// Size charged for archives whose length is unknown (remote sources): 16 MiB.
pub const DEFAULT_REMOTE_SIZE_ESTIMATE: u64 = 16 * 1024 * 1024;

/// Tuning for [`ArchiveCache`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CacheConfig {
    /// Maximum aggregate size estimate of cached archives in bytes
    pub max_bytes: u64,

    /// Maximum idle time before an entry is treated as absent
    pub ttl: Duration,

    /// Size estimate used when the reader cannot report a length
    pub remote_size_estimate: u64,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            max_bytes: DEFAULT_CACHE_MAX_BYTES,
            ttl: DEFAULT_CACHE_TTL,
            remote_size_estimate: DEFAULT_REMOTE_SIZE_ESTIMATE,
        }
    }
}

// =============================================================================
// Cache Entry
// =============================================================================

struct CacheEntry<R> {
    archive: Arc<ArchiveHandle<R>>,
    last_access: Instant,
    size_estimate: u64,
}

type OpenResult<R> = Result<Arc<ArchiveHandle<R>>, ArchiveError>;

/// Snapshot of cache counters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct CacheStats {
    pub entries: usize,
    pub total_bytes: u64,
    pub max_bytes: u64,
    pub ttl_secs: u64,
    pub hits: u64,
    pub misses: u64,
    pub opens: u64,
    pub evictions: u64,
}

#[derive(Default)]
struct Counters {
    hits: AtomicU64,
    misses: AtomicU64,
    opens: AtomicU64,
    evictions: AtomicU64,
}

// =============================================================================
// ArchiveCache
// =============================================================================

/// Shared map from archive name to an opened archive.
///
/// Constructed once at startup and shared by reference (usually behind an
/// `Arc`). All mutations of the entry map happen under one mutex, so a reader
/// observes the map either before or after an eviction pass, never halfway.
/// Failed opens are never cached.
pub struct ArchiveCache<S: ArchiveSource> {
    source: S,
    config: CacheConfig,
    entries: Mutex<LruCache<String, CacheEntry<S::Reader>>>,
    in_flight: Mutex<HashMap<String, Arc<OnceCell<OpenResult<S::Reader>>>>>,
    counters: Counters,
}

impl<S: ArchiveSource> ArchiveCache<S> {
    /// Create a cache over `source`.
    pub fn new(source: S, config: CacheConfig) -> Self {
        Self {
            source,
            config,
            entries: Mutex::new(LruCache::unbounded()),
            in_flight: Mutex::new(HashMap::new()),
            counters: Counters::default(),
        }
    }

    /// Create a cache with default budget and TTL.
    pub fn with_defaults(source: S) -> Self {
        Self::new(source, CacheConfig::default())
    }

    /// Get an archive, opening it if it is not cached.
    ///
    /// On a hit the entry's last access time is bumped. On a miss the archive
    /// is opened through the source, charged its size estimate, and inserted.
    pub async fn get(&self, name: &str) -> OpenResult<S::Reader> {
        {
            let mut entries = self.entries.lock().await;
            let now = Instant::now();
            self.evict(&mut entries, now);

            if let Some(entry) = entries.get_mut(name) {
                entry.last_access = now;
                self.counters.hits.fetch_add(1, Ordering::Relaxed);
                return Ok(Arc::clone(&entry.archive));
            }
        }

        self.counters.misses.fetch_add(1, Ordering::Relaxed);
        self.open_singleflight(name).await
    }

    /// Join an in-flight open for `name` or become its leader.
    async fn open_singleflight(&self, name: &str) -> OpenResult<S::Reader> {
        let cell = {
            let mut in_flight = self.in_flight.lock().await;
            Arc::clone(
                in_flight
                    .entry(name.to_string())
                    .or_insert_with(|| Arc::new(OnceCell::new())),
            )
        };

        let result = cell.get_or_init(|| self.open_and_insert(name)).await.clone();

        // Whoever finishes first clears the slot; a later miss starts fresh,
        // so failures are retried on the next request.
        {
            let mut in_flight = self.in_flight.lock().await;
            if in_flight
                .get(name)
                .is_some_and(|current| Arc::ptr_eq(current, &cell))
            {
                in_flight.remove(name);
            }
        }

        result
    }

    /// Open an archive and insert it into the cache.
    async fn open_and_insert(&self, name: &str) -> OpenResult<S::Reader> {
        // A previous leader may have inserted and cleared its slot between
        // our miss and our joining the in-flight map.
        {
            let mut entries = self.entries.lock().await;
            if let Some(entry) = entries.get_mut(name) {
                entry.last_access = Instant::now();
                return Ok(Arc::clone(&entry.archive));
            }
        }

        self.counters.opens.fetch_add(1, Ordering::Relaxed);

        let reader = self.source.create_reader(name).await?;
        let size_estimate = reader
            .size_hint()
            .unwrap_or(self.config.remote_size_estimate);
        let archive = Arc::new(ArchiveHandle::open(reader).await?);

        let mut entries = self.entries.lock().await;
        let now = Instant::now();
        entries.put(
            name.to_string(),
            CacheEntry {
                archive: Arc::clone(&archive),
                last_access: now,
                size_estimate,
            },
        );
        self.evict(&mut entries, now);

        info!(
            archive = name,
            size_estimate,
            entries = entries.len(),
            "Cached archive"
        );

        Ok(archive)
    }

    /// Drop expired entries, then the oldest entries until within budget.
    fn evict(&self, entries: &mut LruCache<String, CacheEntry<S::Reader>>, now: Instant) {
        let expired: Vec<String> = entries
            .iter()
            .filter(|(_, entry)| now.duration_since(entry.last_access) > self.config.ttl)
            .map(|(name, _)| name.clone())
            .collect();

        for name in expired {
            entries.pop(&name);
            self.counters.evictions.fetch_add(1, Ordering::Relaxed);
            debug!(archive = %name, reason = "expired", "Evicted archive");
        }

        let mut total: u64 = entries.iter().map(|(_, entry)| entry.size_estimate).sum();
        while total > self.config.max_bytes && entries.len() > 1 {
            match entries.pop_lru() {
                Some((name, entry)) => {
                    total -= entry.size_estimate;
                    self.counters.evictions.fetch_add(1, Ordering::Relaxed);
                    debug!(
                        archive = %name,
                        reason = "size",
                        size_estimate = entry.size_estimate,
                        "Evicted archive"
                    );
                }
                None => break,
            }
        }
    }

    /// Remove an archive from the cache, forcing a reopen on next access.
    pub async fn invalidate(&self, name: &str) {
        let mut entries = self.entries.lock().await;
        entries.pop(name);
    }

    /// Clear all cached archives.
    pub async fn clear(&self) {
        let mut entries = self.entries.lock().await;
        entries.clear();
    }

    /// Number of cached archives.
    pub async fn len(&self) -> usize {
        self.entries.lock().await.len()
    }

    /// Whether the cache is empty.
    pub async fn is_empty(&self) -> bool {
        self.entries.lock().await.is_empty()
    }

    /// Whether `name` is currently cached (without bumping its access time).
    pub async fn contains(&self, name: &str) -> bool {
        self.entries.lock().await.contains(name)
    }

    /// Aggregate size estimate of all cached archives.
    pub async fn total_size(&self) -> u64 {
        let entries = self.entries.lock().await;
        entries.iter().map(|(_, entry)| entry.size_estimate).sum()
    }

    /// Snapshot of the cache state and counters.
    pub async fn stats(&self) -> CacheStats {
        let entries = self.entries.lock().await;
        CacheStats {
            entries: entries.len(),
            total_bytes: entries.iter().map(|(_, entry)| entry.size_estimate).sum(),
            max_bytes: self.config.max_bytes,
            ttl_secs: self.config.ttl.as_secs(),
            hits: self.counters.hits.load(Ordering::Relaxed),
            misses: self.counters.misses.load(Ordering::Relaxed),
            opens: self.counters.opens.load(Ordering::Relaxed),
            evictions: self.counters.evictions.load(Ordering::Relaxed),
        }
    }

    /// The configured budget and TTL.
    pub fn config(&self) -> &CacheConfig {
        &self.config
    }

    /// The archive source.
    pub fn source(&self) -> &S {
        &self.source
    }
}

// =============================================================================
// Tests
// =============================================================================
