//! Router configuration for the tile server.
//!
//! This module defines the HTTP routes and applies the CORS and tracing
//! layers.
//!
//! # Route Structure
//!
//! ```text
//! /health                          - Health check
//! /cache                           - Archive cache statistics
//! /archives/{name}                 - Archive summary
//! /tiles/{name}/{z}/{x}/{y}.{ext}  - Tile endpoint
//! ```
//!
//! Every response, including errors and preflights, carries permissive CORS
//! headers. Preflights (`OPTIONS` on any path) answer 204 with no body.
//!
//! # Example
//!
//! ```ignore
//! use tile_streamer::archive::{ArchiveCache, LocalArchiveSource};
//! use tile_streamer::server::{create_router, RouterConfig};
//! use tile_streamer::tile::TileService;
//!
//! let cache = ArchiveCache::with_defaults(LocalArchiveSource::new("./tiles"));
//! let router = create_router(TileService::new(cache), RouterConfig::new());
//!
//! let listener = tokio::net::TcpListener::bind("0.0.0.0:3000").await?;
//! axum::serve(listener, router).await?;
//! ```

use axum::{routing::get, Router};
use http::header::{
    ACCESS_CONTROL_ALLOW_HEADERS, ACCESS_CONTROL_ALLOW_METHODS, ACCESS_CONTROL_ALLOW_ORIGIN,
};
use http::HeaderValue;
use tower_http::set_header::SetResponseHeaderLayer;
use tower_http::trace::TraceLayer;

use super::handlers::{
    archive_handler, cache_stats_handler, fallback_handler, health_handler, preflight_handler,
    tile_handler, AppState, DEFAULT_CACHE_MAX_AGE,
};
use crate::archive::ArchiveSource;
use crate::tile::TileService;

/// Methods advertised in `Access-Control-Allow-Methods`.
pub const CORS_ALLOW_METHODS: &str = "GET, HEAD, OPTIONS";

// =============================================================================
// Router Configuration
// =============================================================================

/// Configuration for the HTTP router.
#[derive(Debug, Clone)]
pub struct RouterConfig {
    /// Cache-Control max-age in seconds for tile responses
    pub cache_max_age: u32,

    /// Whether to enable request tracing
    pub enable_tracing: bool,
}

impl RouterConfig {
    /// Create a new router configuration.
    ///
    /// By default:
    /// - Cache max-age is one year (tiles are immutable once published)
    /// - Tracing is enabled
    pub fn new() -> Self {
        Self {
            cache_max_age: DEFAULT_CACHE_MAX_AGE,
            enable_tracing: true,
        }
    }

    /// Set the Cache-Control max-age in seconds.
    pub fn with_cache_max_age(mut self, seconds: u32) -> Self {
        self.cache_max_age = seconds;
        self
    }

    /// Enable or disable request tracing.
    pub fn with_tracing(mut self, enabled: bool) -> Self {
        self.enable_tracing = enabled;
        self
    }
}

impl Default for RouterConfig {
    fn default() -> Self {
        Self::new()
    }
}

// =============================================================================
// Router Builder
// =============================================================================

/// Create the main application router.
///
/// # Arguments
///
/// * `tile_service` - The tile service for handling tile requests
/// * `config` - Router configuration
pub fn create_router<S>(tile_service: TileService<S>, config: RouterConfig) -> Router
where
    S: ArchiveSource + 'static,
{
    let app_state = AppState::with_cache_max_age(tile_service, config.cache_max_age);

    let router = Router::new()
        .route("/health", get(health_handler).options(preflight_handler))
        .route(
            "/cache",
            get(cache_stats_handler::<S>).options(preflight_handler),
        )
        .route(
            "/archives/{name}",
            get(archive_handler::<S>).options(preflight_handler),
        )
        .route(
            "/tiles/{*path}",
            get(tile_handler::<S>).options(preflight_handler),
        )
        .fallback(fallback_handler)
        .with_state(app_state);

    let router = with_cors_headers(router);

    if config.enable_tracing {
        router.layer(TraceLayer::new_for_http())
    } else {
        router
    }
}

/// Stamp permissive CORS headers on every response.
fn with_cors_headers(router: Router) -> Router {
    router
        .layer(SetResponseHeaderLayer::overriding(
            ACCESS_CONTROL_ALLOW_ORIGIN,
            HeaderValue::from_static("*"),
        ))
        .layer(SetResponseHeaderLayer::overriding(
            ACCESS_CONTROL_ALLOW_METHODS,
            HeaderValue::from_static(CORS_ALLOW_METHODS),
        ))
        .layer(SetResponseHeaderLayer::overriding(
            ACCESS_CONTROL_ALLOW_HEADERS,
            HeaderValue::from_static("*"),
        ))
}

// =============================================================================
// Tests
// =============================================================================
