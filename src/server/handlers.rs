//! HTTP request handlers for the tile API.
//!
//! This module contains the Axum handlers for serving tiles, archive
//! summaries, cache statistics and health checks.
//!
//! # Endpoints
//!
//! - `GET /tiles/{name}/{z}/{x}/{y}.{ext}` - Serve a tile
//! - `GET /archives/{name}` - Archive summary
//! - `GET /cache` - Archive cache statistics
//! - `GET /health` - Health check endpoint
//! - `OPTIONS *` - CORS preflight

use std::sync::Arc;

use axum::{
    body::Body,
    extract::{rejection::PathRejection, Path, State},
    http::{header, HeaderValue, Method, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use tracing::debug;

use crate::archive::{ArchiveSource, CacheStats};
use crate::error::TileError;
use crate::tile::{ArchiveSummary, TileRequest, TileResponse, TileService};

/// Default Cache-Control max-age for tiles: one year.
pub const DEFAULT_CACHE_MAX_AGE: u32 = 365 * 24 * 60 * 60;

// =============================================================================
// Application State
// =============================================================================

/// Shared application state containing the tile service.
///
/// This is passed to all handlers via Axum's State extractor.
pub struct AppState<S: ArchiveSource> {
    /// The tile service for processing tile requests
    pub tile_service: Arc<TileService<S>>,

    /// Cache-Control max-age in seconds for tile responses
    pub cache_max_age: u32,
}

impl<S: ArchiveSource + 'static> AppState<S> {
    /// Create a new application state with the default max-age.
    pub fn new(tile_service: TileService<S>) -> Self {
        Self::with_cache_max_age(tile_service, DEFAULT_CACHE_MAX_AGE)
    }

    /// Create a new application state with custom cache max-age.
    pub fn with_cache_max_age(tile_service: TileService<S>, cache_max_age: u32) -> Self {
        Self {
            tile_service: Arc::new(tile_service),
            cache_max_age,
        }
    }
}

impl<S: ArchiveSource> Clone for AppState<S> {
    fn clone(&self) -> Self {
        Self {
            tile_service: Arc::clone(&self.tile_service),
            cache_max_age: self.cache_max_age,
        }
    }
}

// =============================================================================
// Response Types
// =============================================================================

/// JSON error body: `{"error": "<message>"}`.
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
}

impl ErrorResponse {
    pub fn new(error: impl Into<String>) -> Self {
        Self {
            error: error.into(),
        }
    }
}

/// Health check response.
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    /// Service status
    pub status: String,

    /// Service version
    pub version: String,
}

// =============================================================================
// Error Mapping
// =============================================================================

/// Convert TileError to HTTP response.
///
/// Missing archives are already logged loudly where the open failed, so only
/// a debug line is emitted here.
impl IntoResponse for TileError {
    fn into_response(self) -> Response {
        let status = match &self {
            TileError::InvalidPath | TileError::InvalidCoordinates => StatusCode::BAD_REQUEST,
            TileError::ArchiveNotFound { .. } => StatusCode::NOT_FOUND,
        };

        let message = self.to_string();
        debug!(status = status.as_u16(), "Client error: {}", message);

        (status, Json(ErrorResponse::new(message))).into_response()
    }
}

// =============================================================================
// Handlers
// =============================================================================

/// Handle tile requests.
///
/// # Endpoint
///
/// `GET /tiles/{name}/{z}/{x}/{y}.{ext}`
///
/// The whole remainder after `/tiles/` is captured and parsed here so that
/// every malformed shape gets the same 400 body.
///
/// # Response
///
/// - `200 OK`: Decoded tile bytes with the archive's tile content type
/// - `204 No Content`: No data at this coordinate
/// - `400 Bad Request`: Malformed path or coordinates
/// - `404 Not Found`: Archive missing or unreadable
///
/// # Headers
///
/// - `Content-Type`: from the archive's tile type
/// - `Cache-Control: public, max-age={cache_max_age}, immutable`
pub async fn tile_handler<S: ArchiveSource + 'static>(
    State(state): State<AppState<S>>,
    path: Result<Path<String>, PathRejection>,
) -> Result<Response, TileError> {
    // Percent-decoding to invalid UTF-8 is a malformed path like any other
    let Path(path) = path.map_err(|rejection| {
        debug!(error = %rejection, "Tile path rejected by extractor");
        TileError::InvalidPath
    })?;
    let request = TileRequest::parse(&path)?;

    let response = match state.tile_service.get_tile(&request).await? {
        TileResponse::Tile { data, content_type } => {
            let cache_control = format!("public, max-age={}, immutable", state.cache_max_age);
            (
                StatusCode::OK,
                [
                    (header::CONTENT_TYPE, HeaderValue::from_static(content_type)),
                    (
                        header::CACHE_CONTROL,
                        HeaderValue::from_str(&cache_control)
                            .unwrap_or_else(|_| HeaderValue::from_static("public")),
                    ),
                ],
                Body::from(data),
            )
                .into_response()
        }
        TileResponse::Empty => StatusCode::NO_CONTENT.into_response(),
    };

    Ok(response)
}

/// Handle archive summary requests.
///
/// # Endpoint
///
/// `GET /archives/{name}`
///
/// # Response
///
/// `200 OK` with JSON body:
/// ```json
/// {
///   "name": "parcels",
///   "tile_type": "mvt",
///   "tile_compression": "gzip",
///   "min_zoom": 0,
///   "max_zoom": 14,
///   "bounds": [-122.6, 37.2, -121.7, 37.9],
///   "center": [-122.1, 37.5, 10.0],
///   "metadata": { "name": "Parcels" }
/// }
/// ```
pub async fn archive_handler<S: ArchiveSource + 'static>(
    State(state): State<AppState<S>>,
    name: Result<Path<String>, PathRejection>,
) -> Result<Json<ArchiveSummary>, TileError> {
    let Path(name) = name.map_err(|_| TileError::InvalidPath)?;
    let summary = state.tile_service.archive_summary(&name).await?;
    Ok(Json(summary))
}

/// Handle cache statistics requests.
///
/// # Endpoint
///
/// `GET /cache`
pub async fn cache_stats_handler<S: ArchiveSource + 'static>(
    State(state): State<AppState<S>>,
) -> Json<CacheStats> {
    Json(state.tile_service.cache().stats().await)
}

/// Handle health check requests.
///
/// # Endpoint
///
/// `GET /health`
///
/// # Response
///
/// `200 OK` with JSON body:
/// ```json
/// {
///   "status": "healthy",
///   "version": "0.1.0"
/// }
/// ```
pub async fn health_handler() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}

/// Answer a CORS preflight with an empty success.
pub async fn preflight_handler() -> StatusCode {
    StatusCode::NO_CONTENT
}

/// Unknown paths: preflights still succeed, everything else is a JSON 404.
pub async fn fallback_handler(method: Method) -> Response {
    if method == Method::OPTIONS {
        return StatusCode::NO_CONTENT.into_response();
    }
    (StatusCode::NOT_FOUND, Json(ErrorResponse::new("Not found"))).into_response()
}
