//! HTTP server layer for the tile streamer.
//!
//! This module provides the HTTP API for serving tiles from cached archives.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────┐
//! │                         HTTP Layer                              │
//! │           GET /tiles/{name}/{z}/{x}/{y}.{ext}                   │
//! │                                                                 │
//! │  ┌──────────────────────────┐  ┌─────────────────────────────┐  │
//! │  │        handlers          │  │           routes            │  │
//! │  │ (tiles, archives, stats) │  │  (router config, CORS)      │  │
//! │  └──────────────────────────┘  └─────────────────────────────┘  │
//! └─────────────────────────────────────────────────────────────────┘
//! ```

pub mod handlers;
pub mod routes;

pub use handlers::{
    archive_handler, cache_stats_handler, fallback_handler, health_handler, preflight_handler,
    tile_handler, AppState, ErrorResponse, HealthResponse, DEFAULT_CACHE_MAX_AGE,
};
pub use routes::{create_router, RouterConfig, CORS_ALLOW_METHODS};
