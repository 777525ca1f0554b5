//! Tile service layer.
//!
//! This module turns request paths into tiles served from cached archives.
//!
//! # Architecture
//!
//! The tile service sits between the HTTP layer and the archive cache:
//!
//! ```text
//! ┌─────────────────────────────────────────┐
//! │              HTTP Handlers              │
//! └────────────────────┬────────────────────┘
//!                      │  TileRequest::parse
//!                      ▼
//! ┌─────────────────────────────────────────┐
//! │              Tile Service               │
//! │   (resolve, lookup, lenient decode)     │
//! └────────────────────┬────────────────────┘
//!                      │
//!                      ▼
//! ┌─────────────────────────────────────────┐
//! │             ArchiveCache                │
//! └─────────────────────────────────────────┘
//! ```
//!
//! # Components
//!
//! - [`TileRequest`]: Parsed `name/z/x/y.ext` request path
//! - [`TileService`]: Resolves archives and produces tiles
//! - [`TileResponse`]: A decoded tile or an explicit empty result
//! - [`ArchiveSummary`]: Header and metadata overview of one archive

mod request;
mod service;

pub use request::TileRequest;
pub use service::{ArchiveSummary, TileResponse, TileService};
