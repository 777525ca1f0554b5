//! Local directory tests.
//!
//! Tests verify:
//! - Archives are read from `{dir}/{name}.pmtiles`
//! - Custom extensions are honored
//! - Names that would escape the directory are treated as missing

use axum::body::Body;
use axum::http::{Request, StatusCode};
use axum::Router;
use http_body_util::BodyExt;
use tempfile::TempDir;
use tower::ServiceExt;

use tile_streamer::archive::{ArchiveCache, LocalArchiveSource};
use tile_streamer::tile::{TileRequest, TileService};
use tile_streamer::{create_router, RouterConfig, TileError};

use super::test_utils::parcels_archive;

fn local_router(source: LocalArchiveSource) -> (TileService<LocalArchiveSource>, Router) {
    let service = TileService::new(ArchiveCache::with_defaults(source));
    let router = create_router(service.clone(), RouterConfig::new().with_tracing(false));
    (service, router)
}

async fn get(router: &Router, uri: &str) -> (StatusCode, bytes::Bytes) {
    let request = Request::builder().uri(uri).body(Body::empty()).unwrap();
    let response = router.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let body = response.into_body().collect().await.unwrap().to_bytes();
    (status, body)
}

#[tokio::test]
async fn test_local_tile_end_to_end() {
    let dir = TempDir::new().unwrap();
    std::fs::write(dir.path().join("parcels.pmtiles"), parcels_archive()).unwrap();
    let (service, router) = local_router(LocalArchiveSource::new(dir.path()));

    let (status, body) = get(&router, "/tiles/parcels/14/3421/1567.pbf").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(&body[..], b"parcel geometry");

    let (status, _) = get(&router, "/tiles/parcels/14/1/1.pbf").await;
    assert_eq!(status, StatusCode::NO_CONTENT);

    assert_eq!(
        service.cache().total_size().await,
        parcels_archive().len() as u64
    );
}

#[tokio::test]
async fn test_local_custom_extension() {
    let dir = TempDir::new().unwrap();
    std::fs::write(dir.path().join("parcels.tiles"), parcels_archive()).unwrap();
    let (_, router) = local_router(LocalArchiveSource::with_extension(dir.path(), "tiles"));

    let (status, _) = get(&router, "/tiles/parcels/0/0/0.pbf").await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn test_local_missing_archive() {
    let dir = TempDir::new().unwrap();
    let (_, router) = local_router(LocalArchiveSource::new(dir.path()));

    let (status, body) = get(&router, "/tiles/parcels/0/0/0.pbf").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    let error: serde_json::Value = serde_json::from_slice(&body).unwrap();
    assert_eq!(error["error"], "parcels not found");
}

#[tokio::test]
async fn test_local_parent_directory_name_rejected() {
    let dir = TempDir::new().unwrap();
    std::fs::write(dir.path().join("parcels.pmtiles"), parcels_archive()).unwrap();
    let (service, _) = local_router(LocalArchiveSource::new(dir.path()));

    let err = service
        .get_tile(&TileRequest::new("..", 0, 0, 0))
        .await
        .unwrap_err();
    assert!(matches!(err, TileError::ArchiveNotFound { .. }));
}
