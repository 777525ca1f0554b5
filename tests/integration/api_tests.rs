//! API integration tests for tile retrieval and error handling.
//!
//! Tests verify:
//! - Tile retrieval, content types and cache directives
//! - Sparse coordinates answered with 204
//! - Error cases (malformed path, invalid coordinates, missing archive)
//! - CORS headers on every response and preflight handling

use axum::body::Body;
use axum::http::{Method, Request, Response, StatusCode};
use axum::Router;
use http_body_util::BodyExt;
use tower::ServiceExt;

use tile_streamer::archive::{ArchiveCache, Compression};
use tile_streamer::tile::TileService;
use tile_streamer::{create_router, RouterConfig};

use super::test_utils::{parcels_archive, MockArchiveSource, PmtilesBuilder};

// =============================================================================
// Helpers
// =============================================================================

fn build(source: MockArchiveSource) -> (TileService<MockArchiveSource>, Router) {
    let service = TileService::new(ArchiveCache::with_defaults(source));
    let router = create_router(service.clone(), RouterConfig::new().with_tracing(false));
    (service, router)
}

async fn send(router: &Router, method: Method, uri: &str) -> Response<Body> {
    let request = Request::builder()
        .method(method)
        .uri(uri)
        .body(Body::empty())
        .unwrap();
    router.clone().oneshot(request).await.unwrap()
}

async fn get(router: &Router, uri: &str) -> Response<Body> {
    send(router, Method::GET, uri).await
}

async fn body_bytes(response: Response<Body>) -> bytes::Bytes {
    response.into_body().collect().await.unwrap().to_bytes()
}

async fn body_json(response: Response<Body>) -> serde_json::Value {
    serde_json::from_slice(&body_bytes(response).await).unwrap()
}

fn assert_cors(response: &Response<Body>) {
    let headers = response.headers();
    assert_eq!(headers.get("access-control-allow-origin").unwrap(), "*");
    assert_eq!(
        headers.get("access-control-allow-methods").unwrap(),
        "GET, HEAD, OPTIONS"
    );
    assert_eq!(headers.get("access-control-allow-headers").unwrap(), "*");
}

// =============================================================================
// Tile Retrieval
// =============================================================================

#[tokio::test]
async fn test_tile_retrieval_success() {
    let source = MockArchiveSource::new().with_archive("parcels", parcels_archive());
    let (_, router) = build(source);

    let response = get(&router, "/tiles/parcels/14/3421/1567.pbf").await;

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        response.headers().get("content-type").unwrap(),
        "application/x-protobuf"
    );
    assert_eq!(
        response.headers().get("cache-control").unwrap(),
        "public, max-age=31536000, immutable"
    );
    assert_cors(&response);

    let body = body_bytes(response).await;
    assert_eq!(&body[..], b"parcel geometry");
}

#[tokio::test]
async fn test_tile_retrieval_without_extension() {
    let source = MockArchiveSource::new().with_archive("parcels", parcels_archive());
    let (_, router) = build(source);

    let response = get(&router, "/tiles/parcels/0/0/0").await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(&body_bytes(response).await[..], b"world overview");
}

#[tokio::test]
async fn test_png_content_type() {
    let archive = PmtilesBuilder::new(0, 3)
        .tile_type(2)
        .tile(2, 1, 1, b"\x89PNG fake")
        .build();
    let source = MockArchiveSource::new().with_archive("imagery", archive);
    let (_, router) = build(source);

    let response = get(&router, "/tiles/imagery/2/1/1.png").await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(response.headers().get("content-type").unwrap(), "image/png");
}

#[tokio::test]
async fn test_custom_cache_max_age() {
    let source = MockArchiveSource::new().with_archive("parcels", parcels_archive());
    let service = TileService::new(ArchiveCache::with_defaults(source));
    let router = create_router(
        service,
        RouterConfig::new()
            .with_cache_max_age(600)
            .with_tracing(false),
    );

    let response = get(&router, "/tiles/parcels/0/0/0.pbf").await;
    assert_eq!(
        response.headers().get("cache-control").unwrap(),
        "public, max-age=600, immutable"
    );
}

// =============================================================================
// Decompression
// =============================================================================

#[tokio::test]
async fn test_gzip_tile_is_decompressed() {
    let archive = PmtilesBuilder::new(0, 5)
        .tile_compression(Compression::Gzip)
        .tile(5, 10, 12, b"gzip vector tile")
        .build();
    let source = MockArchiveSource::new().with_archive("roads", archive);
    let (_, router) = build(source);

    let response = get(&router, "/tiles/roads/5/10/12.mvt").await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(&body_bytes(response).await[..], b"gzip vector tile");
}

#[tokio::test]
async fn test_brotli_tile_is_decompressed() {
    let archive = PmtilesBuilder::new(0, 5)
        .tile_compression(Compression::Brotli)
        .internal_compression(Compression::Gzip)
        .tile(3, 2, 5, b"brotli vector tile")
        .build();
    let source = MockArchiveSource::new().with_archive("water", archive);
    let (_, router) = build(source);

    let response = get(&router, "/tiles/water/3/2/5.pbf").await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(&body_bytes(response).await[..], b"brotli vector tile");
}

#[tokio::test]
async fn test_corrupt_tile_served_raw() {
    let corrupt = b"\x1f\x8b\x08\x00 definitely not deflate".to_vec();

    let archive = PmtilesBuilder::new(0, 2)
        .tile_compression(Compression::Gzip)
        .raw_tile(1, 0, 1, corrupt.clone())
        .build();
    let source = MockArchiveSource::new().with_archive("broken", archive);
    let (_, router) = build(source);

    let response = get(&router, "/tiles/broken/1/0/1.pbf").await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(&body_bytes(response).await[..], &corrupt[..]);
}

// =============================================================================
// Sparse Data
// =============================================================================

#[tokio::test]
async fn test_sparse_coordinate_is_no_content() {
    let source = MockArchiveSource::new().with_archive("parcels", parcels_archive());
    let (_, router) = build(source);

    let response = get(&router, "/tiles/parcels/14/0/0.pbf").await;
    assert_eq!(response.status(), StatusCode::NO_CONTENT);
    assert_cors(&response);
    assert!(body_bytes(response).await.is_empty());
}

#[tokio::test]
async fn test_zoom_outside_archive_range_is_no_content() {
    let archive = PmtilesBuilder::new(4, 8).tile(4, 3, 3, b"tile").build();
    let source = MockArchiveSource::new().with_archive("regional", archive);
    let (_, router) = build(source);

    let response = get(&router, "/tiles/regional/2/1/1.pbf").await;
    assert_eq!(response.status(), StatusCode::NO_CONTENT);

    let response = get(&router, "/tiles/regional/12/1/1.pbf").await;
    assert_eq!(response.status(), StatusCode::NO_CONTENT);
}

#[tokio::test]
async fn test_sparse_then_populated_opens_archive_once() {
    let source = MockArchiveSource::new().with_archive("parcels", parcels_archive());
    let (service, router) = build(source);

    let response = get(&router, "/tiles/parcels/14/8000/8000.pbf").await;
    assert_eq!(response.status(), StatusCode::NO_CONTENT);

    let response = get(&router, "/tiles/parcels/14/3421/1567.pbf").await;
    assert_eq!(response.status(), StatusCode::OK);
    assert!(!body_bytes(response).await.is_empty());

    assert_eq!(service.cache().source().open_count("parcels").await, 1);
}

#[tokio::test]
async fn test_repeated_request_is_identical() {
    let source = MockArchiveSource::new().with_archive("parcels", parcels_archive());
    let (_, router) = build(source);

    let first = get(&router, "/tiles/parcels/14/3421/1567.pbf").await;
    let first_status = first.status();
    let first_headers = first.headers().clone();
    let first_body = body_bytes(first).await;

    let second = get(&router, "/tiles/parcels/14/3421/1567.pbf").await;
    assert_eq!(second.status(), first_status);
    assert_eq!(second.headers(), &first_headers);
    assert_eq!(body_bytes(second).await, first_body);
}

// =============================================================================
// Error Handling
// =============================================================================

#[tokio::test]
async fn test_invalid_path_rejected() {
    let source = MockArchiveSource::new().with_archive("parcels", parcels_archive());
    let (service, router) = build(source);

    for uri in [
        "/tiles/parcels/14/3421",
        "/tiles/parcels/14/3421/1567/extra.pbf",
        "/tiles/parcels",
    ] {
        let response = get(&router, uri).await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST, "uri {uri}");
        assert_cors(&response);
        let error = body_json(response).await;
        assert_eq!(error, serde_json::json!({"error": "Invalid path"}));
    }

    // Never touches the cache
    assert_eq!(service.cache().source().open_count("parcels").await, 0);
    assert_eq!(service.cache().stats().await.misses, 0);
}

#[tokio::test]
async fn test_non_utf8_path_rejected_as_json() {
    let source = MockArchiveSource::new().with_archive("parcels", parcels_archive());
    let (service, router) = build(source);

    for uri in ["/tiles/%FF/14/3421/1567.pbf", "/archives/%FF%FE"] {
        let response = get(&router, uri).await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST, "uri {uri}");
        assert_cors(&response);
        assert_eq!(
            response.headers().get("content-type").unwrap(),
            "application/json"
        );
        let error = body_json(response).await;
        assert_eq!(error, serde_json::json!({"error": "Invalid path"}));
    }

    assert_eq!(service.cache().stats().await.misses, 0);
}

#[tokio::test]
async fn test_invalid_coordinates_rejected() {
    let source = MockArchiveSource::new().with_archive("parcels", parcels_archive());
    let (service, router) = build(source);

    for uri in [
        "/tiles/parcels/abc/3421/1567.pbf",
        "/tiles/parcels/14/x/1567.pbf",
        "/tiles/parcels/14/3421/y.pbf",
        "/tiles/parcels/2/4/0.pbf",
        "/tiles/parcels/40/0/0.pbf",
    ] {
        let response = get(&router, uri).await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST, "uri {uri}");
        assert_cors(&response);
        let error = body_json(response).await;
        assert_eq!(error["error"], "Invalid tile coordinates");
    }

    assert_eq!(service.cache().source().open_count("parcels").await, 0);
}

#[tokio::test]
async fn test_missing_archive_not_found() {
    let source = MockArchiveSource::new();
    let (_, router) = build(source);

    let response = get(&router, "/tiles/missing/0/0/0.pbf").await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    assert_cors(&response);

    let error = body_json(response).await;
    assert_eq!(error, serde_json::json!({"error": "missing not found"}));
}

#[tokio::test]
async fn test_missing_archive_is_not_negatively_cached() {
    let source = MockArchiveSource::new();
    let (service, router) = build(source);

    let response = get(&router, "/tiles/parcels/0/0/0.pbf").await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);

    service
        .cache()
        .source()
        .publish("parcels", parcels_archive())
        .await;

    let response = get(&router, "/tiles/parcels/0/0/0.pbf").await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(service.cache().source().open_count("parcels").await, 2);
}

#[tokio::test]
async fn test_unreadable_archive_not_found() {
    let source = MockArchiveSource::new().with_archive("garbage", vec![0xAB; 300]);
    let (_, router) = build(source);

    let response = get(&router, "/tiles/garbage/0/0/0.pbf").await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    assert_eq!(body_json(response).await["error"], "garbage not found");
}

#[tokio::test]
async fn test_unknown_route_not_found_with_cors() {
    let (_, router) = build(MockArchiveSource::new());

    let response = get(&router, "/nope").await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    assert_cors(&response);
}

// =============================================================================
// Preflight
// =============================================================================

#[tokio::test]
async fn test_preflight_on_tile_path() {
    let source = MockArchiveSource::new().with_archive("parcels", parcels_archive());
    let (service, router) = build(source);

    let response = send(&router, Method::OPTIONS, "/tiles/parcels/14/3421/1567.pbf").await;
    assert_eq!(response.status(), StatusCode::NO_CONTENT);
    assert_cors(&response);
    assert!(body_bytes(response).await.is_empty());

    assert_eq!(service.cache().source().open_count("parcels").await, 0);
}

#[tokio::test]
async fn test_preflight_on_any_path() {
    let (_, router) = build(MockArchiveSource::new());

    for uri in ["/health", "/cache", "/archives/parcels", "/anything/else"] {
        let response = send(&router, Method::OPTIONS, uri).await;
        assert_eq!(response.status(), StatusCode::NO_CONTENT, "uri {uri}");
        assert_cors(&response);
    }
}

// =============================================================================
// Auxiliary Endpoints
// =============================================================================

#[tokio::test]
async fn test_health_endpoint() {
    let (_, router) = build(MockArchiveSource::new());

    let response = get(&router, "/health").await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_cors(&response);

    let json = body_json(response).await;
    assert_eq!(json["status"], "healthy");
    assert!(json["version"].is_string());
}

#[tokio::test]
async fn test_cache_stats_endpoint() {
    let source = MockArchiveSource::new().with_archive("parcels", parcels_archive());
    let (_, router) = build(source);

    get(&router, "/tiles/parcels/0/0/0.pbf").await;
    get(&router, "/tiles/parcels/14/3421/1567.pbf").await;

    let response = get(&router, "/cache").await;
    assert_eq!(response.status(), StatusCode::OK);

    let stats = body_json(response).await;
    assert_eq!(stats["entries"], 1);
    assert_eq!(stats["opens"], 1);
    assert_eq!(stats["hits"], 1);
    assert_eq!(stats["misses"], 1);
    assert_eq!(stats["total_bytes"], parcels_archive().len() as u64);
}

#[tokio::test]
async fn test_archive_summary_endpoint() {
    let archive = PmtilesBuilder::new(0, 14)
        .internal_compression(Compression::Gzip)
        .tile_compression(Compression::Gzip)
        .metadata(r#"{"name":"Parcels","vector_layers":[{"id":"parcels"}]}"#)
        .tile(14, 3421, 1567, b"parcel")
        .build();
    let source = MockArchiveSource::new().with_archive("parcels", archive);
    let (_, router) = build(source);

    let response = get(&router, "/archives/parcels").await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_cors(&response);

    let summary = body_json(response).await;
    assert_eq!(summary["name"], "parcels");
    assert_eq!(summary["tile_type"], "mvt");
    assert_eq!(summary["tile_compression"], "gzip");
    assert_eq!(summary["min_zoom"], 0);
    assert_eq!(summary["max_zoom"], 14);
    assert_eq!(summary["metadata"]["vector_layers"][0]["id"], "parcels");
}

#[tokio::test]
async fn test_archive_summary_missing() {
    let (_, router) = build(MockArchiveSource::new());

    let response = get(&router, "/archives/missing").await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    assert_eq!(body_json(response).await["error"], "missing not found");
}
