//! Tile Streamer - serves map tiles out of single-file tile archives.
//!
//! This binary starts the HTTP server and configures all components.

use clap::Parser;
use std::process::ExitCode;
use tracing::{error, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use tile_streamer::{
    archive::{ArchiveCache, ArchiveSource, LocalArchiveSource, RemoteArchiveSource},
    config::{Config, StorageMode},
    io::create_http_client,
    server::{create_router, RouterConfig},
    tile::TileService,
};

#[tokio::main]
async fn main() -> ExitCode {
    let config = Config::parse();

    init_logging(config.verbose);

    if let Err(e) = config.validate() {
        error!("Configuration error: {}", e);
        return ExitCode::FAILURE;
    }

    info!("Tile Streamer v{}", env!("CARGO_PKG_VERSION"));
    info!("Configuration:");
    info!(
        "  Cache: {} MiB budget, {}s idle TTL",
        config.cache_max_bytes / (1024 * 1024),
        config.cache_ttl_secs
    );
    info!("  Tile max-age: {}s", config.cache_max_age);

    match config.storage_mode() {
        StorageMode::Local(dir) => {
            info!("  Storage: local directory {}", dir.display());
            if !dir.is_dir() {
                warn!(
                    "  Archive directory {} does not exist; every archive will be not found",
                    dir.display()
                );
            }
            let source = LocalArchiveSource::with_extension(dir, &config.archive_extension);
            serve(source, &config).await
        }
        StorageMode::Remote(base_url) => {
            info!("  Storage: remote {}", base_url);
            info!(
                "  Remote size estimate: {} MiB per archive",
                config.remote_size_estimate / (1024 * 1024)
            );
            let client = match create_http_client(config.http_timeout()) {
                Ok(client) => client,
                Err(e) => {
                    error!("Failed to create HTTP client: {}", e);
                    return ExitCode::FAILURE;
                }
            };
            let source =
                RemoteArchiveSource::with_extension(client, base_url, &config.archive_extension);
            serve(source, &config).await
        }
    }
}

/// Build the service stack over `source`, bind, and serve until shutdown.
async fn serve<S>(source: S, config: &Config) -> ExitCode
where
    S: ArchiveSource + 'static,
{
    let cache = ArchiveCache::new(source, config.cache_config());
    let tile_service = TileService::new(cache);

    let router_config = RouterConfig::new()
        .with_cache_max_age(config.cache_max_age)
        .with_tracing(!config.no_tracing);
    let router = create_router(tile_service, router_config);

    let addr = config.bind_address();

    info!("");
    info!("Server listening on: http://{}", addr);
    info!("  curl http://{}/health", addr);
    info!("  curl http://{}/tiles/<archive>/0/0/0.pbf", addr);
    info!("");

    let listener = match tokio::net::TcpListener::bind(&addr).await {
        Ok(listener) => listener,
        Err(e) => {
            error!("Failed to bind to {}: {}", addr, e);
            return ExitCode::FAILURE;
        }
    };

    if let Err(e) = axum::serve(listener, router).await {
        error!("Server error: {}", e);
        return ExitCode::FAILURE;
    }

    ExitCode::SUCCESS
}

/// Initialize the tracing/logging subsystem.
fn init_logging(verbose: bool) {
    let env_filter = if verbose {
        "tile_streamer=debug,tower_http=debug"
    } else {
        "tile_streamer=info,tower_http=info"
    };

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| env_filter.into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();
}
