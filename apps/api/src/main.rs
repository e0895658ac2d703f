mod applications;
mod cache;
mod config;
mod db;
mod errors;
mod models;
mod render;
mod resume;
mod routes;
mod state;
#[cfg(test)]
mod testing;

use anyhow::Result;
use aws_config::Region;
use aws_sdk_s3::config::Credentials;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::applications::PgApplicationSource;
use crate::cache::{ExistenceCache, ResumeCache, S3ObjectStore};
use crate::config::Config;
use crate::db::create_pool;
use crate::render::PdfResumeRenderer;
use crate::resume::{BulkPipeline, RenderRunner, ResumeService};
use crate::routes::build_router;
use crate::state::AppState;

#[tokio::main]
async fn main() -> Result<()> {
    // Load configuration first (fails on missing required env vars)
    let config = Config::from_env()?;

    // Initialize structured logging
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            EnvFilter::new(format!("resume_api={}", &config.rust_log))
        }))
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting resume API v{}", env!("CARGO_PKG_VERSION"));

    // Initialize PostgreSQL
    let db = create_pool(&config.database_url).await?;

    // Initialize S3 / MinIO
    let s3 = build_s3_client(&config).await;
    info!("S3 client initialized (bucket: {})", config.s3_bucket);

    // Resume cache: durable objects plus the in-process existence cache
    let store = Arc::new(S3ObjectStore::new(
        s3,
        config.s3_bucket.clone(),
        config.s3_public_url.clone(),
    ));
    let existence = ExistenceCache::new(
        config.existence_cache_capacity,
        Duration::from_secs(config.existence_cache_ttl_secs),
    );
    let cache = Arc::new(ResumeCache::new(
        store,
        existence,
        config.cache_namespace.clone(),
        Duration::from_secs(config.storage_timeout_secs),
    ));
    info!(
        "Resume cache: namespace '{}', {} entries / {}s TTL",
        config.cache_namespace, config.existence_cache_capacity, config.existence_cache_ttl_secs
    );

    let runner = Arc::new(RenderRunner::new(
        Arc::new(PdfResumeRenderer),
        Duration::from_secs(config.render_timeout_secs),
        config.render_attempts,
    ));

    // Build app state
    let state = AppState {
        applications: Arc::new(PgApplicationSource::new(db)),
        resumes: Arc::new(ResumeService::new(cache.clone(), runner.clone())),
        bulk: Arc::new(BulkPipeline::new(cache, runner)),
        bulk_concurrency: config.bulk_concurrency,
    };

    // Build router
    let app = build_router(state)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive());

    let addr: SocketAddr = format!("0.0.0.0:{}", config.port).parse()?;
    info!("Listening on {addr}");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

/// Constructs an S3 client configured for MinIO (local) or AWS (production).
async fn build_s3_client(config: &Config) -> aws_sdk_s3::Client {
    let credentials = Credentials::new(
        &config.aws_access_key_id,
        &config.aws_secret_access_key,
        None,
        None,
        "resume-api-static",
    );

    let s3_config = aws_config::defaults(aws_config::BehaviorVersion::latest())
        .region(Region::new(config.s3_region.clone()))
        .credentials_provider(credentials)
        .endpoint_url(&config.s3_endpoint)
        .load()
        .await;

    // MinIO serves buckets under the path, not a subdomain
    let s3_config = aws_sdk_s3::config::Builder::from(&s3_config)
        .force_path_style(true)
        .build();

    aws_sdk_s3::Client::from_conf(s3_config)
}
