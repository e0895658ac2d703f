use std::str::FromStr;

use anyhow::{Context, Result};

/// Application configuration loaded from environment variables.
/// Startup fails if required variables are missing or malformed.
#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    pub s3_bucket: String,
    pub s3_endpoint: String,
    pub s3_region: String,
    /// Base URL for public object links. Defaults to `{endpoint}/{bucket}`.
    pub s3_public_url: String,
    pub aws_access_key_id: String,
    pub aws_secret_access_key: String,
    pub cache_namespace: String,
    pub existence_cache_capacity: usize,
    pub existence_cache_ttl_secs: u64,
    pub bulk_concurrency: usize,
    pub storage_timeout_secs: u64,
    pub render_timeout_secs: u64,
    pub render_attempts: u32,
    pub port: u16,
    pub rust_log: String,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok(); // load .env if present; ignore if missing

        let s3_bucket = require_env("S3_BUCKET")?;
        let s3_endpoint = require_env("S3_ENDPOINT")?;
        let s3_public_url = std::env::var("S3_PUBLIC_URL").unwrap_or_else(|_| {
            format!("{}/{}", s3_endpoint.trim_end_matches('/'), s3_bucket)
        });

        Ok(Config {
            database_url: require_env("DATABASE_URL")?,
            s3_region: env_or("S3_REGION", "us-east-1"),
            s3_public_url,
            s3_bucket,
            s3_endpoint,
            aws_access_key_id: require_env("AWS_ACCESS_KEY_ID")?,
            aws_secret_access_key: require_env("AWS_SECRET_ACCESS_KEY")?,
            cache_namespace: env_or("RESUME_CACHE_NAMESPACE", "job-applications"),
            existence_cache_capacity: parse_env("RESUME_EXISTENCE_CACHE_CAPACITY", 500)?,
            existence_cache_ttl_secs: parse_env("RESUME_EXISTENCE_CACHE_TTL_SECS", 86_400)?,
            bulk_concurrency: parse_env("BULK_EXPORT_CONCURRENCY", 5)?,
            storage_timeout_secs: parse_env("STORAGE_TIMEOUT_SECS", 15)?,
            render_timeout_secs: parse_env("RENDER_TIMEOUT_SECS", 30)?,
            render_attempts: parse_env("RENDER_ATTEMPTS", 2)?,
            port: parse_env("PORT", 8080)?,
            rust_log: env_or("RUST_LOG", "info"),
        })
    }
}

fn require_env(key: &str) -> Result<String> {
    std::env::var(key).with_context(|| format!("Required environment variable '{key}' is not set"))
}

fn env_or(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_string())
}

fn parse_env<T>(key: &str, default: T) -> Result<T>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match std::env::var(key) {
        Ok(raw) => parse_value(key, &raw),
        Err(_) => Ok(default),
    }
}

fn parse_value<T>(key: &str, raw: &str) -> Result<T>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    raw.trim()
        .parse::<T>()
        .with_context(|| format!("{key} must be a valid number, got '{raw}'"))
}
