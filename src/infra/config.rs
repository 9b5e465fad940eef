//! Centralized configuration (environment variables + defaults).

use crate::domain::duplicates::DuplicateMatch;
use anyhow::Context;
use std::path::PathBuf;
use std::time::Duration;

/// Which `CatalogStore` implementation the server runs on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StorageBackend {
    Postgres,
    Memory,
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub storage_backend: StorageBackend,
    pub database_url: Option<String>,
    pub db_max_connections: u32,
    pub bind_addr: String,
    pub admin_password: String,
    pub session_ttl: Duration,
    pub image_dir: PathBuf,
    pub fetch_timeout: Duration,
    pub pending_page_size: u32,
    pub duplicate_match: DuplicateMatch,
}

impl AppConfig {
    /// Reads the configuration from the process environment (after loading `.env`).
    pub fn from_env() -> anyhow::Result<Self> {
        dotenv::dotenv().ok();

        let storage_backend = match env_or("STORAGE_BACKEND", "postgres").to_lowercase().as_str() {
            "postgres" => StorageBackend::Postgres,
            "memory" => StorageBackend::Memory,
            other => anyhow::bail!("STORAGE_BACKEND must be 'postgres' or 'memory', got '{}'", other),
        };

        let database_url = std::env::var("DATABASE_URL").ok();
        if storage_backend == StorageBackend::Postgres && database_url.is_none() {
            anyhow::bail!("DATABASE_URL must be set when STORAGE_BACKEND=postgres");
        }

        let duplicate_match = match env_or("DUPLICATE_MATCH", "exact").to_lowercase().as_str() {
            "exact" => DuplicateMatch::Exact,
            "normalized" => DuplicateMatch::Normalized,
            other => anyhow::bail!("DUPLICATE_MATCH must be 'exact' or 'normalized', got '{}'", other),
        };

        Ok(Self {
            storage_backend,
            database_url,
            db_max_connections: parse_env("DB_MAX_CONNECTIONS", 5)?,
            bind_addr: env_or("BIND_ADDR", "0.0.0.0:3000"),
            admin_password: admin_password()?,
            session_ttl: Duration::from_secs(parse_env("SESSION_TTL_SECS", 3600u64)?.max(1)),
            image_dir: PathBuf::from(env_or("IMAGE_DIR", "public/img")),
            fetch_timeout: Duration::from_secs(parse_env("FETCH_TIMEOUT_SECS", 15u64)?.max(1)),
            pending_page_size: parse_env("PENDING_PAGE_SIZE", 20u32)?.max(1),
            duplicate_match,
        })
    }

    /// Defaults suitable for tests and local runs on the in-memory backend.
    pub fn for_memory(admin_password: &str, image_dir: PathBuf) -> Self {
        Self {
            storage_backend: StorageBackend::Memory,
            database_url: None,
            db_max_connections: 5,
            bind_addr: "127.0.0.1:0".to_string(),
            admin_password: admin_password.to_string(),
            session_ttl: Duration::from_secs(3600),
            image_dir,
            fetch_timeout: Duration::from_secs(15),
            pending_page_size: 20,
            duplicate_match: DuplicateMatch::Exact,
        }
    }
}

/// Shared admin password (required, non-empty).
pub fn admin_password() -> anyhow::Result<String> {
    let v = std::env::var("ADMIN_PASSWORD").context("ADMIN_PASSWORD must be set")?;
    if v.is_empty() {
        anyhow::bail!("ADMIN_PASSWORD must not be empty");
    }
    Ok(v)
}

fn env_or(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_string())
}

fn parse_env<T>(key: &str, default: T) -> anyhow::Result<T>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    match std::env::var(key) {
        Ok(v) => v
            .trim()
            .parse::<T>()
            .map_err(|e| anyhow::anyhow!("{} must be a valid number: {}", key, e)),
        Err(_) => Ok(default),
    }
}
