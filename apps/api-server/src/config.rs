//! Application configuration loaded from environment variables.

use std::env;
use std::time::Duration;

use yatube_infra::database::DatabaseConfig;

/// Default lifetime of a cached feed page.
pub const DEFAULT_PAGE_CACHE_SECONDS: u64 = 20;

/// Application configuration.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub host: String,
    pub port: u16,
    pub database: Option<DatabaseConfig>,
    /// Redis page cache; the in-memory cache is used when unset.
    pub redis_url: Option<String>,
    pub page_cache_ttl: Duration,
    pub media_root: String,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 8080,
            database: None,
            redis_url: None,
            page_cache_ttl: Duration::from_secs(DEFAULT_PAGE_CACHE_SECONDS),
            media_root: "media".to_string(),
        }
    }
}

fn parse_env<T: std::str::FromStr>(key: &str) -> Option<T> {
    env::var(key).ok().and_then(|s| s.parse().ok())
}

impl AppConfig {
    /// Load configuration from environment variables.
    pub fn from_env() -> Self {
        let defaults = Self::default();

        let database = env::var("DATABASE_URL").ok().map(|url| {
            let mut config = DatabaseConfig::new(url);
            if let Some(max) = parse_env("DB_MAX_CONNECTIONS") {
                config.max_connections = max;
            }
            if let Some(min) = parse_env("DB_MIN_CONNECTIONS") {
                config.min_connections = min;
            }
            config
        });

        Self {
            host: env::var("HOST").unwrap_or(defaults.host),
            port: parse_env("PORT").unwrap_or(defaults.port),
            database,
            redis_url: env::var("REDIS_URL").ok(),
            page_cache_ttl: parse_env("PAGE_CACHE_SECONDS")
                .map(Duration::from_secs)
                .unwrap_or(defaults.page_cache_ttl),
            media_root: env::var("MEDIA_ROOT").unwrap_or(defaults.media_root),
        }
    }
}
