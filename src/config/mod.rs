pub mod session;

use std::env;
use std::time::Duration;

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("{0} must be a valid {1}")]
    Invalid(&'static str, &'static str),
    #[error("{0}")]
    Insecure(String),
}

/// Process-wide settings read from the environment (and `.env`).
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub database_url: String,
    pub host: String,
    pub port: u16,
    pub environment: String,
    pub listing_cache_ttl: Duration,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            database_url: "sqlite://data/crud_admin.db".to_string(),
            host: "127.0.0.1".to_string(),
            port: 8080,
            environment: "development".to_string(),
            listing_cache_ttl: Duration::from_secs(60),
        }
    }
}

impl AppConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        let defaults = Self::default();

        let port = match env::var("PORT") {
            Ok(raw) => raw
                .parse::<u16>()
                .map_err(|_| ConfigError::Invalid("PORT", "port number"))?,
            Err(_) => defaults.port,
        };

        let listing_cache_ttl = match env::var("LISTING_CACHE_TTL_SECS") {
            Ok(raw) => Duration::from_secs(
                raw.parse::<u64>()
                    .map_err(|_| ConfigError::Invalid("LISTING_CACHE_TTL_SECS", "number of seconds"))?,
            ),
            Err(_) => defaults.listing_cache_ttl,
        };

        Ok(Self {
            database_url: env::var("DATABASE_URL").unwrap_or(defaults.database_url),
            host: env::var("HOST").unwrap_or(defaults.host),
            port,
            environment: env::var("ENVIRONMENT").unwrap_or(defaults.environment),
            listing_cache_ttl,
        })
    }

    pub fn is_production(&self) -> bool {
        self.environment == "production"
    }
}
