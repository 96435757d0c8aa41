//! Configuration for the yatube service.
//!
//! Values come from environment variables; `main` loads a `.env` file with
//! `dotenvy` before calling [`Config::from_env`].

use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("missing required environment variable {0}")]
    Missing(&'static str),

    #[error("invalid value {value:?} for {var}")]
    Invalid { var: &'static str, value: String },
}

/// Main application configuration
#[derive(Debug, Clone)]
pub struct Config {
    pub server: ServerConfig,
    pub database: DatabaseConfig,
    pub auth: AuthConfig,
    pub cache: CacheConfig,
    pub media: MediaConfig,
}

#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

#[derive(Debug, Clone)]
pub struct DatabaseConfig {
    /// sea-orm connection URL, `postgres://...` or `sqlite://...`
    pub url: String,
    pub max_connections: u32,
}

#[derive(Debug, Clone)]
pub struct AuthConfig {
    /// HS256 secret used to sign session tokens
    pub secret: String,
    pub session_ttl: Duration,
    /// Where protected actions send anonymous users
    pub login_url: String,
}

#[derive(Debug, Clone)]
pub struct CacheConfig {
    /// Freshness window of the cached index page
    pub index_ttl: Duration,
    pub max_capacity: u64,
}

#[derive(Debug, Clone)]
pub struct MediaConfig {
    pub root: PathBuf,
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self, ConfigError> {
        Ok(Config {
            server: ServerConfig {
                host: var_or("YATUBE_HOST", "0.0.0.0"),
                port: parse_or("YATUBE_PORT", 3000)?,
            },
            database: DatabaseConfig {
                url: var_or("DATABASE_URL", "sqlite://yatube.db?mode=rwc"),
                max_connections: parse_or("DATABASE_MAX_CONNECTIONS", 10)?,
            },
            auth: AuthConfig {
                secret: std::env::var("SECRET_KEY").map_err(|_| ConfigError::Missing("SECRET_KEY"))?,
                session_ttl: hours("SESSION_TTL_HOURS", 336)?,
                login_url: var_or("LOGIN_URL", "/auth/login/"),
            },
            cache: CacheConfig {
                index_ttl: Duration::from_secs(parse_or("INDEX_CACHE_SECONDS", 20)?),
                max_capacity: parse_or("PAGE_CACHE_CAPACITY", 1000)?,
            },
            media: MediaConfig {
                root: PathBuf::from(var_or("MEDIA_ROOT", "media")),
            },
        })
    }

    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.server.host, self.server.port)
    }
}

fn var_or(var: &'static str, default: &str) -> String {
    std::env::var(var).unwrap_or_else(|_| default.to_string())
}

/// A present but unparsable value is an error, not a silent default.
fn parse_or<T: FromStr>(var: &'static str, default: T) -> Result<T, ConfigError> {
    match std::env::var(var) {
        Ok(value) => value
            .trim()
            .parse()
            .map_err(|_| ConfigError::Invalid { var, value }),
        Err(_) => Ok(default),
    }
}

fn hours(var: &'static str, default: u64) -> Result<Duration, ConfigError> {
    let value = parse_or(var, default)?;
    hours_to_duration(var, value)
}

fn hours_to_duration(var: &'static str, hours: u64) -> Result<Duration, ConfigError> {
    hours
        .checked_mul(3600)
        .map(Duration::from_secs)
        .ok_or_else(|| ConfigError::Invalid { var, value: hours.to_string() })
}
