//! Configuration loaded from environment variables.

use std::env;

use anyhow::{Context, Result};

/// Default page size cap applied to catalog and admin listings.
pub const DEFAULT_MAX_PAGE_SIZE: u32 = 100;

/// Application configuration.
#[derive(Debug, Clone)]
pub struct Config {
    /// HTTP server port (default: 3000).
    pub port: u16,

    /// PostgreSQL connection URL.
    pub database_url: String,

    /// Maximum database connections in pool (default: 10).
    pub database_max_connections: u32,

    /// CORS allowed origins (comma-separated, default: "*").
    pub cors_allowed_origins: Vec<String>,

    /// Upper bound for a requested page size. A limit of 0 ("no limit") is never capped.
    pub max_page_size: u32,
}

impl Config {
    /// Load configuration from environment variables.
    pub fn from_env() -> Result<Self> {
        let port = env::var("PORT")
            .unwrap_or_else(|_| "3000".to_string())
            .parse()
            .context("PORT must be a valid u16")?;

        let database_url =
            env::var("DATABASE_URL").context("DATABASE_URL environment variable is required")?;

        let database_max_connections = env::var("DATABASE_MAX_CONNECTIONS")
            .unwrap_or_else(|_| "10".to_string())
            .parse()
            .context("DATABASE_MAX_CONNECTIONS must be a valid u32")?;

        let cors_allowed_origins = env::var("CORS_ALLOWED_ORIGINS")
            .map(|v| parse_origins(&v))
            .unwrap_or_else(|_| vec!["*".to_string()]);

        let max_page_size = env::var("MAX_PAGE_SIZE")
            .unwrap_or_else(|_| DEFAULT_MAX_PAGE_SIZE.to_string())
            .parse()
            .context("MAX_PAGE_SIZE must be a valid u32")?;

        Ok(Self {
            port,
            database_url,
            database_max_connections,
            cors_allowed_origins,
            max_page_size,
        })
    }
}

fn parse_origins(value: &str) -> Vec<String> {
    value
        .split(',')
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .collect()
}
