//! Application state shared across all handlers.

use std::sync::Arc;

use anyhow::{Context, Result};
use sqlx::PgPool;
use tracing::info;

use crate::catalog::{CatalogService, PageRequest};
use crate::config::Config;
use crate::db;

/// Shared application state.
///
/// Wrapped in Arc internally so Clone is cheap.
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    /// PostgreSQL connection pool.
    db: PgPool,

    /// Catalog search service.
    catalog: Arc<CatalogService>,

    /// Upper bound for requested page sizes.
    max_page_size: u32,
}

impl AppState {
    /// Connect to the database, apply migrations and build services.
    pub async fn new(config: &Config) -> Result<Self> {
        let pool = db::create_pool(config)
            .await
            .context("failed to create database pool")?;

        db::run_migrations(&pool)
            .await
            .context("failed to run migrations")?;

        info!("database migrations applied");

        Ok(Self::from_pool(pool, config.max_page_size))
    }

    /// Build state around an existing pool.
    pub fn from_pool(pool: PgPool, max_page_size: u32) -> Self {
        Self {
            inner: Arc::new(AppStateInner {
                catalog: CatalogService::new(pool.clone()),
                db: pool,
                max_page_size,
            }),
        }
    }

    /// Get the database pool.
    pub fn db(&self) -> &PgPool {
        &self.inner.db
    }

    /// Get the catalog service.
    pub fn catalog(&self) -> &Arc<CatalogService> {
        &self.inner.catalog
    }

    /// Cap a requested window at the configured maximum page size.
    pub fn page_window(&self, page: PageRequest) -> PageRequest {
        page.capped(self.inner.max_page_size)
    }

    /// Check if PostgreSQL is healthy.
    pub async fn postgres_healthy(&self) -> bool {
        db::check_health(&self.inner.db).await
    }
}
