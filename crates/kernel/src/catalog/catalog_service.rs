//! Catalog service for executing searches.
//!
//! Each search runs its count and page statements inside one short
//! transaction with a statement timeout, then maps rows into result entities.
//! Teacher pages get their specializations from one batched lookup.

use std::collections::HashMap;
use std::sync::Arc;

use anyhow::{Context, Result};
use sea_query_binder::SqlxValues;
use sqlx::PgPool;
use tracing::{debug, warn};
use uuid::Uuid;

use super::query_builder::{MaterialSearchQuery, Statement, TeacherSearchQuery};
use super::rows::{MaterialRow, TeacherRow, group_specializations};
use super::types::{
    CatalogMaterial, MaterialFilters, PageRequest, SearchPage, Teacher, TeacherFilters,
};
use crate::models::Subject;

/// Service for catalog searches.
pub struct CatalogService {
    pool: PgPool,
}

impl CatalogService {
    pub fn new(pool: PgPool) -> Arc<Self> {
        Arc::new(Self { pool })
    }

    /// Search published materials.
    pub async fn search_materials(
        &self,
        filters: &MaterialFilters,
        page: PageRequest,
    ) -> Result<SearchPage<CatalogMaterial>> {
        let (count, fetch) = {
            let query = MaterialSearchQuery::new(filters, page);
            debug!(predicates = ?query.predicate_names(), ?page, "searching materials");
            (query.build_count(), query.build())
        };

        let (total, rows) = self
            .count_and_fetch::<MaterialRow>(count, fetch)
            .await
            .context("material search failed")?;

        Ok(SearchPage {
            items: rows.into_iter().map(CatalogMaterial::from).collect(),
            total,
            page,
        })
    }

    /// Search teachers and attach their specializations.
    ///
    /// A failed specialization lookup is logged and yields empty lists rather
    /// than failing the search.
    pub async fn search_teachers(
        &self,
        filters: &TeacherFilters,
        page: PageRequest,
    ) -> Result<SearchPage<Teacher>> {
        let (count, fetch) = {
            let query = TeacherSearchQuery::new(filters, page);
            debug!(predicates = ?query.predicate_names(), ?page, "searching teachers");
            (query.build_count(), query.build())
        };

        let (total, rows) = self
            .count_and_fetch::<TeacherRow>(count, fetch)
            .await
            .context("teacher search failed")?;

        let ids: Vec<Uuid> = rows.iter().map(|row| row.id).collect();
        let mut lookup = match self.specializations_for_many(&ids).await {
            Ok(lookup) => lookup,
            Err(e) => {
                warn!(error = %e, teachers = ids.len(), "specialization lookup failed");
                HashMap::new()
            }
        };

        Ok(SearchPage {
            items: rows
                .into_iter()
                .map(|row| row.into_teacher(&mut lookup))
                .collect(),
            total,
            page,
        })
    }

    /// All subjects ordered by name.
    pub async fn list_subjects(&self) -> Result<Vec<Subject>> {
        Subject::list(&self.pool).await
    }

    /// Specializations for each of `ids`, subjects ascending.
    ///
    /// Users without specializations are absent from the map. An empty id list
    /// does not touch the database.
    pub async fn specializations_for_many(
        &self,
        ids: &[Uuid],
    ) -> Result<HashMap<Uuid, Vec<String>>> {
        if ids.is_empty() {
            return Ok(HashMap::new());
        }

        let pairs: Vec<(Uuid, String)> = sqlx::query_as(
            r#"
            SELECT user_id, subject FROM teacher_specializations
            WHERE user_id = ANY($1)
            ORDER BY user_id, subject
            "#,
        )
        .bind(ids)
        .fetch_all(&self.pool)
        .await
        .context("failed to load specializations")?;

        Ok(group_specializations(pairs))
    }

    /// Run the count then the page statement in one transaction.
    ///
    /// Statements arrive rendered: the builders hold non-`Send` expressions
    /// and must not live across an await.
    async fn count_and_fetch<R>(&self, count: Statement, page: Statement) -> Result<(i64, Vec<R>)>
    where
        R: for<'r> sqlx::FromRow<'r, sqlx::postgres::PgRow> + Send + Unpin,
    {
        let mut tx = self
            .pool
            .begin()
            .await
            .context("failed to begin transaction")?;

        sqlx::query("SET LOCAL statement_timeout = '10s'")
            .execute(&mut *tx)
            .await
            .context("failed to set statement timeout")?;

        let total: i64 = sqlx::query_scalar_with(&count.sql, SqlxValues(count.values))
            .fetch_one(&mut *tx)
            .await
            .context("failed to execute count query")?;

        let rows: Vec<R> = sqlx::query_as_with(&page.sql, SqlxValues(page.values))
            .fetch_all(&mut *tx)
            .await
            .context("failed to execute page query")?;

        tx.commit()
            .await
            .context("failed to commit search transaction")?;

        debug!(total, returned = rows.len(), "search executed");
        Ok((total, rows))
    }
}
